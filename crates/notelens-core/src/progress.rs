use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

/// Callback receiving a progress percentage in `[0, 100]`.
pub type ProgressFn = dyn Fn(u8) + Send + Sync;

/// Callback receiving a progress percentage and a status line.
pub type BatchProgressFn = dyn Fn(u8, &str) + Send + Sync;

/// Progress sink for one operation.
///
/// Values are clamped to 100 and forced monotonically non-decreasing before
/// they reach the caller's callback, so analyzers can emit coarse milestones
/// without coordinating with each other.
#[derive(Clone, Default)]
pub struct ProgressSink {
    callback: Option<Arc<ProgressFn>>,
    last: Arc<AtomicU8>,
}

impl ProgressSink {
    /// Creates a sink that forwards to the given callback.
    pub fn new(callback: Arc<ProgressFn>) -> Self {
        Self {
            callback: Some(callback),
            last: Arc::new(AtomicU8::new(0)),
        }
    }

    /// Creates a sink that drops all updates.
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Emits a progress value, clamped and monotonic.
    pub fn emit(&self, percent: u8) {
        let clamped = percent.min(100);
        let previous = self.last.fetch_max(clamped, Ordering::SeqCst);
        if let Some(callback) = &self.callback {
            callback(previous.max(clamped));
        }
    }

    /// The highest value emitted so far.
    pub fn current(&self) -> u8 {
        self.last.load(Ordering::SeqCst)
    }
}

/// Progress sink for a batch run, pairing the percentage with a human-readable
/// status string. Same clamping and monotonicity rules as [`ProgressSink`].
#[derive(Clone, Default)]
pub struct BatchProgressSink {
    callback: Option<Arc<BatchProgressFn>>,
    last: Arc<AtomicU8>,
}

impl BatchProgressSink {
    /// Creates a sink that forwards to the given callback.
    pub fn new(callback: Arc<BatchProgressFn>) -> Self {
        Self {
            callback: Some(callback),
            last: Arc::new(AtomicU8::new(0)),
        }
    }

    /// Creates a sink that drops all updates.
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Emits a progress value and status line.
    pub fn emit(&self, percent: u8, status: &str) {
        let clamped = percent.min(100);
        let previous = self.last.fetch_max(clamped, Ordering::SeqCst);
        if let Some(callback) = &self.callback {
            callback(previous.max(clamped), status);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn values_are_clamped() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink_seen = Arc::clone(&seen);
        let sink = ProgressSink::new(Arc::new(move |value| {
            sink_seen.lock().unwrap().push(value);
        }));

        sink.emit(250);
        assert_eq!(*seen.lock().unwrap(), vec![100]);
    }

    #[test]
    fn values_are_monotonic() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink_seen = Arc::clone(&seen);
        let sink = ProgressSink::new(Arc::new(move |value| {
            sink_seen.lock().unwrap().push(value);
        }));

        sink.emit(10);
        sink.emit(60);
        sink.emit(40);
        sink.emit(90);

        let values = seen.lock().unwrap().clone();
        assert_eq!(values, vec![10, 60, 60, 90]);
        assert!(values.windows(2).all(|pair| pair[0] <= pair[1]));
    }

    #[test]
    fn disabled_sink_still_tracks() {
        let sink = ProgressSink::disabled();
        sink.emit(42);
        assert_eq!(sink.current(), 42);
    }

    #[test]
    fn batch_sink_forwards_status() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink_seen = Arc::clone(&seen);
        let sink = BatchProgressSink::new(Arc::new(move |value, status: &str| {
            sink_seen.lock().unwrap().push((value, status.to_owned()));
        }));

        sink.emit(50, "tagging... (1/2)");
        let entries = seen.lock().unwrap().clone();
        assert_eq!(entries, vec![(50, "tagging... (1/2)".to_owned())]);
    }
}
