//! Single-flight gate for exclusive foreground analysis.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use notelens_core::{Error, Result};

/// Admits at most one foreground analysis at a time.
///
/// A second caller is rejected immediately with [`Error::AlreadyRunning`]
/// rather than queued; the permit releases the gate when dropped, including
/// on panic unwind.
#[derive(Clone, Default)]
pub struct ForegroundGate {
    busy: Arc<AtomicBool>,
}

/// Live permit for the foreground slot.
pub struct ForegroundPermit {
    busy: Arc<AtomicBool>,
}

impl ForegroundGate {
    /// Creates an open gate.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims the foreground slot.
    ///
    /// # Errors
    /// Returns [`Error::AlreadyRunning`] when a permit is already live.
    pub fn try_begin(&self) -> Result<ForegroundPermit> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(Error::AlreadyRunning);
        }
        Ok(ForegroundPermit {
            busy: Arc::clone(&self.busy),
        })
    }

    /// Whether a permit is currently live.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }
}

impl Drop for ForegroundPermit {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_begin_is_rejected() {
        let gate = ForegroundGate::new();
        let permit = gate.try_begin().unwrap();
        assert!(matches!(gate.try_begin(), Err(Error::AlreadyRunning)));
        drop(permit);
        assert!(gate.try_begin().is_ok());
    }

    #[test]
    fn permit_releases_on_drop() {
        let gate = ForegroundGate::new();
        {
            let _permit = gate.try_begin().unwrap();
            assert!(gate.is_busy());
        }
        assert!(!gate.is_busy());
    }
}
