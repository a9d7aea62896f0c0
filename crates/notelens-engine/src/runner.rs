//! Bounded-concurrency runner for background analysis operations.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info};

use notelens_core::sync::IgnoreLock;
use notelens_core::{Error, ProgressSink, Result};

/// Context handed to every submitted operation.
pub struct OperationContext {
    /// Identifier assigned to this operation (`op-1`, `op-2`, ...).
    pub id: String,
    /// Progress sink wired to the submitter's callback.
    pub progress: ProgressSink,
    /// Cooperative cancellation token; the operation decides when to check.
    pub cancel: CancellationToken,
}

/// Snapshot of one in-flight operation.
#[derive(Debug, Clone)]
pub struct OperationStatus {
    /// Seconds since the operation was submitted.
    pub running_seconds: f64,
    /// Whether cancellation has been requested.
    pub cancelled: bool,
}

struct HandleEntry {
    started_at: Instant,
    cancel: CancellationToken,
}

/// Runs submitted operations on the tokio runtime with a concurrency cap.
///
/// Every operation gets an id, a progress sink, and a cancellation token,
/// and triggers exactly one of its two terminal callbacks exactly once.
/// Cancellation is cooperative: `cancel` only flips the token, the operation
/// observes it at its own boundaries.
pub struct TaskRunner {
    semaphore: Arc<Semaphore>,
    active: Arc<Mutex<HashMap<String, HandleEntry>>>,
    next_id: AtomicU64,
    tracker: TaskTracker,
    accepting: AtomicBool,
}

impl TaskRunner {
    /// Creates a runner allowing `max_concurrent` operations at once.
    #[must_use]
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent.max(1))),
            active: Arc::new(Mutex::new(HashMap::new())),
            next_id: AtomicU64::new(0),
            tracker: TaskTracker::new(),
            accepting: AtomicBool::new(true),
        }
    }

    /// Submits an operation for execution.
    ///
    /// The operation starts once a worker slot is free. On completion exactly
    /// one of `on_complete` or `on_error` runs, after the operation's handle
    /// has been removed from the active set.
    ///
    /// # Errors
    /// Returns an error when the runner has been shut down.
    pub fn submit<T, F, Fut>(
        &self,
        operation: F,
        progress: ProgressSink,
        on_complete: impl FnOnce(T) + Send + 'static,
        on_error: impl FnOnce(Error) + Send + 'static,
    ) -> Result<String>
    where
        T: Send + 'static,
        F: FnOnce(OperationContext) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        if !self.accepting.load(Ordering::SeqCst) {
            return Err(Error::Other("task runner is shut down".to_owned()));
        }

        let id = format!("op-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        let cancel = CancellationToken::new();

        self.active.lock_ignore_poison().insert(
            id.clone(),
            HandleEntry {
                started_at: Instant::now(),
                cancel: cancel.clone(),
            },
        );

        let semaphore = Arc::clone(&self.semaphore);
        let active = Arc::clone(&self.active);
        let task_id = id.clone();

        self.tracker.spawn(async move {
            let permit = semaphore.acquire_owned().await;

            let outcome = if permit.is_err() || cancel.is_cancelled() {
                Err(Error::Cancelled)
            } else {
                debug!(id = %task_id, "operation started");
                let context = OperationContext {
                    id: task_id.clone(),
                    progress,
                    cancel: cancel.clone(),
                };
                operation(context).await
            };

            // Remove the handle before the terminal callback so callbacks
            // observing active_operations never see their own entry.
            active.lock_ignore_poison().remove(&task_id);

            match outcome {
                Ok(value) => {
                    debug!(id = %task_id, "operation completed");
                    on_complete(value);
                }
                Err(err) => {
                    debug!(id = %task_id, error = %err, "operation failed");
                    on_error(err);
                }
            }
        });

        Ok(id)
    }

    /// Requests cancellation of an operation. Returns `false` when the id is
    /// unknown or already finished.
    pub fn cancel(&self, id: &str) -> bool {
        let active = self.active.lock_ignore_poison();
        match active.get(id) {
            Some(entry) => {
                info!(id, "cancellation requested");
                entry.cancel.cancel();
                true
            }
            None => false,
        }
    }

    /// Snapshot of the in-flight operations.
    pub fn active_operations(&self) -> HashMap<String, OperationStatus> {
        self.active
            .lock_ignore_poison()
            .iter()
            .map(|(id, entry)| {
                (
                    id.clone(),
                    OperationStatus {
                        running_seconds: entry.started_at.elapsed().as_secs_f64(),
                        cancelled: entry.cancel.is_cancelled(),
                    },
                )
            })
            .collect()
    }

    /// Stops accepting new operations and waits for in-flight ones to
    /// finish. In-flight operations are not cancelled.
    pub async fn shutdown(&self) {
        self.accepting.store(false, Ordering::SeqCst);
        self.tracker.close();
        self.tracker.wait().await;
        info!("task runner drained");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::oneshot;

    fn counting_callbacks(
        completions: &Arc<AtomicUsize>,
        errors: &Arc<AtomicUsize>,
    ) -> (impl FnOnce(u32) + Send + 'static, impl FnOnce(Error) + Send + 'static) {
        let completions = Arc::clone(completions);
        let errors = Arc::clone(errors);
        (
            move |_| {
                completions.fetch_add(1, Ordering::SeqCst);
            },
            move |_| {
                errors.fetch_add(1, Ordering::SeqCst);
            },
        )
    }

    #[tokio::test]
    async fn successful_operation_calls_on_complete_once() {
        let runner = TaskRunner::new(2);
        let completions = Arc::new(AtomicUsize::new(0));
        let errors = Arc::new(AtomicUsize::new(0));
        let (on_complete, on_error) = counting_callbacks(&completions, &errors);

        let id = runner
            .submit(
                |_ctx| async { Ok(42_u32) },
                ProgressSink::disabled(),
                on_complete,
                on_error,
            )
            .unwrap();
        assert_eq!(id, "op-1");

        runner.shutdown().await;
        assert_eq!(completions.load(Ordering::SeqCst), 1);
        assert_eq!(errors.load(Ordering::SeqCst), 0);
        assert!(runner.active_operations().is_empty());
    }

    #[tokio::test]
    async fn failing_operation_calls_on_error_once() {
        let runner = TaskRunner::new(2);
        let completions = Arc::new(AtomicUsize::new(0));
        let errors = Arc::new(AtomicUsize::new(0));
        let (on_complete, on_error) = counting_callbacks(&completions, &errors);

        runner
            .submit(
                |_ctx| async { Err::<u32, _>(Error::Provider("down".to_owned())) },
                ProgressSink::disabled(),
                on_complete,
                on_error,
            )
            .unwrap();

        runner.shutdown().await;
        assert_eq!(completions.load(Ordering::SeqCst), 0);
        assert_eq!(errors.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn ids_are_sequential() {
        let runner = TaskRunner::new(4);
        for expected in ["op-1", "op-2", "op-3"] {
            let id = runner
                .submit(
                    |_ctx| async { Ok(()) },
                    ProgressSink::disabled(),
                    |()| {},
                    |_| {},
                )
                .unwrap();
            assert_eq!(id, expected);
        }
        runner.shutdown().await;
    }

    #[tokio::test]
    async fn cancel_flips_the_token_cooperatively() {
        let runner = TaskRunner::new(1);
        let (started_tx, started_rx) = oneshot::channel::<()>();
        let (release_tx, release_rx) = oneshot::channel::<()>();

        let errors = Arc::new(AtomicUsize::new(0));
        let errors_cb = Arc::clone(&errors);

        let id = runner
            .submit(
                move |ctx| async move {
                    started_tx.send(()).ok();
                    release_rx.await.ok();
                    if ctx.cancel.is_cancelled() {
                        return Err(Error::Cancelled);
                    }
                    Ok(())
                },
                ProgressSink::disabled(),
                |()| {},
                move |_| {
                    errors_cb.fetch_add(1, Ordering::SeqCst);
                },
            )
            .unwrap();

        started_rx.await.unwrap();
        assert!(runner.cancel(&id));
        assert!(runner.active_operations()[&id].cancelled);
        release_tx.send(()).unwrap();

        runner.shutdown().await;
        assert_eq!(errors.load(Ordering::SeqCst), 1);
        assert!(!runner.cancel(&id));
    }

    #[tokio::test]
    async fn shutdown_rejects_new_submissions() {
        let runner = TaskRunner::new(1);
        runner.shutdown().await;

        let result = runner.submit(
            |_ctx| async { Ok(()) },
            ProgressSink::disabled(),
            |()| {},
            |_| {},
        );
        assert!(result.is_err());
    }
}
