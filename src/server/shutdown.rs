//! Coordinated server shutdown.
//!
//! Shutdown happens in a fixed order: the shutdown token is cancelled, which
//! wakes every worker waiting on the mailbox and every idle session; the
//! worker tracker is then closed and awaited. Shared server state is only
//! dropped after the last worker has returned.

use log::info;
use tokio::sync::Mutex;
use tokio_util::{sync::CancellationToken, task::TaskTracker};

/// Cloneable request to stop a running server.
///
/// Triggering never blocks and may be done any number of times from any
/// task, including a signal listener.
///
/// ```
/// use calcwire::{evaluator::ConstantEvaluator, server::CalcServer};
///
/// let server = CalcServer::new(ConstantEvaluator::default());
/// let handle = server.shutdown_handle();
/// handle.trigger();
/// handle.trigger();
/// assert!(handle.is_triggered());
/// ```
#[derive(Clone, Debug)]
pub struct ShutdownHandle {
    token: CancellationToken,
}

impl ShutdownHandle {
    pub(crate) const fn new(token: CancellationToken) -> Self { Self { token } }

    /// Ask the server to stop. Later calls have no effect.
    pub fn trigger(&self) {
        if !self.token.is_cancelled() {
            info!("shutdown requested");
        }
        self.token.cancel();
    }

    /// Returns `true` once shutdown has been requested.
    #[must_use]
    pub fn is_triggered(&self) -> bool { self.token.is_cancelled() }

    /// Wait until shutdown has been requested.
    pub async fn triggered(&self) { self.token.cancelled().await; }
}

/// Stops the worker pool exactly once.
#[derive(Debug)]
pub(crate) struct ShutdownController {
    handle: ShutdownHandle,
    workers: TaskTracker,
    joined: Mutex<bool>,
}

impl ShutdownController {
    pub(crate) fn new(token: CancellationToken, workers: TaskTracker) -> Self {
        Self {
            handle: ShutdownHandle::new(token),
            workers,
            joined: Mutex::new(false),
        }
    }

    pub(crate) fn trigger(&self) { self.handle.trigger(); }

    /// Trigger shutdown and wait for every worker to return.
    ///
    /// Concurrent callers are serialized; only the first one joins the pool
    /// and the rest return `false` immediately after it finishes.
    pub(crate) async fn shutdown(&self) -> bool {
        let mut joined = self.joined.lock().await;
        if *joined {
            return false;
        }
        self.trigger();
        self.workers.close();
        self.workers.wait().await;
        *joined = true;
        info!("all workers joined");
        true
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use tokio::time::{Duration, timeout};
    use tokio_util::{sync::CancellationToken, task::TaskTracker};

    use super::ShutdownController;

    #[tokio::test]
    async fn shutdown_joins_workers_once() {
        let token = CancellationToken::new();
        let tracker = TaskTracker::new();
        let exited = Arc::new(AtomicUsize::new(0));
        for _ in 0..3 {
            let token = token.clone();
            let exited = Arc::clone(&exited);
            tracker.spawn(async move {
                token.cancelled().await;
                exited.fetch_add(1, Ordering::SeqCst);
            });
        }
        let controller = ShutdownController::new(token, tracker.clone());

        assert!(controller.shutdown().await, "first shutdown joins the pool");
        assert!(tracker.is_empty());
        assert_eq!(exited.load(Ordering::SeqCst), 3);
        assert!(!controller.shutdown().await, "second shutdown is a no-op");
        assert_eq!(exited.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_shutdowns_join_once() {
        let token = CancellationToken::new();
        let tracker = TaskTracker::new();
        {
            let token = token.clone();
            tracker.spawn(async move { token.cancelled().await });
        }
        let controller = Arc::new(ShutdownController::new(token, tracker));

        let first = tokio::spawn({
            let controller = Arc::clone(&controller);
            async move { controller.shutdown().await }
        });
        let second = tokio::spawn({
            let controller = Arc::clone(&controller);
            async move { controller.shutdown().await }
        });
        let (first, second) = timeout(Duration::from_secs(1), async {
            (
                first.await.expect("first shutdown task"),
                second.await.expect("second shutdown task"),
            )
        })
        .await
        .expect("shutdown completes");
        assert!(first ^ second, "exactly one caller joins the workers");
    }

    #[test]
    fn trigger_is_idempotent() {
        let controller = ShutdownController::new(CancellationToken::new(), TaskTracker::new());
        controller.trigger();
        controller.trigger();
        assert!(controller.handle.is_triggered());
    }
}
