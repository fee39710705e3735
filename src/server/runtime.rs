//! Runtime control for [`CalcServer`].

mod accept;
mod backoff;

use std::sync::Arc;

#[cfg(test)]
pub(super) use accept::MockAcceptListener;
pub(super) use accept::accept_loop;
pub use backoff::BackoffConfig;
use futures::Future;
use log::{info, warn};
use tokio::{select, signal};
use tokio_util::task::TaskTracker;

use super::{
    Bound,
    CalcServer,
    ServerContext,
    ServerError,
    shutdown::ShutdownController,
    worker::worker_loop,
};
use crate::evaluator::Evaluator;

impl<E: Evaluator> CalcServer<E, Bound> {
    /// Run the server until Ctrl+C is received or a
    /// [`ShutdownHandle`](super::ShutdownHandle) is triggered.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use calcwire::{evaluator::ConstantEvaluator, server::CalcServer};
    ///
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), calcwire::server::ServerError> {
    /// let server = CalcServer::new(ConstantEvaluator::default())
    ///     .workers(4)
    ///     .bind(([127, 0, 0, 1], 8080).into())?;
    /// server.run().await?;
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// Attempting to run a server without binding fails to compile:
    ///
    /// ```compile_fail
    /// use calcwire::{evaluator::ConstantEvaluator, server::CalcServer};
    ///
    /// async fn try_run() {
    ///     CalcServer::new(ConstantEvaluator::default())
    ///         .run()
    ///         .await
    ///         .expect("unbound servers do not expose run()");
    /// }
    /// ```
    ///
    /// # Errors
    ///
    /// Currently never fails: accept failures are retried with exponential
    /// back-off and do not surface as errors.
    pub async fn run(self) -> Result<(), ServerError> {
        self.run_with_shutdown(async {
            if let Err(e) = signal::ctrl_c().await {
                warn!("failed to listen for Ctrl+C: error={e}");
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Run the server until `shutdown` resolves or a
    /// [`ShutdownHandle`](super::ShutdownHandle) is triggered.
    ///
    /// Every worker is joined before this returns. Clients still connected
    /// at that point are closed; a response already being written is
    /// finished first.
    ///
    /// # Examples
    ///
    /// ```
    /// use calcwire::{evaluator::ConstantEvaluator, server::CalcServer};
    /// use tokio::sync::oneshot;
    ///
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), calcwire::server::ServerError> {
    /// let server = CalcServer::new(ConstantEvaluator::default()).bind(([127, 0, 0, 1], 0).into())?;
    ///
    /// let (tx, rx) = oneshot::channel::<()>();
    /// let handle = tokio::spawn(async move {
    ///     server
    ///         .run_with_shutdown(async {
    ///             let _ = rx.await;
    ///         })
    ///         .await
    /// });
    ///
    /// let _ = tx.send(());
    /// handle
    ///     .await
    ///     .expect("join server task")
    ///     .expect("server run failed");
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// # Errors
    ///
    /// Accept failures are retried with exponential back-off and do not
    /// surface as errors.
    pub async fn run_with_shutdown<S>(self, shutdown: S) -> Result<(), ServerError>
    where
        S: Future<Output = ()> + Send,
    {
        let CalcServer {
            evaluator,
            workers,
            gate,
            shutdown: token,
            backoff_config,
            ready_tx,
            state: Bound { listener },
        } = self;
        let tracker = TaskTracker::new();
        let ctx = Arc::new(ServerContext::new(evaluator, gate, token.clone()));
        let controller = ShutdownController::new(token, tracker.clone());

        for id in 0..workers {
            tracker.spawn(worker_loop(id, Arc::clone(&ctx)));
        }
        info!(
            "server started: workers={workers}, local_addr={:?}",
            listener.local_addr().ok()
        );

        // Signal readiness after all workers have been spawned.
        if let Some(tx) = ready_tx
            && tx.send(()).is_err()
        {
            warn!("Failed to send readiness signal: receiver dropped");
        }

        select! {
            biased;

            () = shutdown => controller.trigger(),
            () = accept_loop(listener, Arc::clone(&ctx), backoff_config) => {},
        }

        controller.shutdown().await;
        info!("server stopped");
        Ok(())
    }
}
