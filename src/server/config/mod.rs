//! Configuration utilities for [`CalcServer`].

use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use super::{
    AdmissionGate,
    BackoffConfig,
    CalcServer,
    MIN_WORKERS,
    ServerState,
    ShutdownHandle,
    Unbound,
};
use crate::evaluator::Evaluator;

pub mod binding;

#[cfg(test)]
mod tests;

impl<E: Evaluator> CalcServer<E, Unbound> {
    /// Create a new `CalcServer` answering requests with `evaluator`.
    ///
    /// The worker count defaults to [`MIN_WORKERS`]. The TCP listener is
    /// unset; call [`bind`](Self::bind) before running the server.
    ///
    /// # Examples
    ///
    /// ```
    /// use calcwire::{evaluator::ConstantEvaluator, server::CalcServer};
    ///
    /// let server = CalcServer::new(ConstantEvaluator::default());
    /// assert_eq!(server.worker_count(), 2);
    /// ```
    #[must_use]
    pub fn new(evaluator: E) -> Self {
        Self {
            evaluator,
            workers: MIN_WORKERS,
            gate: AdmissionGate::new(MIN_WORKERS),
            shutdown: CancellationToken::new(),
            backoff_config: BackoffConfig::default(),
            ready_tx: None,
            state: Unbound,
        }
    }
}

impl<E, S> CalcServer<E, S>
where
    E: Evaluator,
    S: ServerState,
{
    /// Set the size of the worker pool, which is also the admission limit.
    ///
    /// Counts below [`MIN_WORKERS`] are raised to it and counts above
    /// [`AdmissionGate::MAX_CAPACITY`] are lowered to it.
    ///
    /// # Examples
    ///
    /// ```
    /// use calcwire::{evaluator::ConstantEvaluator, server::CalcServer};
    ///
    /// let server = CalcServer::new(ConstantEvaluator::default()).workers(8);
    /// assert_eq!(server.worker_count(), 8);
    /// assert_eq!(server.workers(0).worker_count(), 2);
    /// ```
    #[must_use]
    pub fn workers(mut self, count: usize) -> Self {
        self.workers = count.clamp(MIN_WORKERS, AdmissionGate::MAX_CAPACITY);
        self.gate = AdmissionGate::new(self.workers);
        self
    }

    /// Configure exponential back-off for accept errors.
    ///
    /// The configuration is normalized before use.
    #[must_use]
    pub fn accept_backoff(mut self, config: BackoffConfig) -> Self {
        self.backoff_config = config.normalized();
        self
    }

    /// Configure a channel used to signal when the server is ready to accept
    /// connections.
    #[must_use]
    pub fn ready_signal(mut self, tx: oneshot::Sender<()>) -> Self {
        self.ready_tx = Some(tx);
        self
    }

    /// Returns the configured number of worker tasks.
    #[inline]
    #[must_use]
    pub const fn worker_count(&self) -> usize { self.workers }

    /// Returns the current back-off configuration.
    #[inline]
    #[must_use]
    pub const fn backoff_config(&self) -> &BackoffConfig { &self.backoff_config }

    /// Returns the admission gate, for observing how many permits are free.
    ///
    /// The gate is replaced when [`workers`](Self::workers) is called, so
    /// fetch it after configuring the pool size.
    #[must_use]
    pub fn admission(&self) -> AdmissionGate { self.gate.clone() }

    /// Returns a handle that stops the server once it is running.
    ///
    /// Triggering the handle before [`run`](CalcServer::run) makes the run
    /// return as soon as the workers have started.
    #[must_use]
    pub fn shutdown_handle(&self) -> ShutdownHandle { ShutdownHandle::new(self.shutdown.clone()) }
}
