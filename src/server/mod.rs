//! Bounded-concurrency TCP server for `calcwire`.
//!
//! One accept loop hands connections to a fixed pool of worker tasks:
//!
//! 1. the accept loop takes a permit from the [`AdmissionGate`]; clients
//!    beyond capacity receive an overload notice and are closed;
//! 2. admitted clients receive the handshake byte and are published to the
//!    single-slot [`ConnectionMailbox`];
//! 3. an idle worker claims the connection, serves it until the client
//!    leaves, then releases the permit and waits for the next one.
//!
//! Shutdown is requested through a [`ShutdownHandle`] or the future passed
//! to [`CalcServer::run_with_shutdown`]. It wakes every idle worker, ends
//! idle sessions and joins the pool before [`CalcServer::run`] returns.

use std::sync::Arc;

use tokio::{net::TcpListener, sync::oneshot};
use tokio_util::sync::CancellationToken;

use crate::evaluator::Evaluator;

/// Smallest worker pool the server will run with.
pub const MIN_WORKERS: usize = 2;

/// Pending connection queue length passed to `listen`.
pub const LISTEN_BACKLOG: u32 = 5;

/// Tokio-based calculation server.
///
/// The server carries a typestate `S` indicating whether it is [`Unbound`]
/// or [`Bound`] to a TCP listener; only bound servers can run. Each of the
/// `workers` tasks serves one client at a time, and the same number bounds
/// how many clients are admitted at once.
pub struct CalcServer<E, S = Unbound>
where
    E: Evaluator,
    S: ServerState,
{
    pub(crate) evaluator: E,
    pub(crate) workers: usize,
    pub(crate) gate: AdmissionGate,
    pub(crate) shutdown: CancellationToken,
    pub(crate) backoff_config: BackoffConfig,
    /// Channel used to notify when the worker pool is running.
    ///
    /// A `oneshot::Sender` transmits a single notification, so a new sender
    /// must be supplied each time a server is started.
    pub(crate) ready_tx: Option<oneshot::Sender<()>>,
    pub(crate) state: S,
}

/// Marker indicating the server has not yet bound a listener.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unbound;

/// Marker indicating the server is bound to a TCP listener.
#[derive(Debug, Clone)]
pub struct Bound {
    pub(crate) listener: Arc<TcpListener>,
}

/// Trait implemented by [`Unbound`] and [`Bound`] to model binding typestate.
pub trait ServerState: sealed::Sealed {}

mod sealed {
    //! Prevent external implementations of [`ServerState`].

    pub trait Sealed {}
    impl Sealed for super::Unbound {}
    impl Sealed for super::Bound {}
}

impl ServerState for Unbound {}
impl ServerState for Bound {}

/// State shared by the accept loop and every worker for one server run.
pub(crate) struct ServerContext<E> {
    pub(crate) gate: AdmissionGate,
    pub(crate) mailbox: ConnectionMailbox<connection::AdmittedConnection>,
    pub(crate) evaluator: E,
    pub(crate) shutdown: CancellationToken,
}

impl<E: Evaluator> ServerContext<E> {
    pub(crate) fn new(evaluator: E, gate: AdmissionGate, shutdown: CancellationToken) -> Self {
        Self {
            gate,
            mailbox: ConnectionMailbox::new(shutdown.clone()),
            evaluator,
            shutdown,
        }
    }
}

mod config;
mod connection;
pub mod error;
mod gate;
mod mailbox;
mod runtime;
mod shutdown;
mod worker;

pub use config::binding;
pub use error::ServerError;
pub use gate::{AdmissionGate, AdmissionPermit};
pub use mailbox::ConnectionMailbox;
/// Re-exported configuration types for server backoff behavior.
pub use runtime::BackoffConfig;
pub use shutdown::ShutdownHandle;

#[cfg(test)]
pub(crate) mod test_util;
