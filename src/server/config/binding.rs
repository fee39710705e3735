//! Listener binding for [`CalcServer`].

use std::{
    io,
    net::{SocketAddr, TcpListener as StdTcpListener},
    sync::Arc,
};

use tokio::net::{TcpListener, TcpSocket};

use super::{ServerState, Unbound};
use crate::{
    evaluator::Evaluator,
    server::{Bound, CalcServer, LISTEN_BACKLOG, ServerError},
};

/// Open a listening socket on `addr` with `SO_REUSEADDR` and a backlog of
/// [`LISTEN_BACKLOG`].
fn listen_on(addr: SocketAddr) -> io::Result<TcpListener> {
    let socket = if addr.is_ipv4() {
        TcpSocket::new_v4()?
    } else {
        TcpSocket::new_v6()?
    };
    socket.set_reuseaddr(true)?;
    socket.bind(addr)?;
    socket.listen(LISTEN_BACKLOG)
}

impl<E, S> CalcServer<E, S>
where
    E: Evaluator,
    S: ServerState,
{
    fn into_bound(self, listener: TcpListener) -> CalcServer<E, Bound> {
        let CalcServer {
            evaluator,
            workers,
            gate,
            shutdown,
            backoff_config,
            ready_tx,
            ..
        } = self;

        CalcServer {
            evaluator,
            workers,
            gate,
            shutdown,
            backoff_config,
            ready_tx,
            state: Bound {
                listener: Arc::new(listener),
            },
        }
    }

    fn bind_to_addr(self, addr: SocketAddr) -> Result<CalcServer<E, Bound>, ServerError> {
        let listener = listen_on(addr).map_err(ServerError::Bind)?;
        Ok(self.into_bound(listener))
    }

    fn bind_to_listener(
        self,
        std_listener: StdTcpListener,
    ) -> Result<CalcServer<E, Bound>, ServerError> {
        std_listener
            .set_nonblocking(true)
            .map_err(ServerError::Bind)?;
        let listener = TcpListener::from_std(std_listener).map_err(ServerError::Bind)?;
        Ok(self.into_bound(listener))
    }
}

impl<E: Evaluator> CalcServer<E, Unbound> {
    /// Return `None` as the server is not bound.
    #[must_use]
    pub const fn local_addr(&self) -> Option<SocketAddr> { None }

    /// Bind to `addr` with address reuse enabled.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::net::{Ipv4Addr, SocketAddr};
    ///
    /// use calcwire::{evaluator::ConstantEvaluator, server::CalcServer};
    ///
    /// # #[tokio::main]
    /// # async fn main() {
    /// let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, 0));
    /// let server = CalcServer::new(ConstantEvaluator::default())
    ///     .bind(addr)
    ///     .expect("bind failed");
    /// assert!(server.local_addr().is_some());
    /// # }
    /// ```
    ///
    /// # Errors
    /// Returns a [`ServerError`] if creating, binding or listening on the
    /// socket fails.
    pub fn bind(self, addr: SocketAddr) -> Result<CalcServer<E, Bound>, ServerError> {
        self.bind_to_addr(addr)
    }

    /// Bind to an existing `StdTcpListener`.
    ///
    /// The listener keeps whatever socket options and backlog it was
    /// created with.
    ///
    /// # Errors
    /// Returns a [`ServerError`] if configuring the listener fails.
    pub fn bind_existing_listener(
        self,
        std_listener: StdTcpListener,
    ) -> Result<CalcServer<E, Bound>, ServerError> {
        self.bind_to_listener(std_listener)
    }
}

impl<E: Evaluator> CalcServer<E, Bound> {
    /// Returns the bound address, or `None` if retrieving it fails.
    #[must_use]
    pub fn local_addr(&self) -> Option<SocketAddr> { self.state.listener.local_addr().ok() }

    /// Rebind to a fresh address.
    ///
    /// # Errors
    /// Returns a [`ServerError`] if creating, binding or listening on the
    /// socket fails.
    pub fn bind(self, addr: SocketAddr) -> Result<Self, ServerError> { self.bind_to_addr(addr) }

    /// Rebind using an existing `StdTcpListener`.
    ///
    /// # Errors
    /// Returns a [`ServerError`] if configuring the listener fails.
    pub fn bind_existing_listener(self, std_listener: StdTcpListener) -> Result<Self, ServerError> {
        self.bind_to_listener(std_listener)
    }
}
