//! A calcwire server running in the background of a test.

use std::net::{Ipv4Addr, SocketAddr};

use calcwire::{
    evaluator::Evaluator,
    server::{AdmissionGate, CalcServer, ServerError, ShutdownHandle},
};
use tokio::{
    io::AsyncReadExt,
    net::TcpStream,
    sync::oneshot,
    task::JoinHandle,
    time::{Duration, Instant, sleep, timeout},
};

/// How long helpers wait before failing the test.
const PATIENCE: Duration = Duration::from_secs(5);

/// A server bound to an ephemeral localhost port.
pub struct TestServer {
    addr: SocketAddr,
    gate: AdmissionGate,
    shutdown: ShutdownHandle,
    task: JoinHandle<Result<(), ServerError>>,
}

impl TestServer {
    /// Bind and start a server with `workers` workers, returning once the
    /// worker pool is running.
    ///
    /// # Panics
    ///
    /// Panics if binding fails or the server stops before it is ready.
    pub async fn start<E: Evaluator>(evaluator: E, workers: usize) -> Self {
        let (ready_tx, ready_rx) = oneshot::channel();
        let server = CalcServer::new(evaluator)
            .workers(workers)
            .ready_signal(ready_tx)
            .bind(SocketAddr::from((Ipv4Addr::LOCALHOST, 0)))
            .expect("bind test server");
        let addr = server.local_addr().expect("test server address");
        let gate = server.admission();
        let shutdown = server.shutdown_handle();
        let task = tokio::spawn(server.run_with_shutdown(std::future::pending()));
        ready_rx.await.expect("test server never became ready");
        Self {
            addr,
            gate,
            shutdown,
            task,
        }
    }

    /// Address the server listens on.
    #[must_use]
    pub const fn addr(&self) -> SocketAddr { self.addr }

    /// The server's admission gate.
    #[must_use]
    pub const fn admission(&self) -> &AdmissionGate { &self.gate }

    /// Handle for stopping the server from another task.
    #[must_use]
    pub fn shutdown_handle(&self) -> ShutdownHandle { self.shutdown.clone() }

    /// Open a raw TCP connection to the server.
    ///
    /// # Panics
    ///
    /// Panics if the connection cannot be established.
    pub async fn connect(&self) -> TcpStream {
        TcpStream::connect(self.addr)
            .await
            .expect("connect to test server")
    }

    /// Wait until exactly `expected` permits are free.
    ///
    /// Permits are returned asynchronously after a client leaves, so tests
    /// poll rather than assert immediately.
    ///
    /// # Panics
    ///
    /// Panics if the count does not settle in time.
    pub async fn wait_for_available(&self, expected: usize) {
        let deadline = Instant::now() + PATIENCE;
        while self.gate.available() != expected {
            assert!(
                Instant::now() < deadline,
                "expected {expected} free permits, found {}",
                self.gate.available()
            );
            sleep(Duration::from_millis(5)).await;
        }
    }

    /// Trigger shutdown and wait for the server to return.
    ///
    /// # Panics
    ///
    /// Panics if the server does not stop in time or returns an error.
    pub async fn stop(self) {
        self.shutdown.trigger();
        timeout(PATIENCE, self.task)
            .await
            .expect("server did not stop in time")
            .expect("server task panicked")
            .expect("server returned an error");
    }
}

/// Read the server's greeting on a raw connection.
///
/// Returns the single handshake byte for an admitted client, or the whole
/// overload notice for a rejected one.
///
/// # Panics
///
/// Panics if reading fails or the server sends nothing in time.
pub async fn read_handshake(stream: &mut TcpStream) -> Vec<u8> {
    let mut first = [0u8; 1];
    timeout(PATIENCE, stream.read_exact(&mut first))
        .await
        .expect("no greeting from server")
        .expect("read greeting");
    if first[0] == calcwire::protocol::HANDSHAKE {
        return first.to_vec();
    }
    let mut rest = Vec::from(first);
    timeout(PATIENCE, stream.read_to_end(&mut rest))
        .await
        .expect("rejected client was not closed")
        .expect("read overload notice");
    rest
}
