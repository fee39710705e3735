//! Server shutdown with idle and busy clients.

use std::time::Duration;

use calcwire::{evaluator::ConstantEvaluator, protocol::HANDSHAKE};
use calcwire_testing::{TestServer, read_handshake};
use rstest::rstest;
use tokio::{io::AsyncReadExt, net::TcpStream, time::timeout};

#[rstest]
#[case(1)]
#[case(3)]
#[tokio::test]
async fn repeated_triggers_stop_the_server_once(#[case] triggers: usize) {
    let server = TestServer::start(ConstantEvaluator::default(), 2).await;
    let handle = server.shutdown_handle();
    for _ in 0..triggers {
        handle.trigger();
    }
    assert!(handle.is_triggered());
    server.stop().await;
}

#[tokio::test]
async fn shutdown_does_not_wait_for_idle_clients() {
    let server = TestServer::start(ConstantEvaluator::default(), 2).await;
    let mut idle = [server.connect().await, server.connect().await];
    for client in &mut idle {
        assert_eq!(read_handshake(client).await, [HANDSHAKE]);
    }
    let gate = server.admission().clone();

    server.stop().await;
    assert_eq!(gate.available(), gate.capacity());

    for client in &mut idle {
        let mut buf = [0u8; 8];
        let n = timeout(Duration::from_secs(5), client.read(&mut buf))
            .await
            .expect("client not closed on shutdown")
            .unwrap_or(0);
        assert_eq!(n, 0);
    }
}

#[tokio::test]
async fn shutdown_handle_can_be_triggered_from_another_task() {
    let server = TestServer::start(ConstantEvaluator::default(), 2).await;
    let handle = server.shutdown_handle();
    let waiter = tokio::spawn({
        let handle = handle.clone();
        async move { handle.triggered().await }
    });
    tokio::spawn(async move { handle.trigger() });

    timeout(Duration::from_secs(5), waiter)
        .await
        .expect("trigger not observed")
        .expect("waiter panicked");
    server.stop().await;
}

#[tokio::test]
async fn new_connections_are_refused_after_shutdown() {
    let server = TestServer::start(ConstantEvaluator::default(), 2).await;
    let addr = server.addr();
    server.stop().await;

    // The listener is closed once the server returns.
    assert!(TcpStream::connect(addr).await.is_err());
}
