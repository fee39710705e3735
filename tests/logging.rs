//! Log output of a running server.

use calcwire::{
    evaluator::{ConstantEvaluator, EvaluationError},
    protocol::HANDSHAKE,
};
use calcwire_testing::{LoggerHandle, TestServer, logger, read_handshake};
use log::Level;
use rstest::rstest;
use tokio::io::AsyncWriteExt;

#[rstest]
#[tokio::test]
async fn overload_is_logged_at_info(mut logger: LoggerHandle) {
    let server = TestServer::start(ConstantEvaluator::default(), 2).await;
    let mut held = Vec::new();
    for _ in 0..2 {
        let mut client = server.connect().await;
        assert_eq!(read_handshake(&mut client).await, [HANDSHAKE]);
        held.push(client);
    }
    let mut extra = server.connect().await;
    assert_ne!(read_handshake(&mut extra).await, [HANDSHAKE]);
    drop(held);
    server.stop().await;

    let mut found = false;
    while let Some(record) = logger.pop() {
        if record.args().contains("max connections reached") {
            assert_eq!(record.level(), Level::Info);
            found = true;
        }
    }
    assert!(found, "overload was not logged");
}

/// A panicking session is logged with its payload and the peer address,
/// and the server carries on.
#[rstest]
#[tokio::test]
async fn session_panic_is_logged(mut logger: LoggerHandle) {
    let server = TestServer::start(
        |_: &str| -> Result<f64, EvaluationError> { panic!("boom") },
        2,
    )
    .await;
    let mut client = server.connect().await;
    assert_eq!(read_handshake(&mut client).await, [HANDSHAKE]);
    client.write_all(b"1 2 +").await.expect("send");
    // The panic is logged before the permit is released.
    server.wait_for_available(2).await;
    server.stop().await;

    let mut found_task = false;
    let mut found_msg = false;
    let mut found_addr = false;
    while let Some(record) = logger.pop() {
        if record.args().contains("client session panicked") {
            found_task = true;
            found_msg |= record.args().contains("boom");
            found_addr |= record.args().contains("peer_addr");
        }
    }
    assert!(found_task);
    assert!(found_msg);
    assert!(found_addr);
}

#[rstest]
#[tokio::test]
async fn shutdown_is_logged(mut logger: LoggerHandle) {
    let server = TestServer::start(ConstantEvaluator::default(), 2).await;
    server.stop().await;

    let messages = logger.messages();
    assert!(messages.iter().any(|m| m.contains("shutdown requested")));
    assert!(messages.iter().any(|m| m.contains("all workers joined")));
}
