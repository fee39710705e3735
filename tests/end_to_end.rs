//! End-to-end behaviour of a running server over real TCP connections.

use calcwire::{
    evaluator::ConstantEvaluator,
    protocol::{EVALUATION_ERROR_NOTICE, HANDSHAKE, OVERLOAD_NOTICE, TOO_LONG_NOTICE},
};
use calcwire_testing::{TestServer, read_handshake};
use rstest::rstest;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
    time::{Duration, timeout},
};

const ANSWER: &str = "The answer to the given equation is [1.000000]";

async fn read_len(stream: &mut TcpStream, len: usize) -> String {
    let mut buf = vec![0u8; len];
    timeout(Duration::from_secs(5), stream.read_exact(&mut buf))
        .await
        .expect("no response from server")
        .expect("read response");
    String::from_utf8(buf).expect("response is UTF-8")
}

#[tokio::test]
async fn capacity_bounds_admission_and_frees_on_disconnect() {
    let server = TestServer::start(ConstantEvaluator::default(), 2).await;

    let mut first = server.connect().await;
    let mut second = server.connect().await;
    let mut third = server.connect().await;

    assert_eq!(read_handshake(&mut first).await, [HANDSHAKE]);
    assert_eq!(read_handshake(&mut second).await, [HANDSHAKE]);
    assert_eq!(read_handshake(&mut third).await, OVERLOAD_NOTICE.as_bytes());
    assert_eq!(server.admission().available(), 0);

    drop(first);
    server.wait_for_available(1).await;

    let mut fourth = server.connect().await;
    assert_eq!(read_handshake(&mut fourth).await, [HANDSHAKE]);

    drop((second, fourth));
    server.wait_for_available(2).await;
    server.stop().await;
}

#[tokio::test]
async fn answers_many_requests_on_one_connection() {
    let server = TestServer::start(ConstantEvaluator::default(), 2).await;
    let mut client = server.connect().await;
    assert_eq!(read_handshake(&mut client).await, [HANDSHAKE]);

    for request in ["1 2 +", "3 4 *\n", "10 3 %"] {
        client.write_all(request.as_bytes()).await.expect("send");
        assert_eq!(read_len(&mut client, ANSWER.len()).await, ANSWER);
    }

    drop(client);
    server.wait_for_available(2).await;
    server.stop().await;
}

#[rstest]
#[case("hello")]
#[case("()")]
#[tokio::test]
async fn evaluation_error_keeps_connection_open(#[case] bad_request: &str) {
    let server = TestServer::start(ConstantEvaluator::default(), 2).await;
    let mut client = server.connect().await;
    assert_eq!(read_handshake(&mut client).await, [HANDSHAKE]);

    client.write_all(bad_request.as_bytes()).await.expect("send");
    assert_eq!(
        read_len(&mut client, EVALUATION_ERROR_NOTICE.len()).await,
        EVALUATION_ERROR_NOTICE
    );

    client.write_all(b"1 1 +").await.expect("send");
    assert_eq!(read_len(&mut client, ANSWER.len()).await, ANSWER);

    server.stop().await;
}

#[tokio::test]
async fn oversized_request_is_truncated_and_purged() {
    let server = TestServer::start(ConstantEvaluator::default(), 2).await;
    let mut client = server.connect().await;
    assert_eq!(read_handshake(&mut client).await, [HANDSHAKE]);

    client.write_all(&[b'7'; 150]).await.expect("send");
    let expected = format!("{TOO_LONG_NOTICE}{ANSWER}");
    assert_eq!(read_len(&mut client, expected.len()).await, expected);

    // Nothing from the first request may leak into the next one.
    client.write_all(b"2 2 +").await.expect("send");
    assert_eq!(read_len(&mut client, ANSWER.len()).await, ANSWER);

    server.stop().await;
}

#[tokio::test]
async fn evaluator_sees_sanitized_request() {
    let server = TestServer::start(
        |expression: &str| -> Result<f64, calcwire::EvaluationError> {
            assert_eq!(expression, "1 2 +   ");
            Ok(3.0)
        },
        2,
    )
    .await;
    let mut client = server.connect().await;
    assert_eq!(read_handshake(&mut client).await, [HANDSHAKE]);

    client.write_all(b"1 2 +abc\nignored").await.expect("send");
    let expected = "The answer to the given equation is [3.000000]";
    assert_eq!(read_len(&mut client, expected.len()).await, expected);

    server.stop().await;
}
