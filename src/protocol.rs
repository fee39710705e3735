//! Wire protocol spoken between `calcwire` servers and clients.
//!
//! A connection starts with a one byte handshake ([`HANDSHAKE`]) from the
//! server. After that the client sends a single line of at most
//! [`MAX_REQUEST_LEN`] bytes per request and the server answers with one
//! text message. Responses carry no delimiter or length prefix; a client
//! treats one read as one response.
//!
//! Requests longer than the limit are not rejected. The server reads the
//! first [`MAX_REQUEST_LEN`] bytes, warns the client with
//! [`TOO_LONG_NOTICE`] and discards whatever else is pending on the socket.

use std::io;

use log::{debug, warn};
use thiserror::Error;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
};

/// Maximum number of request bytes consumed per round.
pub const MAX_REQUEST_LEN: usize = 100;

/// Maximum length of any response written by the server.
pub const MAX_RESPONSE_LEN: usize = 100;

/// Byte sent to every admitted client before its first request.
pub const HANDSHAKE: u8 = b'0';

/// Sent to a client turned away because every worker is busy.
pub const OVERLOAD_NOTICE: &str = "Unable to accept connection. Try again later.\n";

/// Sent when a request exceeds [`MAX_REQUEST_LEN`].
pub const TOO_LONG_NOTICE: &str = "Received message longer than 100 characters. Flushing excess.\n";

/// Sent before the server drops a connection it failed to read from.
pub const SERVER_ERROR_NOTICE: &str = "Server error. Disconnecting client.\n";

/// Sent when the evaluator rejects a request. The connection stays open.
pub const EVALUATION_ERROR_NOTICE: &str = "An error occurred processing the given equation.";

const PURGE_CHUNK: usize = 256;

/// Failure while exchanging a request or response with a client.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Receiving from the client failed.
    #[error("failed to read from client: {0}")]
    Read(#[source] io::Error),
    /// Sending to the client failed.
    #[error("failed to send to client: {0}")]
    Send(#[source] io::Error),
}

/// Result of reading one request from a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// A sanitized request ready for evaluation.
    Request(String),
    /// The client closed its side of the connection.
    Disconnected,
}

/// Returns `true` for the arithmetic operators accepted in requests.
#[must_use]
pub const fn is_operator(byte: u8) -> bool { matches!(byte, b'+' | b'-' | b'*' | b'/' | b'%') }

/// Normalize raw request bytes before evaluation.
///
/// Input is cut at the first newline or NUL byte. Every remaining byte that
/// is not an ASCII digit, an operator or `.` becomes a space, so the result
/// is always ASCII and never longer than `raw`.
///
/// ```
/// use calcwire::protocol::sanitize;
///
/// assert_eq!(sanitize(b"3 + 5\nGARBAGE"), "3 + 5");
/// assert_eq!(sanitize(b"12#34"), "12 34");
/// ```
#[must_use]
pub fn sanitize(raw: &[u8]) -> String {
    raw.iter()
        .take_while(|&&byte| byte != b'\n' && byte != b'\0')
        .map(|&byte| {
            if byte.is_ascii_digit() || is_operator(byte) || byte == b'.' {
                char::from(byte)
            } else {
                ' '
            }
        })
        .collect()
}

/// Render an evaluator answer as the response sent to the client.
///
/// The answer uses six fractional digits and the message is capped at
/// [`MAX_RESPONSE_LEN`] bytes.
#[must_use]
pub fn format_answer(answer: f64) -> String {
    let mut response = format!("The answer to the given equation is [{answer:.6}]");
    response.truncate(MAX_RESPONSE_LEN);
    response
}

/// Read and sanitize one request from `stream`.
///
/// The pending byte count is peeked first. When more than
/// [`MAX_REQUEST_LEN`] bytes are waiting, the client is sent
/// [`TOO_LONG_NOTICE`] and the excess is drained with [`purge`] so the
/// next request starts on a clean socket.
///
/// # Errors
///
/// Returns [`SessionError::Read`] if receiving fails, including while
/// purging, and [`SessionError::Send`] if the over-length notice cannot be
/// delivered.
pub async fn read_request(stream: &mut TcpStream) -> Result<ReadOutcome, SessionError> {
    let mut buf = [0u8; MAX_REQUEST_LEN + 1];
    let pending = stream.peek(&mut buf).await.map_err(SessionError::Read)?;
    let read = stream
        .read(&mut buf[..MAX_REQUEST_LEN])
        .await
        .map_err(SessionError::Read)?;

    if pending > MAX_REQUEST_LEN {
        warn!("request exceeds limit: limit={MAX_REQUEST_LEN}");
        stream
            .write_all(TOO_LONG_NOTICE.as_bytes())
            .await
            .map_err(SessionError::Send)?;
        let purged = purge(stream).map_err(SessionError::Read)?;
        debug!("purged excess request bytes: purged={purged}");
    }

    if read == 0 {
        return Ok(ReadOutcome::Disconnected);
    }
    let request = sanitize(&buf[..read]);
    debug!("request received: request={request:?}");
    Ok(ReadOutcome::Request(request))
}

/// Discard bytes already pending on `stream` without waiting for more.
///
/// Reads in fixed chunks until a short read or until the socket reports
/// it would block. Returns the number of bytes thrown away.
///
/// # Errors
///
/// Returns any receive error other than [`io::ErrorKind::WouldBlock`].
pub fn purge(stream: &TcpStream) -> io::Result<usize> {
    let mut scratch = [0u8; PURGE_CHUNK];
    let mut purged = 0;
    loop {
        match stream.try_read(&mut scratch) {
            Ok(n) => {
                purged += n;
                if n < PURGE_CHUNK {
                    return Ok(purged);
                }
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(purged),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
}
