//! Error types for calcwire client operations.

use std::io;

/// Errors emitted by [`crate::client::CalcClient`].
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Transport error.
    #[error("transport error: {0}")]
    Io(#[from] io::Error),
    /// The server is at capacity and turned the connection away.
    #[error("server rejected the connection: {0}")]
    Rejected(String),
    /// The first byte from the server was not the handshake byte.
    #[error("unexpected handshake byte {0:#04x}")]
    UnexpectedHandshake(u8),
    /// The request is empty, so there is nothing to send.
    #[error("request is empty")]
    EmptyRequest,
    /// The request is longer than the server accepts.
    #[error("request is {0} bytes; the limit is {max}", max = crate::protocol::MAX_REQUEST_LEN)]
    RequestTooLong(usize),
    /// The peer closed the connection before a response arrived.
    #[error("connection closed by peer")]
    Disconnected,
}
