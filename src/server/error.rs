//! Errors raised by [`CalcServer`](super::CalcServer) operations.

use std::io;

use thiserror::Error;

/// Errors that prevent the server from starting.
///
/// Failures on individual connections never surface here; they are logged
/// and contained by the accept loop or the worker serving the client.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Creating, binding or listening on the socket failed.
    #[error("bind error: {0}")]
    Bind(#[source] io::Error),
}
