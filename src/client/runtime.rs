//! Connected client state.

use std::net::SocketAddr;

use log::debug;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpStream, ToSocketAddrs},
};

use super::ClientError;
use crate::protocol::{HANDSHAKE, MAX_REQUEST_LEN, MAX_RESPONSE_LEN, OVERLOAD_NOTICE};

/// A connection to a calcwire server that has passed the handshake.
#[derive(Debug)]
pub struct CalcClient {
    stream: TcpStream,
}

impl CalcClient {
    /// Connect to `addr` and wait for the server's handshake byte.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Rejected`] with the server's notice when the
    /// server is at capacity, [`ClientError::UnexpectedHandshake`] when the
    /// first byte is anything else, and [`ClientError::Io`] if connecting
    /// or reading fails.
    pub async fn connect(addr: impl ToSocketAddrs) -> Result<Self, ClientError> {
        let mut stream = TcpStream::connect(addr).await?;
        let mut first = [0u8; 1];
        if stream.read(&mut first).await? == 0 {
            return Err(ClientError::Disconnected);
        }
        let [byte] = first;
        if byte == HANDSHAKE {
            return Ok(Self { stream });
        }

        if OVERLOAD_NOTICE.as_bytes().first() != Some(&byte) {
            return Err(ClientError::UnexpectedHandshake(byte));
        }
        // The server closes the connection after the overload notice.
        let mut notice = vec![byte];
        stream.read_to_end(&mut notice).await?;
        let notice = String::from_utf8_lossy(&notice).into_owned();
        if notice == OVERLOAD_NOTICE {
            Err(ClientError::Rejected(notice.trim_end().to_owned()))
        } else {
            Err(ClientError::UnexpectedHandshake(byte))
        }
    }

    /// Returns the address of the server.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket address cannot be read.
    pub fn peer_addr(&self) -> Result<SocketAddr, ClientError> { Ok(self.stream.peer_addr()?) }

    /// Send `expression` and wait for the server's reply.
    ///
    /// The reply is whatever a single receive returns, up to
    /// [`MAX_RESPONSE_LEN`] bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::EmptyRequest`] or
    /// [`ClientError::RequestTooLong`] without contacting the server if
    /// `expression` is empty or exceeds [`MAX_REQUEST_LEN`] bytes,
    /// [`ClientError::Disconnected`] if the server closes the connection and
    /// [`ClientError::Io`] on transport failure.
    pub async fn request(&mut self, expression: &str) -> Result<String, ClientError> {
        // A zero-length write never reaches the server, so no reply would come.
        if expression.is_empty() {
            return Err(ClientError::EmptyRequest);
        }
        if expression.len() > MAX_REQUEST_LEN {
            return Err(ClientError::RequestTooLong(expression.len()));
        }
        self.stream.write_all(expression.as_bytes()).await?;
        debug!("request sent: bytes={}", expression.len());

        let mut buf = [0u8; MAX_RESPONSE_LEN];
        let n = self.stream.read(&mut buf).await?;
        if n == 0 {
            return Err(ClientError::Disconnected);
        }
        Ok(String::from_utf8_lossy(&buf[..n]).into_owned())
    }

    /// Close the connection.
    ///
    /// # Errors
    ///
    /// Returns an error if shutting down the write half fails.
    pub async fn close(mut self) -> Result<(), ClientError> {
        self.stream.shutdown().await?;
        Ok(())
    }
}
