//! Request/response rounds for one admitted client.
//!
//! A session lasts from the handshake until the client disconnects, an I/O
//! error occurs or the server shuts down. Evaluation failures are answered
//! with [`EVALUATION_ERROR_NOTICE`] and do not end the session.

use std::fmt;

use log::{debug, info, warn};
use tokio::{io::AsyncWriteExt, net::TcpStream, select};
use tokio_util::sync::CancellationToken;

use crate::{
    evaluator::Evaluator,
    protocol::{
        self,
        EVALUATION_ERROR_NOTICE,
        ReadOutcome,
        SERVER_ERROR_NOTICE,
        SessionError,
    },
};

/// Why a session finished.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionEnd {
    /// The client closed the connection.
    Disconnected,
    /// Receiving a request failed.
    ReadError,
    /// Sending a response failed.
    SendError,
    /// The server shut down while waiting for the next request.
    Shutdown,
}

impl fmt::Display for SessionEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Disconnected => "disconnected",
            Self::ReadError => "read_error",
            Self::SendError => "send_error",
            Self::Shutdown => "shutdown",
        })
    }
}

/// Serve requests on `stream` until the session ends.
///
/// Waiting for the next request races `shutdown`, so an idle client never
/// holds up server shutdown. A response already being written is finished
/// first.
pub async fn serve<E>(stream: &mut TcpStream, evaluator: &E, shutdown: &CancellationToken) -> SessionEnd
where
    E: Evaluator + ?Sized,
{
    loop {
        let outcome = select! {
            biased;

            () = shutdown.cancelled() => return SessionEnd::Shutdown,
            outcome = protocol::read_request(stream) => outcome,
        };

        let result = match outcome {
            Ok(ReadOutcome::Request(request)) => respond(stream, evaluator, &request).await,
            Ok(ReadOutcome::Disconnected) => return SessionEnd::Disconnected,
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => {}
            Err(SessionError::Read(e)) => {
                warn!("failed to read from client: error={e}");
                crate::metrics::inc_errors();
                if let Err(e) = stream.write_all(SERVER_ERROR_NOTICE.as_bytes()).await {
                    debug!("failed to send server error notice: error={e}");
                }
                return SessionEnd::ReadError;
            }
            Err(SessionError::Send(e)) => {
                warn!("failed to send to client: error={e}");
                crate::metrics::inc_errors();
                return SessionEnd::SendError;
            }
        }
    }
}

async fn respond<E>(stream: &mut TcpStream, evaluator: &E, request: &str) -> Result<(), SessionError>
where
    E: Evaluator + ?Sized,
{
    crate::metrics::inc_requests();
    let response = match evaluator.evaluate(request) {
        Ok(answer) => {
            info!("request evaluated: request={request:?}, answer={answer}");
            protocol::format_answer(answer)
        }
        Err(e) => {
            info!("request rejected by evaluator: request={request:?}, error={e}");
            EVALUATION_ERROR_NOTICE.to_owned()
        }
    };
    stream
        .write_all(response.as_bytes())
        .await
        .map_err(SessionError::Send)
}
