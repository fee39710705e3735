//! Client side of the calculation protocol.
//!
//! [`CalcClient`] performs the handshake check and sends one expression per
//! round trip. The interactive front end is left to callers; they can use
//! [`is_exit_command`] to recognise the quit command without contacting the
//! server.

mod error;
mod runtime;

pub use error::ClientError;
pub use runtime::CalcClient;

/// Command that ends an interactive client session.
pub const EXIT_COMMAND: &str = "exit";

/// Returns `true` if `input` asks the client to quit.
///
/// Matching is by prefix, so trailing text such as a newline is ignored.
///
/// ```
/// use calcwire::client::is_exit_command;
///
/// assert!(is_exit_command("exit\n"));
/// assert!(!is_exit_command("1 2 +"));
/// ```
#[must_use]
pub fn is_exit_command(input: &str) -> bool { input.starts_with(EXIT_COMMAND) }
