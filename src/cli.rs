//! Command line interface for the `calcwire` server binary.
//!
//! Also compiled by `build.rs` to render the man page, so it only depends on
//! `clap`, `thiserror` and the standard library.

use std::net::SocketAddr;

use clap::Parser;

/// Errors raised while converting command line values.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CliError {
    /// The port is not a number.
    #[error("invalid port number: {0}")]
    InvalidPort(String),
    /// The port is outside `1..=65535`.
    #[error("port number out of range: {0} (must be between 1 and 65535)")]
    PortOutOfRange(i64),
}

/// Parse a listening port, rejecting zero.
///
/// # Errors
///
/// Returns [`CliError`] if `raw` is not an integer in `1..=65535`.
pub fn parse_port(raw: &str) -> Result<u16, CliError> {
    let value: i64 = raw
        .trim()
        .parse()
        .map_err(|_| CliError::InvalidPort(raw.to_owned()))?;
    match u16::try_from(value) {
        Ok(port) if port != 0 => Ok(port),
        _ => Err(CliError::PortOutOfRange(value)),
    }
}

/// Command line arguments for the `calcwire` binary.
#[derive(Debug, Parser)]
#[command(
    name = "calcwire",
    version,
    about = "Bounded-concurrency calculation server"
)]
pub struct Cli {
    /// Port to listen on.
    #[arg(short, long, value_parser = parse_port)]
    pub port: u16,

    /// Number of worker tasks, which is also the maximum number of clients
    /// served at once. Values below 2 are raised to 2.
    #[arg(short = 'n', long, default_value_t = 2, allow_negative_numbers = true)]
    pub workers: i64,

    /// Address for the Prometheus metrics endpoint.
    #[arg(long, value_name = "ADDR")]
    pub metrics_addr: Option<SocketAddr>,
}

impl Cli {
    /// Worker count raised to at least `minimum`.
    ///
    /// The flag is `true` when the requested count had to be raised.
    #[must_use]
    pub fn worker_count(&self, minimum: usize) -> (usize, bool) {
        match usize::try_from(self.workers) {
            Ok(n) if n >= minimum => (n, false),
            _ => (minimum, true),
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use rstest::rstest;

    use super::{Cli, CliError, parse_port};

    #[test]
    fn parses_port_and_defaults_workers() {
        let cli = Cli::parse_from(["calcwire", "--port", "8080"]);
        assert_eq!(cli.port, 8080);
        assert_eq!(cli.worker_count(2), (2, false));
        assert!(cli.metrics_addr.is_none());
    }

    #[rstest]
    #[case("4", (4, false))]
    #[case("2", (2, false))]
    #[case("1", (2, true))]
    #[case("0", (2, true))]
    #[case("-3", (2, true))]
    fn worker_count_is_raised_to_minimum(#[case] raw: &str, #[case] expected: (usize, bool)) {
        let cli = Cli::parse_from(["calcwire", "-p", "9000", "-n", raw]);
        assert_eq!(cli.worker_count(2), expected);
    }

    #[rstest]
    #[case("1", Ok(1))]
    #[case("65535", Ok(65535))]
    #[case("0", Err(CliError::PortOutOfRange(0)))]
    #[case("65536", Err(CliError::PortOutOfRange(65536)))]
    #[case("-1", Err(CliError::PortOutOfRange(-1)))]
    #[case("http", Err(CliError::InvalidPort("http".to_owned())))]
    fn port_parsing(#[case] raw: &str, #[case] expected: Result<u16, CliError>) {
        assert_eq!(parse_port(raw), expected);
    }

    #[test]
    fn port_is_required() {
        assert!(Cli::try_parse_from(["calcwire"]).is_err());
    }

    #[test]
    fn rejects_port_zero_at_parse_time() {
        assert!(Cli::try_parse_from(["calcwire", "-p", "0"]).is_err());
    }
}
