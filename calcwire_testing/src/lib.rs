//! Test utilities for `calcwire`.
//!
//! [`TestServer`] runs a real server on an ephemeral port so tests can talk
//! to it over TCP, and [`LoggerHandle`] captures `log` records for
//! assertions.
//!
//! ```rust,no_run
//! use calcwire::evaluator::ConstantEvaluator;
//! use calcwire_testing::TestServer;
//!
//! # async fn example() {
//! let server = TestServer::start(ConstantEvaluator::default(), 2).await;
//! let client = server.connect().await;
//! drop(client);
//! server.stop().await;
//! # }
//! ```

pub mod logging;
pub mod server;

pub use logging::{LoggerHandle, logger};
pub use server::{TestServer, read_handshake};
