#![doc(html_root_url = "https://docs.rs/calcwire/latest")]
//! Public API for the `calcwire` library.
//!
//! `calcwire` is a bounded-concurrency TCP calculation server. A fixed pool
//! of workers serves one client each; clients beyond the pool size are told
//! to try again later. Each request is a short line of arithmetic that is
//! sanitized and handed to a pluggable [`Evaluator`].
//!
//! ```no_run
//! use calcwire::{evaluator::ConstantEvaluator, server::CalcServer};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), calcwire::server::ServerError> {
//! CalcServer::new(ConstantEvaluator::default())
//!     .workers(4)
//!     .bind(([0, 0, 0, 0], 4000).into())?
//!     .run()
//!     .await
//! # }
//! ```

pub mod client;
pub mod evaluator;
pub mod metrics;
pub mod panic;
pub mod protocol;
pub mod server;
pub mod session;

pub use client::{CalcClient, ClientError};
pub use evaluator::{ConstantEvaluator, EvaluationError, Evaluator};
pub use metrics::{
    CONNECTIONS_ACTIVE,
    CONNECTIONS_REJECTED,
    ERRORS_TOTAL,
    REQUESTS_TOTAL,
    WORKER_PANICS,
};
pub use server::{CalcServer, ServerError, ShutdownHandle};
pub use session::SessionEnd;
