//! Metric helpers for `calcwire`.
//!
//! This module defines metric names and simple helper functions
//! wrapping the [`metrics`](https://docs.rs/metrics) crate. Without the
//! `metrics` feature the helpers compile to no-ops.

#[cfg(feature = "metrics")]
use metrics::{counter, gauge};

/// Name of the gauge tracking clients currently holding an admission permit.
pub const CONNECTIONS_ACTIVE: &str = "calcwire_connections_active";
/// Name of the counter tracking clients turned away at capacity.
pub const CONNECTIONS_REJECTED: &str = "calcwire_connections_rejected_total";
/// Name of the counter tracking requests answered.
pub const REQUESTS_TOTAL: &str = "calcwire_requests_total";
/// Name of the counter tracking error occurrences.
pub const ERRORS_TOTAL: &str = "calcwire_errors_total";
/// Name of the counter tracking sessions that panicked.
pub const WORKER_PANICS: &str = "calcwire_worker_panics_total";

/// Increment the active connections gauge.
pub fn inc_connections() {
    #[cfg(feature = "metrics")]
    gauge!(CONNECTIONS_ACTIVE).increment(1.0);
}

/// Decrement the active connections gauge.
pub fn dec_connections() {
    #[cfg(feature = "metrics")]
    gauge!(CONNECTIONS_ACTIVE).decrement(1.0);
}

/// Record a client rejected because no permit was free.
pub fn inc_rejected() {
    #[cfg(feature = "metrics")]
    counter!(CONNECTIONS_REJECTED).increment(1);
}

/// Record an answered request, whether or not evaluation succeeded.
pub fn inc_requests() {
    #[cfg(feature = "metrics")]
    counter!(REQUESTS_TOTAL).increment(1);
}

/// Record an error occurrence.
pub fn inc_errors() {
    #[cfg(feature = "metrics")]
    counter!(ERRORS_TOTAL).increment(1);
}

/// Record a session that panicked inside a worker.
pub fn inc_worker_panics() {
    #[cfg(feature = "metrics")]
    counter!(WORKER_PANICS).increment(1);
}
