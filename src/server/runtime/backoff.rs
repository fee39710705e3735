//! Back-off configuration for the server accept loop.

use std::time::Duration;

/// Configuration for exponential back-off timing in the accept loop.
///
/// Accept failures such as running out of file descriptors are transient,
/// so the accept loop sleeps and retries instead of stopping. The delay
/// starts at `initial_delay`, doubles on each consecutive failure up to
/// `max_delay`, and resets after a successful accept.
///
/// # Default Values
/// - `initial_delay`: 10 milliseconds
/// - `max_delay`: 1 second
///
/// # Invariants
/// - `initial_delay` must not exceed `max_delay`
/// - `initial_delay` must be at least 1 millisecond
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BackoffConfig {
    /// Delay used for the first retry after an `accept()` failure.
    pub initial_delay: Duration,
    /// Maximum back-off delay once retries have increased exponentially.
    pub max_delay: Duration,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(10),
            max_delay: Duration::from_secs(1),
        }
    }
}

impl BackoffConfig {
    /// Clamp delays to sane bounds and ensure `initial_delay <= max_delay`.
    ///
    /// Both delays are raised to at least one millisecond and swapped if
    /// inverted.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    ///
    /// use calcwire::server::BackoffConfig;
    ///
    /// let cfg = BackoffConfig {
    ///     initial_delay: Duration::from_millis(5),
    ///     max_delay: Duration::from_millis(1),
    /// };
    ///
    /// let normalized = cfg.normalized();
    /// assert_eq!(normalized.initial_delay, Duration::from_millis(1));
    /// assert_eq!(normalized.max_delay, Duration::from_millis(5));
    /// ```
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.initial_delay = self.initial_delay.max(Duration::from_millis(1));
        self.max_delay = self.max_delay.max(Duration::from_millis(1));
        if self.initial_delay > self.max_delay {
            std::mem::swap(&mut self.initial_delay, &mut self.max_delay);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(10, 1000, 10, 1000)]
    #[case(0, 0, 1, 1)]
    #[case(50, 5, 5, 50)]
    fn normalized_bounds(
        #[case] initial: u64,
        #[case] max: u64,
        #[case] expected_initial: u64,
        #[case] expected_max: u64,
    ) {
        let cfg = BackoffConfig {
            initial_delay: Duration::from_millis(initial),
            max_delay: Duration::from_millis(max),
        }
        .normalized();
        assert_eq!(cfg.initial_delay, Duration::from_millis(expected_initial));
        assert_eq!(cfg.max_delay, Duration::from_millis(expected_max));
    }
}
