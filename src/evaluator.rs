//! Evaluation capability consulted by each session.
//!
//! The server never interprets a request itself. Sanitized request text is
//! handed to an [`Evaluator`], and whatever number or error it produces is
//! rendered back to the client. Swapping the arithmetic engine, or faking it
//! in tests, only requires a different implementation of this trait.

use thiserror::Error;

/// Error produced when an expression cannot be evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvaluationError {
    /// The expression is not well formed.
    #[error("malformed expression: {0}")]
    Malformed(String),
    /// The expression is well formed but its value is undefined.
    #[error("undefined result: {0}")]
    Undefined(String),
}

/// Turns sanitized request text into a numeric answer.
///
/// Implementations are shared by every worker, so they must be `Send + Sync`
/// and should not block for long: a slow evaluation holds both a worker and
/// an admission permit.
///
/// Any `Fn(&str) -> Result<f64, EvaluationError>` closure is an evaluator:
///
/// ```
/// use calcwire::evaluator::{EvaluationError, Evaluator};
///
/// let halve = |text: &str| -> Result<f64, EvaluationError> {
///     text.trim()
///         .parse::<f64>()
///         .map(|v| v / 2.0)
///         .map_err(|e| EvaluationError::Malformed(e.to_string()))
/// };
/// assert_eq!(halve.evaluate("8").expect("evaluates"), 4.0);
/// ```
pub trait Evaluator: Send + Sync + 'static {
    /// Evaluate `expression`.
    ///
    /// # Errors
    ///
    /// Returns an [`EvaluationError`] if the expression has no value.
    fn evaluate(&self, expression: &str) -> Result<f64, EvaluationError>;
}

impl<F> Evaluator for F
where
    F: Fn(&str) -> Result<f64, EvaluationError> + Send + Sync + 'static,
{
    fn evaluate(&self, expression: &str) -> Result<f64, EvaluationError> { self(expression) }
}

/// Evaluator that answers every request with the same value.
///
/// Used by the binary until a real arithmetic engine is plugged in. Empty
/// requests (nothing left after sanitation) are still reported as malformed
/// so clients see the error path.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConstantEvaluator {
    answer: f64,
}

impl ConstantEvaluator {
    /// Create an evaluator answering `answer`.
    #[must_use]
    pub const fn new(answer: f64) -> Self { Self { answer } }

    /// The value returned for every non-empty request.
    #[must_use]
    pub const fn answer(&self) -> f64 { self.answer }
}

impl Default for ConstantEvaluator {
    fn default() -> Self { Self::new(1.0) }
}

impl Evaluator for ConstantEvaluator {
    fn evaluate(&self, expression: &str) -> Result<f64, EvaluationError> {
        if expression.trim().is_empty() {
            return Err(EvaluationError::Malformed("empty expression".into()));
        }
        Ok(self.answer)
    }
}
