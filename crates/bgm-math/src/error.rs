//! Error types for numerical operations.

use thiserror::Error;

/// A specialized Result type for numerical operations.
pub type MathResult<T> = Result<T, MathError>;

/// Errors that can occur during numerical operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    /// Division by zero or near-zero value.
    #[error("Division by zero or near-zero value: {value:.2e}")]
    DivisionByZero {
        /// The near-zero value.
        value: f64,
    },

    /// Vector or matrix dimensions are incompatible.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension.
        expected: usize,
        /// Actual dimension.
        actual: usize,
    },

    /// Insufficient data points for operation.
    #[error("Insufficient data: need at least {required}, got {actual}")]
    InsufficientData {
        /// Minimum required points.
        required: usize,
        /// Actual number of points.
        actual: usize,
    },

    /// A computation produced or received NaN or infinity.
    #[error("Non-finite value {value} in {context}")]
    NonFinite {
        /// Where the value appeared.
        context: String,
        /// The offending value.
        value: f64,
    },

    /// A spline fit could not be produced.
    #[error("Spline fit '{name}' failed: {reason}")]
    FitFailed {
        /// Name of the fit request.
        name: String,
        /// Why the fit failed.
        reason: String,
    },

    /// A replayed draw sequence has no draws left.
    #[error("Factor sequence exhausted after {draws} draws")]
    SequenceExhausted {
        /// Number of draws served before exhaustion.
        draws: usize,
    },

    /// Invalid input parameter.
    #[error("Invalid input: {reason}")]
    InvalidInput {
        /// Description of the invalid input.
        reason: String,
    },
}

impl MathError {
    /// Creates an invalid input error.
    #[must_use]
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }

    /// Creates an insufficient data error.
    #[must_use]
    pub fn insufficient_data(required: usize, actual: usize) -> Self {
        Self::InsufficientData { required, actual }
    }

    /// Creates a non-finite value error.
    #[must_use]
    pub fn non_finite(context: impl Into<String>, value: f64) -> Self {
        Self::NonFinite {
            context: context.into(),
            value,
        }
    }

    /// Creates a fit failure error.
    #[must_use]
    pub fn fit_failed(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::FitFailed {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Returns `value` unchanged if it is finite.
    pub fn ensure_finite(context: &str, value: f64) -> MathResult<f64> {
        if value.is_finite() {
            Ok(value)
        } else {
            Err(Self::non_finite(context, value))
        }
    }
}
