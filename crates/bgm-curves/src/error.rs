//! Error types for curve operations.

use bgm_core::CoreError;
use bgm_math::MathError;
use thiserror::Error;

/// A specialized Result type for curve operations.
pub type CurveResult<T> = Result<T, CurveError>;

/// Error types for curve operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CurveError {
    /// Not enough pillars or knots to build a curve.
    #[error("Insufficient points: need at least {required}, got {got}")]
    InsufficientPoints {
        /// Minimum required points.
        required: usize,
        /// Actual number of points provided.
        got: usize,
    },

    /// A discount factor was zero or negative where a positive one is required.
    #[error("Non-positive discount factor {value:.6e} at t={t:.4}")]
    NonPositiveDiscountFactor {
        /// Time in years from the reference date.
        t: f64,
        /// The discount factor.
        value: f64,
    },

    /// A forward period is empty or reversed.
    #[error("Invalid forward period: start {start:.6} >= end {end:.6}")]
    InvalidPeriod {
        /// Period start in years.
        start: f64,
        /// Period end in years.
        end: f64,
    },

    /// Invalid value (NaN, Inf, or domain error).
    #[error("Invalid value: {reason}")]
    InvalidValue {
        /// Description of why value is invalid.
        reason: String,
    },

    /// Builder error.
    #[error("Builder error: {reason}")]
    BuilderError {
        /// Description of the builder error.
        reason: String,
    },

    /// Error raised by a numerical routine.
    #[error(transparent)]
    Math(#[from] MathError),

    /// Error raised by a core type.
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl CurveError {
    /// Creates an invalid value error.
    #[must_use]
    pub fn invalid_value(reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            reason: reason.into(),
        }
    }

    /// Creates a builder error.
    #[must_use]
    pub fn builder_error(reason: impl Into<String>) -> Self {
        Self::BuilderError {
            reason: reason.into(),
        }
    }

    /// Returns `value` if finite, otherwise an invalid value error naming `what`.
    pub fn ensure_finite(what: &str, value: f64) -> CurveResult<f64> {
        if value.is_finite() {
            Ok(value)
        } else {
            Err(Self::invalid_value(format!("{what} is {value}")))
        }
    }
}
