//! Error types for curve evolution.

use bgm_core::{CoreError, CurveLabel, EvolutionLabels};
use bgm_curves::CurveError;
use bgm_math::MathError;
use thiserror::Error;

use crate::state::Quantity;

/// A specialized Result type for evolution operations.
pub type DynamicsResult<T> = Result<T, DynamicsError>;

/// Configuration operation result type.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised while building models or evolving curve states.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DynamicsError {
    /// The previous state is not the variant the evolver works on.
    #[error("Snapshot mismatch: expected a {expected} state, got a {actual} state")]
    SnapshotMismatch {
        /// Variant the evolver requires.
        expected: &'static str,
        /// Variant that was passed.
        actual: &'static str,
    },

    /// A keyed record was never populated for the requested entry.
    #[error("Missing quantity '{quantity}' for curve {label}")]
    MissingQuantity {
        /// Curve label.
        label: CurveLabel,
        /// Requested quantity.
        quantity: Quantity,
    },

    /// A snapshot field is not finite.
    #[error("Invalid field '{field}': {value}")]
    InvalidField {
        /// Name of the first offending field.
        field: &'static str,
        /// Offending value.
        value: f64,
    },

    /// The previous state belongs to a different curve pair.
    #[error("Label mismatch: expected {expected}, got {actual}")]
    LabelMismatch {
        /// Labels the evolver is configured for.
        expected: EvolutionLabels,
        /// Labels carried by the state.
        actual: EvolutionLabels,
    },

    /// Invalid argument or model setup.
    #[error("Invalid input: {reason}")]
    InvalidInput {
        /// Description of the problem.
        reason: String,
    },

    /// Numerical failure.
    #[error(transparent)]
    Math(#[from] MathError),

    /// Curve failure.
    #[error(transparent)]
    Curve(#[from] CurveError),

    /// Date, tenor or label failure.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Configuration failure.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl DynamicsError {
    /// Creates an invalid input error.
    #[must_use]
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }

    /// Creates a snapshot mismatch error.
    #[must_use]
    pub fn snapshot_mismatch(expected: &'static str, actual: &'static str) -> Self {
        Self::SnapshotMismatch { expected, actual }
    }

    /// Returns `value` when finite, otherwise a non-finite error naming `context`.
    pub fn ensure_finite(context: &str, value: f64) -> DynamicsResult<f64> {
        Ok(MathError::ensure_finite(context, value)?)
    }
}

/// Configuration error types.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Validation error.
    #[error("Validation error: {field}: {message}")]
    Validation {
        /// Field that failed validation.
        field: String,
        /// Validation error message.
        message: String,
    },

    /// Multiple validation errors.
    #[error("Multiple validation errors: {0:?}")]
    MultipleValidationErrors(Vec<ValidationError>),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Deserialization error.
    #[error("Deserialization error: {0}")]
    Deserialization(String),
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_data() || err.is_syntax() || err.is_eof() {
            ConfigError::Deserialization(err.to_string())
        } else {
            ConfigError::Serialization(err.to_string())
        }
    }
}

/// A single validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Field that failed validation.
    pub field: String,
    /// Validation error message.
    pub message: String,
    /// Validation rule that was violated.
    pub rule: Option<String>,
}

impl ValidationError {
    /// Creates a new validation error.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            rule: None,
        }
    }

    /// Creates a validation error with a rule name.
    pub fn with_rule(
        field: impl Into<String>,
        message: impl Into<String>,
        rule: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            rule: Some(rule.into()),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(ref rule) = self.rule {
            write!(f, "{}: {} (rule: {})", self.field, self.message, rule)
        } else {
            write!(f, "{}: {}", self.field, self.message)
        }
    }
}
