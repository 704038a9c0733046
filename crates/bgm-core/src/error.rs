//! Error types for the core crate.

use thiserror::Error;

/// A specialized Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors raised while building dates, tenors and labels.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Error in date calculations or invalid date.
    #[error("Invalid date: {message}")]
    InvalidDate {
        /// Description of the date error.
        message: String,
    },

    /// A tenor string or tenor value could not be interpreted.
    #[error("Invalid tenor: {reason}")]
    InvalidTenor {
        /// Description of what is wrong with the tenor.
        reason: String,
    },

    /// A curve label is empty or malformed.
    #[error("Invalid label '{label}': {reason}")]
    InvalidLabel {
        /// The offending label text.
        label: String,
        /// Reason for rejection.
        reason: String,
    },
}

impl CoreError {
    /// Creates an invalid date error.
    #[must_use]
    pub fn invalid_date(message: impl Into<String>) -> Self {
        Self::InvalidDate {
            message: message.into(),
        }
    }

    /// Creates an invalid tenor error.
    #[must_use]
    pub fn invalid_tenor(reason: impl Into<String>) -> Self {
        Self::InvalidTenor {
            reason: reason.into(),
        }
    }

    /// Creates an invalid label error.
    #[must_use]
    pub fn invalid_label(label: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidLabel {
            label: label.into(),
            reason: reason.into(),
        }
    }
}
