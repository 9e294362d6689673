use thiserror::Error;

/// Result type for ULTIMA operations
pub type Result<T> = std::result::Result<T, ReasonerError>;

/// Main error type for the reasoning core
#[derive(Debug, Clone, Error)]
pub enum ReasonerError {
    /// Vector or matrix length does not match the expected shape
    #[error("Invalid dimension: expected {expected}, got {actual}")]
    InvalidDimension {
        expected: String,
        actual: String,
    },

    /// Invalid configuration value
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter {
        name: String,
        reason: String,
    },

    /// IO errors (config files, snapshots)
    #[error("IO error: {0}")]
    Io(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Numerical computation errors
    #[error("Numerical error: {0}")]
    NumericalError(String),

    /// The shared session lock was poisoned by a panicking holder
    #[error("Session lock poisoned")]
    LockPoisoned,
}

impl From<std::io::Error> for ReasonerError {
    fn from(err: std::io::Error) -> Self {
        ReasonerError::Io(err.to_string())
    }
}

impl From<bincode::Error> for ReasonerError {
    fn from(err: bincode::Error) -> Self {
        ReasonerError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for ReasonerError {
    fn from(err: serde_json::Error) -> Self {
        ReasonerError::Serialization(err.to_string())
    }
}

impl ReasonerError {
    pub fn invalid_dimension<S: Into<String>>(expected: S, actual: S) -> Self {
        ReasonerError::InvalidDimension {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub fn invalid_parameter<S: Into<String>>(name: S, reason: S) -> Self {
        ReasonerError::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Shorthand for a vector length mismatch
    pub(crate) fn length_mismatch(expected: usize, actual: usize) -> Self {
        Self::invalid_dimension(format!("length {}", expected), format!("length {}", actual))
    }
}
