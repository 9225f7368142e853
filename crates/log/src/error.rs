//! Logging error types

/// Errors from logger initialization
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    /// The level string is not a valid filter directive
    #[error("Invalid log filter {directive:?}: {reason}")]
    Filter { directive: String, reason: String },

    /// The global subscriber could not be installed
    #[error("Failed to install global subscriber: {0}")]
    Init(String),

    /// An environment override holds an unknown value
    #[error("Invalid value for {variable}: {value:?}")]
    Env { variable: &'static str, value: String },
}

/// Result type for logging operations
pub type LogResult<T> = Result<T, LogError>;
