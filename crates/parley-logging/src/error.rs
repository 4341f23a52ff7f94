//! Error types for parley-logging

use thiserror::Error;

/// Errors that can occur while installing the subscriber
#[derive(Debug, Error)]
pub enum LoggingError {
    /// A global subscriber was already installed
    #[error("Logging already initialized: {0}")]
    AlreadyInitialized(String),

    /// The log directory or file could not be created
    #[error("Log file error: {0}")]
    Io(#[from] std::io::Error),

    /// The default level is not a valid filter directive
    #[error("Invalid log filter: {0}")]
    InvalidFilter(String),
}

/// Result type for logging setup
pub type LoggingResult<T> = Result<T, LoggingError>;
