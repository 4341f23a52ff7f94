//! Error types for parley-store
//!
//! Every backend maps its own transport faults into [`StoreError`] so the
//! sync layer only ever sees one error type.

use thiserror::Error;

/// Errors that can occur in store operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The store could not be reached or refused the request
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// The caller is not allowed to read or write the path
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// A collection or document path is malformed
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Error while encoding or decoding document fields
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl StoreError {
    /// Create a new Unavailable error
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }

    /// Create a new PermissionDenied error
    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::PermissionDenied(message.into())
    }

    /// Create a new InvalidPath error
    pub fn invalid_path(path: impl Into<String>) -> Self {
        Self::InvalidPath(path.into())
    }

    /// Create a new Serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization(message.into())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;


    #[test]
    fn test_invalid_path_names_the_path() {
        let err = StoreError::invalid_path("chatRooms/a/b");
        assert!(matches!(err, StoreError::InvalidPath(_)));
        assert!(err.to_string().contains("chatRooms/a/b"));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let store_err: StoreError = json_err.into();
        assert!(matches!(store_err, StoreError::Serialization(_)));
    }

    #[test]
    fn test_errors_are_cloneable() {
        let err = StoreError::permission_denied("messages");
        assert_eq!(err.clone(), err);
    }
}
