//! Error types for parley-sync
//!
//! Store faults never cross this boundary as-is: every operation converts
//! them into one of the [`SyncError`] kinds the UI knows how to display.

use parley_store::StoreError;
use thiserror::Error;

/// Errors reported by the sync components
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    /// Room name was empty after trimming
    #[error("Room name cannot be empty")]
    EmptyName,

    /// Room name cannot address a single document
    #[error("Room name cannot contain '/': {0}")]
    InvalidName(String),

    /// A room with this name already exists
    #[error("Room name already exists")]
    NameTaken,

    /// Profile username was empty after trimming
    #[error("Please enter your username")]
    EmptyUsername,

    /// The viewer has no resolvable user id
    #[error("Not signed in")]
    Unauthenticated,

    /// Message body was empty and the configured policy rejects it
    #[error("Message cannot be empty")]
    EmptyBody,

    /// A read, write or lookup against the store failed
    #[error("{0}")]
    WriteFailed(String),

    /// A live subscription reported a non-fatal fault
    #[error("Subscription error: {0}")]
    Subscription(String),
}

impl SyncError {
    /// Wrap a store fault with a short description of the failed step
    pub(crate) fn write_failed(context: &str, err: StoreError) -> Self {
        SyncError::WriteFailed(format!("{context}: {err}"))
    }

    /// Whether resubmitting the same request may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, SyncError::WriteFailed(_) | SyncError::Subscription(_))
    }
}

impl From<StoreError> for SyncError {
    fn from(e: StoreError) -> Self {
        SyncError::WriteFailed(e.to_string())
    }
}

/// Result type for sync operations
pub type SyncResult<T> = Result<T, SyncError>;
