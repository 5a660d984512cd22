//! Error types for the sync layer.

use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur in sync operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Network or transport failure talking to the datastore.
    #[error("network error: {0}")]
    Network(String),

    /// The datastore refused a write.
    #[error("write rejected: {0}")]
    Rejected(String),

    /// HTTP client error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Timeout.
    #[error("operation timed out")]
    Timeout,
}

impl SyncError {
    /// Returns true for failures of the transport itself, as opposed to a
    /// datastore that answered and said no.
    pub fn is_transport(&self) -> bool {
        matches!(self, SyncError::Network(_) | SyncError::Http(_) | SyncError::Timeout)
    }
}
