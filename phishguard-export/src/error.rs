//! Export error types.

use thiserror::Error;

/// Result type for export operations.
pub type ExportResult<T> = Result<T, ExportError>;

/// Errors that can occur while producing or delivering an export.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("clipboard write failed: {0}")]
    Clipboard(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
