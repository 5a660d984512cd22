//! Core type definitions for the PhishGuard submission engine.
//!
//! This crate defines the fundamental types shared by every other crate:
//! - Submission identifiers (UUID v7)
//! - The submission record, its intake payload and its partial patch
//! - Change-feed events delivered by the remote datastore
//! - Local calendar-day helpers used by querying and analytics
//!
//! Nothing here performs I/O.

mod event;
mod ids;
mod submission;
pub mod timestamp;

pub use event::{ChangeEvent, ChangeKind};
pub use ids::SubmissionId;
pub use submission::{
    QrSource, SubmissionForm, SubmissionPatch, SubmissionPayload, SubmissionRecord, Variant,
    UNKNOWN_LOCATION,
};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid UUID: {0}")]
    InvalidUuid(#[from] uuid::Error),

    #[error("invalid variant: {0}")]
    InvalidVariant(String),

    #[error("invalid email: {0:?}")]
    InvalidEmail(String),
}
