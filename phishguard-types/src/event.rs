//! Change-feed events.
//!
//! The remote datastore streams one event per row change. Inserts and
//! updates carry the full record; deletes only the id.

use crate::{SubmissionId, SubmissionRecord};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single change delivered by the live channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "record", rename_all = "lowercase")]
pub enum ChangeEvent {
    /// A row was created.
    Insert(SubmissionRecord),
    /// A row changed; carries the row as it is now.
    Update(SubmissionRecord),
    /// A row was removed.
    Delete { id: SubmissionId },
}

impl ChangeEvent {
    /// The id of the affected record.
    pub fn id(&self) -> SubmissionId {
        match self {
            ChangeEvent::Insert(record) | ChangeEvent::Update(record) => record.id,
            ChangeEvent::Delete { id } => *id,
        }
    }

    /// The kind of change, without the payload.
    pub fn kind(&self) -> ChangeKind {
        match self {
            ChangeEvent::Insert(_) => ChangeKind::Insert,
            ChangeEvent::Update(_) => ChangeKind::Update,
            ChangeEvent::Delete { .. } => ChangeKind::Delete,
        }
    }

    /// The record carried by inserts and updates.
    pub fn record(&self) -> Option<&SubmissionRecord> {
        match self {
            ChangeEvent::Insert(record) | ChangeEvent::Update(record) => Some(record),
            ChangeEvent::Delete { .. } => None,
        }
    }
}

/// Payload-free discriminant of a [`ChangeEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ChangeKind::Insert => "insert",
            ChangeKind::Update => "update",
            ChangeKind::Delete => "delete",
        })
    }
}
