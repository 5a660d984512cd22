//! Change applicator - applies change-feed events to the canonical collection.
//!
//! Upsert semantics keep the collection free of duplicate ids no matter how
//! the initial load and the live feed interleave:
//! - `insert`: replace in place when the id is known, otherwise add
//! - `update`: replace when known, otherwise ignore
//! - `delete`: remove when known, otherwise ignore

use crate::collection::{SubmissionCollection, UpsertOutcome};
use phishguard_types::ChangeEvent;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Where a live insert for an unknown id lands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsertOrdering {
    /// Prepend: the collection reads as recency of arrival.
    #[default]
    Arrival,
    /// Insert at its timestamp position, keeping newest-first order.
    Timestamp,
}

/// The effect an event had on the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Inserted,
    Replaced,
    Removed,
    /// Unknown id for an update or delete.
    Ignored,
}

impl Applied {
    /// Returns true if the collection changed.
    pub fn changed(&self) -> bool {
        !matches!(self, Applied::Ignored)
    }
}

/// Applies change events using the configured insert ordering.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChangeApplicator {
    ordering: InsertOrdering,
}

impl ChangeApplicator {
    /// Creates a new applicator.
    pub fn new(ordering: InsertOrdering) -> Self {
        Self { ordering }
    }

    /// The insert ordering in effect.
    pub fn ordering(&self) -> InsertOrdering {
        self.ordering
    }

    /// Applies a single event.
    pub fn apply(&self, event: &ChangeEvent, collection: &mut SubmissionCollection) -> Applied {
        match event {
            ChangeEvent::Insert(record) => {
                let outcome = match self.ordering {
                    InsertOrdering::Arrival => collection.upsert_front(record.clone()),
                    InsertOrdering::Timestamp => collection.upsert_by_timestamp(record.clone()),
                };
                match outcome {
                    UpsertOutcome::Inserted => {
                        debug!("Inserted submission {}", record.id);
                        Applied::Inserted
                    }
                    UpsertOutcome::Replaced => {
                        debug!("Insert for known submission {} replaced it in place", record.id);
                        Applied::Replaced
                    }
                }
            }
            ChangeEvent::Update(record) => {
                if collection.replace(record.clone()) {
                    debug!("Updated submission {}", record.id);
                    Applied::Replaced
                } else {
                    debug!("Ignoring update for unknown submission {}", record.id);
                    Applied::Ignored
                }
            }
            ChangeEvent::Delete { id } => {
                if collection.remove(id).is_some() {
                    debug!("Deleted submission {}", id);
                    Applied::Removed
                } else {
                    debug!("Ignoring delete for unknown submission {}", id);
                    Applied::Ignored
                }
            }
        }
    }

    /// Applies events in order, returning how many changed the collection.
    pub fn apply_all<'a>(
        &self,
        events: impl IntoIterator<Item = &'a ChangeEvent>,
        collection: &mut SubmissionCollection,
    ) -> usize {
        events
            .into_iter()
            .filter(|event| self.apply(event, collection).changed())
            .count()
    }
}
