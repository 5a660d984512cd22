//! The canonical submission collection.
//!
//! A mapping from id to record, exposed as an ordered sequence. Id
//! uniqueness is enforced here; ordering is whatever the writers produce
//! (newest-first after a load, arrival order for live inserts).

use phishguard_types::{SubmissionId, SubmissionRecord};
use std::collections::HashMap;
use tracing::warn;

/// What an upsert did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Replaced,
}

/// Ordered, id-unique set of submission records.
#[derive(Debug, Clone, Default)]
pub struct SubmissionCollection {
    order: Vec<SubmissionId>,
    records: HashMap<SubmissionId, SubmissionRecord>,
}

impl SubmissionCollection {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a collection from a loaded sequence, keeping its order.
    /// A repeated id keeps the first occurrence.
    pub fn from_records(records: impl IntoIterator<Item = SubmissionRecord>) -> Self {
        let mut collection = Self::new();
        for record in records {
            if collection.records.contains_key(&record.id) {
                warn!("Dropping duplicate submission {} from load", record.id);
                continue;
            }
            collection.order.push(record.id);
            collection.records.insert(record.id, record);
        }
        collection
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, id: &SubmissionId) -> bool {
        self.records.contains_key(id)
    }

    pub fn get(&self, id: &SubmissionId) -> Option<&SubmissionRecord> {
        self.records.get(id)
    }

    /// Records in collection order.
    pub fn iter(&self) -> impl Iterator<Item = &SubmissionRecord> + '_ {
        self.order.iter().filter_map(|id| self.records.get(id))
    }

    /// Ids in collection order.
    pub fn ids(&self) -> &[SubmissionId] {
        &self.order
    }

    /// Owned copy of the records in collection order.
    pub fn snapshot(&self) -> Vec<SubmissionRecord> {
        self.iter().cloned().collect()
    }

    /// Replaces in place if the id exists, otherwise prepends.
    pub fn upsert_front(&mut self, record: SubmissionRecord) -> UpsertOutcome {
        if let Some(existing) = self.records.get_mut(&record.id) {
            *existing = record;
            return UpsertOutcome::Replaced;
        }
        self.order.insert(0, record.id);
        self.records.insert(record.id, record);
        UpsertOutcome::Inserted
    }

    /// Replaces in place if the id exists, otherwise inserts before the
    /// first record that is not newer (keeps newest-first order).
    pub fn upsert_by_timestamp(&mut self, record: SubmissionRecord) -> UpsertOutcome {
        if let Some(existing) = self.records.get_mut(&record.id) {
            *existing = record;
            return UpsertOutcome::Replaced;
        }
        let position = self
            .order
            .iter()
            .position(|id| {
                self.records
                    .get(id)
                    .is_some_and(|other| other.timestamp <= record.timestamp)
            })
            .unwrap_or(self.order.len());
        self.order.insert(position, record.id);
        self.records.insert(record.id, record);
        UpsertOutcome::Inserted
    }

    /// Replaces an existing record. Returns false if the id is unknown.
    pub fn replace(&mut self, record: SubmissionRecord) -> bool {
        match self.records.get_mut(&record.id) {
            Some(existing) => {
                *existing = record;
                true
            }
            None => false,
        }
    }

    /// Removes a record.
    pub fn remove(&mut self, id: &SubmissionId) -> Option<SubmissionRecord> {
        let removed = self.records.remove(id)?;
        self.order.retain(|other| other != id);
        Some(removed)
    }

    /// Sets the reveal flag, returning the previous value.
    pub fn set_revealed(&mut self, id: &SubmissionId, revealed: bool) -> Option<bool> {
        self.records
            .get_mut(id)
            .map(|record| std::mem::replace(&mut record.revealed, revealed))
    }
}
