//! Mutation coordinator - optimistic reveal toggling.
//!
//! Local state changes first so the dashboard reacts immediately; the
//! remote write follows. What happens when the write fails is governed by
//! [`RevealPolicy`] for single toggles. Bulk reveals are all-or-nothing and
//! reconcile through a forced re-fetch.

use crate::engine::SyncManager;
use crate::error::SyncResult;
use crate::state::Operation;
use phishguard_types::{SubmissionId, SubmissionPatch};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Failure handling for single reveal toggles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RevealPolicy {
    /// Restore the previous flag once retries are exhausted.
    pub rollback_on_failure: bool,
    /// Extra attempts after the first failed write.
    pub max_retries: u32,
    /// Pause between attempts (ms).
    pub retry_backoff_ms: u64,
}

impl Default for RevealPolicy {
    fn default() -> Self {
        Self {
            rollback_on_failure: true,
            max_retries: 1,
            retry_backoff_ms: 250,
        }
    }
}

impl RevealPolicy {
    /// Log-only policy: no retry, the optimistic flag stays.
    pub fn keep_optimistic() -> Self {
        Self {
            rollback_on_failure: false,
            max_retries: 0,
            retry_backoff_ms: 0,
        }
    }
}

/// The operator's row selection, in selection order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    order: Vec<SubmissionId>,
    members: HashSet<SubmissionId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, id: &SubmissionId) -> bool {
        self.members.contains(id)
    }

    pub fn ids(&self) -> &[SubmissionId] {
        &self.order
    }

    /// Selects or deselects one row. Returns true if it is now selected.
    pub fn toggle(&mut self, id: SubmissionId) -> bool {
        if self.members.remove(&id) {
            self.order.retain(|other| *other != id);
            false
        } else {
            self.members.insert(id);
            self.order.push(id);
            true
        }
    }

    /// Returns true if the page is non-empty and exactly its rows are selected.
    pub fn is_all_selected(&self, page: &[SubmissionId]) -> bool {
        !page.is_empty() && self.len() == page.len() && page.iter().all(|id| self.contains(id))
    }

    /// The header checkbox: clears when the whole page is selected,
    /// otherwise selects exactly the page.
    pub fn toggle_all(&mut self, page: &[SubmissionId]) {
        if self.is_all_selected(page) {
            self.clear();
        } else {
            self.clear();
            for id in page {
                if self.members.insert(*id) {
                    self.order.push(*id);
                }
            }
        }
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.members.clear();
    }

    /// Empties the selection, returning its ids.
    pub fn take(&mut self) -> Vec<SubmissionId> {
        self.members.clear();
        std::mem::take(&mut self.order)
    }
}

/// Applies optimistic reveal edits and confirms them remotely.
#[derive(Clone)]
pub struct MutationCoordinator {
    sync: SyncManager,
    policy: RevealPolicy,
}

impl MutationCoordinator {
    /// Creates a coordinator writing through `sync`'s collection and store,
    /// using the reveal policy from its config.
    pub fn new(sync: SyncManager) -> Self {
        let policy = sync.config().reveal_policy.clone();
        Self { sync, policy }
    }

    /// Overrides the reveal policy.
    #[must_use]
    pub fn with_policy(mut self, policy: RevealPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &RevealPolicy {
        &self.policy
    }

    /// Sets `revealed` on one record.
    ///
    /// The local flag flips before the first await, then the remote update
    /// is issued (with retries). If every attempt fails the error is
    /// recorded and returned, and the local flag is rolled back when the
    /// policy asks for it and nothing else has changed it meanwhile.
    pub async fn toggle_reveal(&self, id: SubmissionId, revealed: bool) -> SyncResult<()> {
        let previous = self.sync.set_revealed_local(&id, revealed);
        if previous.is_none() {
            debug!("Submission {} not in the local collection; updating remote only", id);
        }

        let _busy = self.sync.flags().enter(Operation::Mutating);
        let patch = SubmissionPatch::revealed(revealed);
        let mut attempt = 0;
        loop {
            match self.sync.store().update(id, patch).await {
                Ok(()) => {
                    debug!("Confirmed revealed={} for {}", revealed, id);
                    return Ok(());
                }
                Err(e) if attempt < self.policy.max_retries => {
                    attempt += 1;
                    warn!(
                        "Reveal update for {} failed (attempt {}): {}; retrying",
                        id, attempt, e
                    );
                    tokio::time::sleep(Duration::from_millis(self.policy.retry_backoff_ms)).await;
                }
                Err(e) => {
                    error!("Failed to update reveal status for {}: {}", id, e);
                    if self.policy.rollback_on_failure {
                        if let Some(previous) = previous {
                            if self.sync.restore_revealed(&id, revealed, previous) {
                                info!("Rolled back revealed={} for {}", previous, id);
                            }
                        }
                    }
                    self.sync
                        .record_error(format!("failed to update reveal status: {e}"));
                    return Err(e);
                }
            }
        }
    }

    /// Reveals every selected record in one batch and clears the selection.
    pub async fn bulk_reveal(&self, selection: &mut Selection) -> SyncResult<usize> {
        let ids = selection.take();
        self.bulk_reveal_ids(&ids).await
    }

    /// Reveals `ids` in one batch.
    ///
    /// The batch is all-or-nothing. On failure the local optimistic flags
    /// are discarded by re-fetching the collection, and the write error is
    /// returned.
    pub async fn bulk_reveal_ids(&self, ids: &[SubmissionId]) -> SyncResult<usize> {
        if ids.is_empty() {
            return Ok(0);
        }

        let found = self.sync.set_revealed_many(ids, true);
        debug!("Optimistically revealed {} of {} selected submissions", found, ids.len());

        let result = {
            let _busy = self.sync.flags().enter(Operation::Mutating);
            self.sync
                .store()
                .bulk_update(ids, SubmissionPatch::revealed(true))
                .await
        };

        match result {
            Ok(()) => {
                info!("Revealed {} submissions", ids.len());
                Ok(ids.len())
            }
            Err(e) => {
                error!("Bulk reveal of {} submissions failed: {}", ids.len(), e);
                self.sync
                    .record_error(format!("failed to reveal selected submissions: {e}"));
                if let Err(refetch) = self.sync.load_initial().await {
                    warn!("Reconciling after failed bulk reveal also failed: {}", refetch);
                }
                Err(e)
            }
        }
    }
}
