//! Sync manager - owns the canonical collection.
//!
//! Performs the initial bulk load, merges the live change feed into the
//! collection, and exposes snapshots to the query and analytics layers.
//!
//! The collection sits behind a short-lived lock that is never held across
//! an await, so every mutation (load completion, event application,
//! optimistic toggle) is atomic with respect to the others and reads are
//! always available.
//!
//! Loads and the live feed may race. Feed events and local reveal edits
//! applied while a load is in flight are journaled and replayed on top of
//! the loaded snapshot, so a change made after the load's query ran is
//! neither lost nor duplicated.

use crate::applicator::{Applied, ChangeApplicator, InsertOrdering};
use crate::collection::SubmissionCollection;
use crate::datastore::{ChangeFeed, FeedId, RemoteQuery, SubmissionStore, SUBMISSIONS_TABLE};
use crate::error::SyncResult;
use crate::mutation::RevealPolicy;
use crate::state::{BusyFlags, ErrorSlot, LoadingStates, Operation};
use phishguard_types::{ChangeEvent, SubmissionId, SubmissionPayload, SubmissionRecord};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Configuration for the sync manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Table scope for the change feed.
    pub table: String,
    /// Where live inserts land in the collection.
    pub insert_ordering: InsertOrdering,
    /// How long the last error stays visible (ms).
    pub error_ttl_ms: u64,
    /// Failure handling for optimistic reveal toggles.
    pub reveal_policy: RevealPolicy,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            table: SUBMISSIONS_TABLE.to_string(),
            insert_ordering: InsertOrdering::default(),
            error_ttl_ms: 5_000,
            reveal_policy: RevealPolicy::default(),
        }
    }
}

/// Result of a completed initial load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The loaded records replaced the collection.
    Applied {
        /// Collection size after the load.
        records: usize,
        /// Live events replayed on top of the snapshot.
        replayed: usize,
    },
    /// The manager was closed before the response arrived.
    Discarded,
}

/// A change made while a load is in flight, replayed onto its snapshot.
enum JournalEntry {
    /// A change-feed event.
    Event(ChangeEvent),
    /// A local reveal edit (optimistic flip or rollback).
    Reveal { id: SubmissionId, revealed: bool },
}

struct Canonical {
    records: SubmissionCollection,
    /// Changes applied while at least one load is in flight.
    journal: Vec<JournalEntry>,
    loads_in_flight: usize,
}

impl Canonical {
    fn set_revealed(&mut self, id: &SubmissionId, revealed: bool) -> Option<bool> {
        let previous = self.records.set_revealed(id, revealed);
        if self.loads_in_flight > 0 {
            self.journal.push(JournalEntry::Reveal { id: *id, revealed });
        }
        previous
    }

    fn end_load(&mut self) {
        self.loads_in_flight = self.loads_in_flight.saturating_sub(1);
        if self.loads_in_flight == 0 {
            self.journal.clear();
        }
    }
}

struct Shared {
    canonical: RwLock<Canonical>,
    applicator: ChangeApplicator,
    flags: Arc<BusyFlags>,
    errors: ErrorSlot,
    closed: AtomicBool,
}

impl Shared {
    fn read(&self) -> RwLockReadGuard<'_, Canonical> {
        self.canonical.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Canonical> {
        self.canonical.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Registers a load and returns its journal offset.
    fn begin_load(&self) -> usize {
        let mut canonical = self.write();
        canonical.loads_in_flight += 1;
        canonical.journal.len()
    }

    fn finish_load(&self, journal_start: usize, loaded: Vec<SubmissionRecord>) -> LoadOutcome {
        let mut canonical = self.write();
        if self.is_closed() {
            canonical.end_load();
            return LoadOutcome::Discarded;
        }

        let mut records = SubmissionCollection::from_records(loaded);
        let replay = canonical.journal.get(journal_start..).unwrap_or_default();
        let replayed = replay
            .iter()
            .filter(|entry| match entry {
                JournalEntry::Event(event) => self.applicator.apply(event, &mut records).changed(),
                JournalEntry::Reveal { id, revealed } => {
                    records.set_revealed(id, *revealed).is_some()
                }
            })
            .count();
        canonical.records = records;
        canonical.end_load();

        LoadOutcome::Applied {
            records: canonical.records.len(),
            replayed,
        }
    }

    fn abandon_load(&self) {
        self.write().end_load();
    }

    fn apply_event(&self, event: &ChangeEvent) -> Option<Applied> {
        if self.is_closed() {
            return None;
        }
        let mut canonical = self.write();
        let applied = self.applicator.apply(event, &mut canonical.records);
        if canonical.loads_in_flight > 0 {
            canonical.journal.push(JournalEntry::Event(event.clone()));
        }
        Some(applied)
    }
}

/// The sync manager.
///
/// Cheap to clone; clones share the same collection and flags.
#[derive(Clone)]
pub struct SyncManager {
    store: Arc<dyn SubmissionStore>,
    config: SyncConfig,
    shared: Arc<Shared>,
}

impl SyncManager {
    /// Creates a manager over an injected datastore handle.
    pub fn new(store: Arc<dyn SubmissionStore>, config: SyncConfig) -> Self {
        let shared = Shared {
            canonical: RwLock::new(Canonical {
                records: SubmissionCollection::new(),
                journal: Vec::new(),
                loads_in_flight: 0,
            }),
            applicator: ChangeApplicator::new(config.insert_ordering),
            flags: Arc::new(BusyFlags::new()),
            errors: ErrorSlot::new(Duration::from_millis(config.error_ttl_ms)),
            closed: AtomicBool::new(false),
        };
        Self {
            store,
            config,
            shared: Arc::new(shared),
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// The injected datastore handle.
    pub fn store(&self) -> &Arc<dyn SubmissionStore> {
        &self.store
    }

    // ── Remote operations ────────────────────────────────────────

    /// Fetches every record and replaces the collection with them.
    ///
    /// On failure the collection is left untouched and the error is
    /// recorded and returned.
    pub async fn load_initial(&self) -> SyncResult<LoadOutcome> {
        let _busy = self.shared.flags.enter(Operation::Fetching);
        let journal_start = self.shared.begin_load();
        info!("Loading submissions");

        match self.store.query(&RemoteQuery::all()).await {
            Ok(records) => {
                let outcome = self.shared.finish_load(journal_start, records);
                match outcome {
                    LoadOutcome::Applied { records, replayed } => {
                        info!("Loaded {} submissions ({} live events replayed)", records, replayed);
                    }
                    LoadOutcome::Discarded => {
                        warn!("Discarding submissions loaded after close");
                    }
                }
                Ok(outcome)
            }
            Err(e) => {
                self.shared.abandon_load();
                warn!("Failed to fetch submissions: {}", e);
                self.record_error(format!("failed to fetch submissions: {e}"));
                Err(e)
            }
        }
    }

    /// Runs a filtered fetch without touching the collection.
    pub async fn fetch(&self, query: &RemoteQuery) -> SyncResult<Vec<SubmissionRecord>> {
        let _busy = self.shared.flags.enter(Operation::Fetching);
        self.store.query(query).await.inspect_err(|e| {
            warn!("Failed to fetch submissions: {}", e);
            self.record_error(format!("failed to fetch submissions: {e}"));
        })
    }

    /// Stores a new submission. The operator side sees it through the
    /// change feed.
    pub async fn add_submission(&self, payload: SubmissionPayload) -> SyncResult<SubmissionRecord> {
        let _busy = self.shared.flags.enter(Operation::Adding);
        match self.store.insert(payload).await {
            Ok(record) => {
                debug!("Stored submission {} ({})", record.id, record.variant);
                Ok(record)
            }
            Err(e) => {
                error!("Error adding submission: {}", e);
                self.record_error(format!("failed to add submission: {e}"));
                Err(e)
            }
        }
    }

    /// Opens the live change feed.
    ///
    /// Each event is applied to the collection, then handed to
    /// `on_change`. Dropping the returned handle closes the feed.
    pub async fn subscribe<F>(&self, on_change: F) -> SyncResult<SubscriptionHandle>
    where
        F: Fn(&ChangeEvent) + Send + Sync + 'static,
    {
        let _busy = self.shared.flags.enter(Operation::Subscribing);
        let ChangeFeed { id, mut events } = match self.store.subscribe(&self.config.table).await {
            Ok(feed) => feed,
            Err(e) => {
                warn!("Error subscribing to submissions: {}", e);
                self.record_error(format!("failed to subscribe to real-time updates: {e}"));
                return Err(e);
            }
        };
        info!("Subscribed to {} on {}", self.config.table, id);

        let shared = Arc::clone(&self.shared);
        let task = tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                if shared.apply_event(&event).is_none() {
                    debug!("Manager closed; stopping {}", id);
                    break;
                }
                on_change(&event);
            }
            debug!("Change feed {} ended", id);
        });

        Ok(SubscriptionHandle {
            feed: id,
            store: Arc::clone(&self.store),
            task,
            active: AtomicBool::new(true),
        })
    }

    // ── Local state ──────────────────────────────────────────────

    /// Applies one change event directly, as the feed would.
    /// Returns `None` once the manager is closed.
    pub fn apply_event(&self, event: &ChangeEvent) -> Option<Applied> {
        self.shared.apply_event(event)
    }

    /// Owned copy of the collection in its current order.
    pub fn snapshot(&self) -> Vec<SubmissionRecord> {
        self.shared.read().records.snapshot()
    }

    pub fn len(&self) -> usize {
        self.shared.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.read().records.is_empty()
    }

    pub fn get(&self, id: &SubmissionId) -> Option<SubmissionRecord> {
        self.shared.read().records.get(id).cloned()
    }

    pub fn loading(&self) -> LoadingStates {
        self.shared.flags.snapshot()
    }

    /// The most recent error, until it expires.
    pub fn last_error(&self) -> Option<String> {
        self.shared.errors.current()
    }

    /// Stops applying late results: in-flight loads are discarded and the
    /// feed stops delivering.
    pub fn close(&self) {
        if !self.shared.closed.swap(true, Ordering::SeqCst) {
            info!("Sync manager closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.shared.is_closed()
    }

    // ── Crate-internal hooks for the mutation coordinator ────────

    pub(crate) fn flags(&self) -> &Arc<BusyFlags> {
        &self.shared.flags
    }

    pub(crate) fn record_error(&self, message: impl Into<String>) {
        self.shared.errors.record(message);
    }

    /// Sets the flag locally. Returns the previous value, `None` if unknown.
    pub(crate) fn set_revealed_local(&self, id: &SubmissionId, revealed: bool) -> Option<bool> {
        self.shared.write().set_revealed(id, revealed)
    }

    /// Sets the flag on every known id. Returns how many were found.
    pub(crate) fn set_revealed_many(&self, ids: &[SubmissionId], revealed: bool) -> usize {
        let mut canonical = self.shared.write();
        ids.iter()
            .filter(|id| canonical.set_revealed(id, revealed).is_some())
            .count()
    }

    /// Restores `previous` only if the record still holds `optimistic`.
    pub(crate) fn restore_revealed(
        &self,
        id: &SubmissionId,
        optimistic: bool,
        previous: bool,
    ) -> bool {
        let mut canonical = self.shared.write();
        let untouched = canonical
            .records
            .get(id)
            .is_some_and(|record| record.revealed == optimistic);
        if untouched {
            canonical.set_revealed(id, previous);
        }
        untouched
    }
}

/// Teardown handle for a live subscription.
///
/// `unsubscribe` is idempotent and also runs on drop.
pub struct SubscriptionHandle {
    feed: FeedId,
    store: Arc<dyn SubmissionStore>,
    task: JoinHandle<()>,
    active: AtomicBool,
}

impl SubscriptionHandle {
    pub fn feed_id(&self) -> FeedId {
        self.feed
    }

    /// Returns true until unsubscribed or the feed ends.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst) && !self.task.is_finished()
    }

    /// Closes the feed and stops delivery.
    pub fn unsubscribe(&self) {
        if self.active.swap(false, Ordering::SeqCst) {
            self.task.abort();
            self.store.unsubscribe(self.feed);
            info!("Unsubscribed from {}", self.feed);
        }
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}
