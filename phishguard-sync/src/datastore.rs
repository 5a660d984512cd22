//! Remote datastore abstraction.
//!
//! The sync manager and the mutation coordinator talk to the submissions
//! table only through [`SubmissionStore`], so any backend (a hosted
//! Postgres with a realtime channel, a test double, ...) can be injected at
//! construction time.

use crate::error::SyncResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use phishguard_types::{
    ChangeEvent, SubmissionId, SubmissionPatch, SubmissionPayload, SubmissionRecord, Variant,
};
use std::fmt;
use tokio::sync::mpsc;

/// Table scope the change feed is opened on.
pub const SUBMISSIONS_TABLE: &str = "phishing_submissions";

/// Page size used when a query gives an offset but no limit.
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Server-side filters for a fetch. Results are always ordered by
/// timestamp, newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteQuery {
    pub variant: Option<Variant>,
    /// Inclusive lower bound on `timestamp`.
    pub start: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `timestamp`.
    pub end: Option<DateTime<Utc>>,
    pub location_tag: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl RemoteQuery {
    /// Every record, newest first.
    pub fn all() -> Self {
        Self::default()
    }

    /// Resolves limit/offset into `(skip, take)`.
    ///
    /// An offset without a limit takes [`DEFAULT_PAGE_SIZE`] rows; neither
    /// means "everything".
    pub fn window(&self) -> (usize, Option<usize>) {
        match (self.offset, self.limit) {
            (Some(offset), limit) => (offset, Some(limit.unwrap_or(DEFAULT_PAGE_SIZE))),
            (None, limit) => (0, limit),
        }
    }

    /// Returns true if `record` passes the non-paging filters.
    pub fn matches(&self, record: &SubmissionRecord) -> bool {
        self.variant.is_none_or(|v| record.variant == v)
            && self.start.is_none_or(|start| record.timestamp >= start)
            && self.end.is_none_or(|end| record.timestamp <= end)
            && self
                .location_tag
                .as_deref()
                .is_none_or(|tag| record.location_tag.as_deref() == Some(tag))
    }
}

/// Identifies one open change feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FeedId(pub u64);

impl fmt::Display for FeedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "feed-{}", self.0)
    }
}

/// An open live channel. Events arrive in datastore commit order.
#[derive(Debug)]
pub struct ChangeFeed {
    pub id: FeedId,
    pub events: mpsc::UnboundedReceiver<ChangeEvent>,
}

/// The remote datastore contract.
#[async_trait]
pub trait SubmissionStore: Send + Sync {
    /// Inserts a submission; the store assigns id and timestamp.
    async fn insert(&self, payload: SubmissionPayload) -> SyncResult<SubmissionRecord>;

    /// Updates the fields set in `patch` on one record.
    async fn update(&self, id: SubmissionId, patch: SubmissionPatch) -> SyncResult<()>;

    /// Applies the same patch to many records in one batch.
    async fn bulk_update(&self, ids: &[SubmissionId], patch: SubmissionPatch) -> SyncResult<()>;

    /// Fetches records matching `query`, newest first.
    async fn query(&self, query: &RemoteQuery) -> SyncResult<Vec<SubmissionRecord>>;

    /// Opens a live change feed on `scope`.
    async fn subscribe(&self, scope: &str) -> SyncResult<ChangeFeed>;

    /// Closes a feed. Unknown or already-closed feeds are ignored.
    fn unsubscribe(&self, feed: FeedId);
}

/// An in-process datastore for tests and embedding.
pub mod memory {
    use super::*;
    use crate::error::SyncError;
    use std::collections::{HashMap, HashSet};
    use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
    use std::sync::{Mutex, MutexGuard, PoisonError};
    use tokio::sync::watch;
    use tracing::debug;

    fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
        mutex.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Holds callers until opened. Used to keep a request in flight.
    #[derive(Debug)]
    struct Gate {
        open: watch::Sender<bool>,
        waiting: AtomicUsize,
    }

    impl Gate {
        fn new() -> Self {
            Self {
                open: watch::Sender::new(true),
                waiting: AtomicUsize::new(0),
            }
        }

        async fn pass(&self) {
            let mut rx = self.open.subscribe();
            if *rx.borrow() {
                return;
            }
            self.waiting.fetch_add(1, Ordering::SeqCst);
            // The sender lives as long as the store, so this only errors on drop.
            let _ = rx.wait_for(|open| *open).await;
            self.waiting.fetch_sub(1, Ordering::SeqCst);
        }

        fn set(&self, open: bool) {
            self.open.send_replace(open);
        }

        fn waiting(&self) -> usize {
            self.waiting.load(Ordering::SeqCst)
        }
    }

    /// Injected failures.
    #[derive(Debug, Default)]
    struct Faults {
        query: Option<String>,
        subscribe: Option<String>,
        insert: Option<String>,
        /// Number of upcoming single updates that fail.
        updates: usize,
        bulk: Option<String>,
        rejected_ids: HashSet<SubmissionId>,
    }

    /// A datastore held entirely in memory.
    ///
    /// Writes emit change events to every open feed, the way a realtime
    /// table subscription would.
    #[derive(Debug)]
    pub struct MemoryStore {
        rows: Mutex<Vec<SubmissionRecord>>,
        feeds: Mutex<HashMap<FeedId, mpsc::UnboundedSender<ChangeEvent>>>,
        next_feed: AtomicU64,
        faults: Mutex<Faults>,
        query_gate: Gate,
        write_gate: Gate,
        queries: AtomicUsize,
        updates: AtomicUsize,
        bulk_updates: AtomicUsize,
    }

    impl Default for MemoryStore {
        fn default() -> Self {
            Self::new()
        }
    }

    impl MemoryStore {
        /// Creates an empty store.
        pub fn new() -> Self {
            Self {
                rows: Mutex::new(Vec::new()),
                feeds: Mutex::new(HashMap::new()),
                next_feed: AtomicU64::new(1),
                faults: Mutex::new(Faults::default()),
                query_gate: Gate::new(),
                write_gate: Gate::new(),
                queries: AtomicUsize::new(0),
                updates: AtomicUsize::new(0),
                bulk_updates: AtomicUsize::new(0),
            }
        }

        /// Creates a store pre-populated with `records`.
        pub fn with_records(records: impl IntoIterator<Item = SubmissionRecord>) -> Self {
            let store = Self::new();
            lock(&store.rows).extend(records);
            store
        }

        /// Adds rows without emitting events.
        pub fn seed(&self, records: impl IntoIterator<Item = SubmissionRecord>) {
            lock(&self.rows).extend(records);
        }

        /// Current rows, in insertion order.
        pub fn rows(&self) -> Vec<SubmissionRecord> {
            lock(&self.rows).clone()
        }

        /// Looks up one row.
        pub fn row(&self, id: SubmissionId) -> Option<SubmissionRecord> {
            lock(&self.rows).iter().find(|r| r.id == id).cloned()
        }

        /// Removes a row and emits a delete event.
        pub fn delete(&self, id: SubmissionId) -> bool {
            let removed = {
                let mut rows = lock(&self.rows);
                let before = rows.len();
                rows.retain(|r| r.id != id);
                rows.len() != before
            };
            if removed {
                self.emit(ChangeEvent::Delete { id });
            }
            removed
        }

        /// Pushes a raw event to every open feed without touching rows.
        pub fn emit(&self, event: ChangeEvent) {
            let mut feeds = lock(&self.feeds);
            feeds.retain(|id, tx| {
                let delivered = tx.send(event.clone()).is_ok();
                if !delivered {
                    debug!("Dropping closed {}", id);
                }
                delivered
            });
        }

        /// Number of open feeds.
        pub fn open_feeds(&self) -> usize {
            lock(&self.feeds).len()
        }

        /// Number of `query` calls served or attempted.
        pub fn query_count(&self) -> usize {
            self.queries.load(Ordering::SeqCst)
        }

        /// Number of single `update` calls attempted.
        pub fn update_count(&self) -> usize {
            self.updates.load(Ordering::SeqCst)
        }

        /// Number of `bulk_update` calls attempted.
        pub fn bulk_update_count(&self) -> usize {
            self.bulk_updates.load(Ordering::SeqCst)
        }

        pub fn fail_queries(&self, message: impl Into<String>) {
            lock(&self.faults).query = Some(message.into());
        }

        pub fn fail_subscribe(&self, message: impl Into<String>) {
            lock(&self.faults).subscribe = Some(message.into());
        }

        pub fn fail_inserts(&self, message: impl Into<String>) {
            lock(&self.faults).insert = Some(message.into());
        }

        /// Fails the next `count` single updates with a network error.
        pub fn fail_next_updates(&self, count: usize) {
            lock(&self.faults).updates = count;
        }

        pub fn fail_bulk_updates(&self, message: impl Into<String>) {
            lock(&self.faults).bulk = Some(message.into());
        }

        /// Rejects every write touching `id`.
        pub fn reject_writes_for(&self, id: SubmissionId) {
            lock(&self.faults).rejected_ids.insert(id);
        }

        /// Clears every injected failure.
        pub fn heal(&self) {
            *lock(&self.faults) = Faults::default();
        }

        /// Holds queries in flight until [`resume_queries`](Self::resume_queries).
        pub fn pause_queries(&self) {
            self.query_gate.set(false);
        }

        pub fn resume_queries(&self) {
            self.query_gate.set(true);
        }

        /// Queries currently held by the gate.
        pub fn pending_queries(&self) -> usize {
            self.query_gate.waiting()
        }

        /// Holds writes in flight until [`resume_writes`](Self::resume_writes).
        pub fn pause_writes(&self) {
            self.write_gate.set(false);
        }

        pub fn resume_writes(&self) {
            self.write_gate.set(true);
        }

        /// Writes currently held by the gate.
        pub fn pending_writes(&self) -> usize {
            self.write_gate.waiting()
        }

        fn apply_patch(&self, ids: &[SubmissionId], patch: SubmissionPatch) {
            let changed: Vec<SubmissionRecord> = {
                let mut rows = lock(&self.rows);
                rows.iter_mut()
                    .filter(|r| ids.contains(&r.id))
                    .filter_map(|r| r.apply_patch(&patch).then(|| r.clone()))
                    .collect()
            };
            for record in changed {
                self.emit(ChangeEvent::Update(record));
            }
        }
    }

    #[async_trait]
    impl SubmissionStore for MemoryStore {
        async fn insert(&self, payload: SubmissionPayload) -> SyncResult<SubmissionRecord> {
            self.write_gate.pass().await;
            if let Some(message) = lock(&self.faults).insert.clone() {
                return Err(SyncError::Network(message));
            }
            let record = SubmissionRecord::from_payload(SubmissionId::new(), Utc::now(), payload);
            lock(&self.rows).push(record.clone());
            self.emit(ChangeEvent::Insert(record.clone()));
            Ok(record)
        }

        async fn update(&self, id: SubmissionId, patch: SubmissionPatch) -> SyncResult<()> {
            self.updates.fetch_add(1, Ordering::SeqCst);
            self.write_gate.pass().await;
            {
                let mut faults = lock(&self.faults);
                if faults.rejected_ids.contains(&id) {
                    return Err(SyncError::Rejected(format!("update of {id} denied")));
                }
                if faults.updates > 0 {
                    faults.updates -= 1;
                    return Err(SyncError::Network("connection reset".into()));
                }
            }
            self.apply_patch(&[id], patch);
            Ok(())
        }

        async fn bulk_update(
            &self,
            ids: &[SubmissionId],
            patch: SubmissionPatch,
        ) -> SyncResult<()> {
            self.bulk_updates.fetch_add(1, Ordering::SeqCst);
            self.write_gate.pass().await;
            {
                let faults = lock(&self.faults);
                if let Some(message) = &faults.bulk {
                    return Err(SyncError::Network(message.clone()));
                }
                if let Some(id) = ids.iter().find(|id| faults.rejected_ids.contains(id)) {
                    return Err(SyncError::Rejected(format!("batch update of {id} denied")));
                }
            }
            self.apply_patch(ids, patch);
            Ok(())
        }

        async fn query(&self, query: &RemoteQuery) -> SyncResult<Vec<SubmissionRecord>> {
            self.queries.fetch_add(1, Ordering::SeqCst);
            // Snapshot before waiting so a held query returns stale data,
            // like a response already on the wire.
            let mut rows: Vec<SubmissionRecord> = lock(&self.rows)
                .iter()
                .filter(|r| query.matches(r))
                .cloned()
                .collect();
            self.query_gate.pass().await;
            if let Some(message) = lock(&self.faults).query.clone() {
                return Err(SyncError::Network(message));
            }
            rows.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
            let (skip, take) = query.window();
            Ok(rows
                .into_iter()
                .skip(skip)
                .take(take.unwrap_or(usize::MAX))
                .collect())
        }

        async fn subscribe(&self, scope: &str) -> SyncResult<ChangeFeed> {
            if let Some(message) = lock(&self.faults).subscribe.clone() {
                return Err(SyncError::Network(message));
            }
            let id = FeedId(self.next_feed.fetch_add(1, Ordering::SeqCst));
            let (tx, events) = mpsc::unbounded_channel();
            lock(&self.feeds).insert(id, tx);
            debug!("Opened {} on {}", id, scope);
            Ok(ChangeFeed { id, events })
        }

        fn unsubscribe(&self, feed: FeedId) {
            if lock(&self.feeds).remove(&feed).is_some() {
                debug!("Closed {}", feed);
            }
        }
    }
}
