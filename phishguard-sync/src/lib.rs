//! Submission sync engine for PhishGuard.
//!
//! Keeps one canonical, id-unique collection of submission records in step
//! with a remote datastore.
//!
//! # Architecture
//!
//! ## Components
//!
//! - **Datastore**: the [`SubmissionStore`] contract plus an in-memory
//!   implementation
//! - **Collection**: ordered, id-unique record storage
//! - **Applicator**: applies change-feed events with upsert semantics
//! - **Engine**: initial load, live feed, snapshots and busy flags
//! - **Mutation**: optimistic reveal toggles and bulk reveal
//! - **IP lookup**: best-effort client address resolution for intake
//!
//! ## Sync Process
//!
//! 1. **Subscribe**: open the change feed for the submissions table
//! 2. **Load**: fetch every record, newest first
//! 3. **Merge**: replay feed events that arrived while the load was in flight
//! 4. **Follow**: apply each later event as it arrives
//!
//! # Example
//!
//! ```
//! use phishguard_sync::memory::MemoryStore;
//! use phishguard_sync::{SyncConfig, SyncManager};
//! use std::sync::Arc;
//!
//! let store = Arc::new(MemoryStore::new());
//! let sync = SyncManager::new(store, SyncConfig::default());
//! assert!(sync.is_empty());
//! ```

pub mod applicator;
pub mod collection;
pub mod datastore;
mod engine;
mod error;
pub mod ip;
pub mod mutation;
pub mod state;

pub use applicator::{Applied, ChangeApplicator, InsertOrdering};
pub use collection::{SubmissionCollection, UpsertOutcome};
pub use datastore::{
    memory, ChangeFeed, FeedId, RemoteQuery, SubmissionStore, DEFAULT_PAGE_SIZE,
    SUBMISSIONS_TABLE,
};
pub use engine::{LoadOutcome, SubscriptionHandle, SyncConfig, SyncManager};
pub use error::{SyncError, SyncResult};
pub use ip::{IpLookupConfig, IpResolver};
pub use mutation::{MutationCoordinator, RevealPolicy, Selection};
pub use state::{BusyFlags, BusyGuard, ErrorSlot, LoadingStates, Operation};
