use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use phishguard_sync::memory::MemoryStore;
use phishguard_sync::{
    Applied, InsertOrdering, LoadOutcome, MutationCoordinator, RemoteQuery, SubmissionStore,
    SyncConfig, SyncError, SyncManager,
};
use phishguard_types::{
    ChangeEvent, SubmissionId, SubmissionPatch, SubmissionPayload, SubmissionRecord, Variant,
};
use pretty_assertions::assert_eq;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn make_record(email: &str, minutes: i64) -> SubmissionRecord {
    SubmissionRecord {
        id: SubmissionId::new(),
        email: email.to_string(),
        variant: Variant::A,
        location_tag: Some("Lobby".into()),
        ip_address: None,
        user_agent: None,
        timestamp: Utc.with_ymd_and_hms(2025, 5, 20, 10, 0, 0).unwrap()
            + ChronoDuration::minutes(minutes),
        revealed: false,
    }
}

fn payload(email: &str) -> SubmissionPayload {
    SubmissionPayload {
        email: email.to_string(),
        variant: Variant::B,
        location_tag: None,
        ip_address: None,
        user_agent: None,
    }
}

fn make_manager(store: &Arc<MemoryStore>) -> SyncManager {
    SyncManager::new(store.clone(), SyncConfig::default())
}

async fn eventually(mut condition: impl FnMut() -> bool) {
    for _ in 0..400 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached in time");
}

// ── Config ───────────────────────────────────────────────────────

#[test]
fn default_config() {
    let config = SyncConfig::default();
    assert_eq!(config.table, "phishing_submissions");
    assert_eq!(config.insert_ordering, InsertOrdering::Arrival);
    assert_eq!(config.error_ttl_ms, 5_000);
    assert!(config.reveal_policy.rollback_on_failure);
}

#[test]
fn config_deserializes_partial_json() {
    let config: SyncConfig =
        serde_json::from_str(r#"{"insert_ordering":"timestamp","error_ttl_ms":1000}"#).unwrap();
    assert_eq!(config.insert_ordering, InsertOrdering::Timestamp);
    assert_eq!(config.error_ttl_ms, 1000);
    assert_eq!(config.table, "phishing_submissions");
}

// ── Initial load ─────────────────────────────────────────────────

#[tokio::test]
async fn load_initial_populates_newest_first() {
    init_tracing();
    let store = Arc::new(MemoryStore::with_records(vec![
        make_record("old@x.io", 0),
        make_record("new@x.io", 30),
    ]));
    let sync = make_manager(&store);

    let outcome = sync.load_initial().await.unwrap();

    assert_eq!(outcome, LoadOutcome::Applied { records: 2, replayed: 0 });
    let emails: Vec<_> = sync.snapshot().into_iter().map(|r| r.email).collect();
    assert_eq!(emails, vec!["new@x.io", "old@x.io"]);
    assert!(!sync.loading().fetching);
}

#[tokio::test]
async fn load_failure_leaves_collection_untouched() {
    let store = Arc::new(MemoryStore::with_records(vec![make_record("a@x.io", 0)]));
    let sync = make_manager(&store);
    sync.load_initial().await.unwrap();

    store.seed(vec![make_record("b@x.io", 5)]);
    store.fail_queries("connection refused");
    let err = sync.load_initial().await.unwrap_err();

    assert!(matches!(err, SyncError::Network(_)));
    assert_eq!(sync.len(), 1);
    assert!(sync.last_error().unwrap().contains("connection refused"));
    assert!(!sync.loading().fetching);
}

#[tokio::test]
async fn fetching_flag_raised_while_load_in_flight() {
    let store = Arc::new(MemoryStore::with_records(vec![make_record("a@x.io", 0)]));
    let sync = make_manager(&store);
    store.pause_queries();

    let load = tokio::spawn({
        let sync = sync.clone();
        async move { sync.load_initial().await }
    });
    eventually(|| store.pending_queries() == 1).await;
    assert!(sync.loading().fetching);
    assert!(!sync.loading().adding);

    store.resume_queries();
    load.await.unwrap().unwrap();
    assert!(!sync.loading().any());
}

#[tokio::test]
async fn fetch_runs_filtered_query_without_touching_collection() {
    let store = Arc::new(MemoryStore::new());
    let mut b = make_record("b@x.io", 1);
    b.variant = Variant::B;
    store.seed(vec![make_record("a@x.io", 0), b]);
    let sync = make_manager(&store);

    let rows = sync
        .fetch(&RemoteQuery { variant: Some(Variant::B), ..Default::default() })
        .await
        .unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].email, "b@x.io");
    assert!(sync.is_empty());
}

// ── Live feed ────────────────────────────────────────────────────

#[tokio::test]
async fn feed_inserts_reach_collection_and_callback() {
    let store = Arc::new(MemoryStore::new());
    let sync = make_manager(&store);
    let seen = Arc::new(AtomicUsize::new(0));

    let handle = sync
        .subscribe({
            let seen = seen.clone();
            move |_event: &ChangeEvent| {
                seen.fetch_add(1, Ordering::SeqCst);
            }
        })
        .await
        .unwrap();
    assert!(handle.is_active());
    assert!(!sync.loading().subscribing);

    let record = sync.add_submission(payload("visitor@x.io")).await.unwrap();

    eventually(|| sync.len() == 1).await;
    assert_eq!(sync.get(&record.id).unwrap().email, "visitor@x.io");
    eventually(|| seen.load(Ordering::SeqCst) == 1).await;
}

#[tokio::test]
async fn duplicate_insert_event_keeps_one_record() {
    let record = make_record("a@x.io", 0);
    let store = Arc::new(MemoryStore::with_records(vec![record.clone()]));
    let sync = make_manager(&store);
    let _handle = sync.subscribe(|_: &ChangeEvent| {}).await.unwrap();
    sync.load_initial().await.unwrap();

    let mut changed = record.clone();
    changed.revealed = true;
    store.emit(ChangeEvent::Insert(record.clone()));
    store.emit(ChangeEvent::Insert(changed));

    eventually(|| sync.get(&record.id).is_some_and(|r| r.revealed)).await;
    assert_eq!(sync.len(), 1);
}

#[tokio::test]
async fn feed_updates_and_deletes_apply() {
    let a = make_record("a@x.io", 0);
    let b = make_record("b@x.io", 1);
    let store = Arc::new(MemoryStore::with_records(vec![a.clone(), b.clone()]));
    let sync = make_manager(&store);
    let _handle = sync.subscribe(|_: &ChangeEvent| {}).await.unwrap();
    sync.load_initial().await.unwrap();

    let mut revealed = a.clone();
    revealed.revealed = true;
    store.emit(ChangeEvent::Update(revealed));
    store.delete(b.id);
    store.emit(ChangeEvent::Delete { id: SubmissionId::new() });

    eventually(|| sync.len() == 1).await;
    eventually(|| sync.get(&a.id).is_some_and(|r| r.revealed)).await;
}

#[tokio::test]
async fn insert_during_load_is_not_lost() {
    let store = Arc::new(MemoryStore::with_records(vec![make_record("seed@x.io", 0)]));
    let sync = make_manager(&store);
    let _handle = sync.subscribe(|_: &ChangeEvent| {}).await.unwrap();

    // The held query already snapshotted the table without the new row.
    store.pause_queries();
    let load = tokio::spawn({
        let sync = sync.clone();
        async move { sync.load_initial().await }
    });
    eventually(|| store.pending_queries() == 1).await;

    let fresh = sync.add_submission(payload("fresh@x.io")).await.unwrap();
    eventually(|| sync.get(&fresh.id).is_some()).await;

    store.resume_queries();
    let outcome = load.await.unwrap().unwrap();

    assert_eq!(outcome, LoadOutcome::Applied { records: 2, replayed: 1 });
    assert!(sync.get(&fresh.id).is_some());
    assert_eq!(sync.len(), 2);
}

#[tokio::test]
async fn delete_during_load_is_not_resurrected() {
    let a = make_record("a@x.io", 0);
    let b = make_record("b@x.io", 1);
    let store = Arc::new(MemoryStore::with_records(vec![a.clone(), b.clone()]));
    let sync = make_manager(&store);
    let _handle = sync.subscribe(|_: &ChangeEvent| {}).await.unwrap();
    sync.load_initial().await.unwrap();

    // The held query has already captured both rows.
    store.pause_queries();
    let load = tokio::spawn({
        let sync = sync.clone();
        async move { sync.load_initial().await }
    });
    eventually(|| store.pending_queries() == 1).await;

    assert!(store.delete(b.id));
    eventually(|| sync.get(&b.id).is_none()).await;

    store.resume_queries();
    let outcome = load.await.unwrap().unwrap();

    assert_eq!(outcome, LoadOutcome::Applied { records: 1, replayed: 1 });
    assert!(sync.get(&b.id).is_none());
    assert!(sync.get(&a.id).is_some());
}

#[tokio::test]
async fn update_during_load_is_not_reverted() {
    let a = make_record("a@x.io", 0);
    let store = Arc::new(MemoryStore::with_records(vec![a.clone()]));
    let sync = make_manager(&store);
    let _handle = sync.subscribe(|_: &ChangeEvent| {}).await.unwrap();
    sync.load_initial().await.unwrap();

    store.pause_queries();
    let load = tokio::spawn({
        let sync = sync.clone();
        async move { sync.load_initial().await }
    });
    eventually(|| store.pending_queries() == 1).await;

    store.update(a.id, SubmissionPatch::revealed(true)).await.unwrap();
    eventually(|| sync.get(&a.id).is_some_and(|r| r.revealed)).await;

    store.resume_queries();
    let outcome = load.await.unwrap().unwrap();

    assert_eq!(outcome, LoadOutcome::Applied { records: 1, replayed: 1 });
    assert!(sync.get(&a.id).unwrap().revealed);
}

#[tokio::test]
async fn reveal_toggled_during_load_survives_stale_snapshot() {
    let a = make_record("a@x.io", 0);
    let store = Arc::new(MemoryStore::with_records(vec![a.clone()]));
    let sync = make_manager(&store);
    sync.load_initial().await.unwrap();
    let coordinator = MutationCoordinator::new(sync.clone());

    // No live feed: nothing but the journal can carry the edit across the load.
    store.pause_queries();
    let load = tokio::spawn({
        let sync = sync.clone();
        async move { sync.load_initial().await }
    });
    eventually(|| store.pending_queries() == 1).await;

    coordinator.toggle_reveal(a.id, true).await.unwrap();
    assert!(store.row(a.id).unwrap().revealed);

    store.resume_queries();
    let outcome = load.await.unwrap().unwrap();

    assert_eq!(outcome, LoadOutcome::Applied { records: 1, replayed: 1 });
    assert!(sync.get(&a.id).unwrap().revealed);
}

#[tokio::test]
async fn edits_before_load_started_are_not_replayed() {
    let a = make_record("a@x.io", 0);
    let store = Arc::new(MemoryStore::with_records(vec![a.clone()]));
    let sync = make_manager(&store);
    let coordinator = MutationCoordinator::new(sync.clone());
    sync.load_initial().await.unwrap();

    coordinator.toggle_reveal(a.id, true).await.unwrap();
    let outcome = sync.load_initial().await.unwrap();

    assert_eq!(outcome, LoadOutcome::Applied { records: 1, replayed: 0 });
    assert!(sync.get(&a.id).unwrap().revealed);
}

#[tokio::test]
async fn insert_before_load_is_not_duplicated() {
    let store = Arc::new(MemoryStore::new());
    let sync = make_manager(&store);
    let _handle = sync.subscribe(|_: &ChangeEvent| {}).await.unwrap();

    let record = sync.add_submission(payload("early@x.io")).await.unwrap();
    eventually(|| sync.len() == 1).await;

    sync.load_initial().await.unwrap();
    assert_eq!(sync.len(), 1);
    assert!(sync.get(&record.id).is_some());
}

#[tokio::test]
async fn subscribe_failure_is_recorded() {
    let store = Arc::new(MemoryStore::new());
    store.fail_subscribe("realtime disabled");
    let sync = make_manager(&store);

    assert!(sync.subscribe(|_: &ChangeEvent| {}).await.is_err());
    assert!(sync.last_error().unwrap().contains("real-time"));
    assert!(!sync.loading().subscribing);
}

// ── Teardown ─────────────────────────────────────────────────────

#[tokio::test]
async fn unsubscribe_is_idempotent() {
    let store = Arc::new(MemoryStore::new());
    let sync = make_manager(&store);
    let handle = sync.subscribe(|_: &ChangeEvent| {}).await.unwrap();
    assert_eq!(store.open_feeds(), 1);

    handle.unsubscribe();
    handle.unsubscribe();

    assert!(!handle.is_active());
    assert_eq!(store.open_feeds(), 0);

    sync.add_submission(payload("after@x.io")).await.unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(sync.is_empty());
}

#[tokio::test]
async fn dropping_handle_unsubscribes() {
    let store = Arc::new(MemoryStore::new());
    let sync = make_manager(&store);
    let handle = sync.subscribe(|_: &ChangeEvent| {}).await.unwrap();
    let feed = handle.feed_id();

    drop(handle);

    assert_eq!(store.open_feeds(), 0);
    assert_eq!(feed.to_string(), "feed-1");
}

#[tokio::test]
async fn load_completing_after_close_is_discarded() {
    let store = Arc::new(MemoryStore::with_records(vec![make_record("a@x.io", 0)]));
    let sync = make_manager(&store);
    store.pause_queries();

    let load = tokio::spawn({
        let sync = sync.clone();
        async move { sync.load_initial().await }
    });
    eventually(|| store.pending_queries() == 1).await;

    sync.close();
    store.resume_queries();

    assert_eq!(load.await.unwrap().unwrap(), LoadOutcome::Discarded);
    assert!(sync.is_empty());
    assert!(sync.is_closed());
}

#[tokio::test]
async fn closed_manager_ignores_events() {
    let store = Arc::new(MemoryStore::new());
    let sync = make_manager(&store);

    let record = make_record("a@x.io", 0);
    assert_eq!(sync.apply_event(&ChangeEvent::Insert(record.clone())), Some(Applied::Inserted));

    sync.close();
    assert_eq!(sync.apply_event(&ChangeEvent::Delete { id: record.id }), None);
    assert_eq!(sync.len(), 1);
}

// ── Intake ───────────────────────────────────────────────────────

#[tokio::test]
async fn add_submission_failure_is_recorded() {
    let store = Arc::new(MemoryStore::new());
    store.fail_inserts("quota exceeded");
    let sync = make_manager(&store);

    let err = sync.add_submission(payload("a@x.io")).await.unwrap_err();

    assert!(matches!(err, SyncError::Network(_)));
    assert!(sync.last_error().unwrap().contains("failed to add submission"));
    assert!(!sync.loading().adding);
    assert!(store.rows().is_empty());
}

#[tokio::test(start_paused = true)]
async fn last_error_expires() {
    let store = Arc::new(MemoryStore::new());
    store.fail_queries("boom");
    let sync = make_manager(&store);

    assert!(sync.load_initial().await.is_err());
    assert!(sync.last_error().is_some());

    tokio::time::advance(Duration::from_millis(5_001)).await;
    assert!(sync.last_error().is_none());
}
