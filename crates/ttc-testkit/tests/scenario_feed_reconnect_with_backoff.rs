//! Scenario: the merger loop survives subscribe failures.
//!
//! A refused subscription falls into the backoff path and is retried;
//! once subscribed, the initial re-fetch covers anything written while
//! disconnected, and later notifications keep driving refreshes until
//! shutdown.

use std::time::Duration;

use tokio::sync::oneshot;
use ttc_schemas::TriageCategory;
use ttc_sync::{BackoffPolicy, SyncMerger, TransportRoster};
use ttc_status::SeverityTable;
use ttc_testkit::{init_test_logging, tag_assigned, MemoryTagStore};

fn fast_backoff() -> BackoffPolicy {
    BackoffPolicy {
        initial: Duration::from_millis(10),
        max: Duration::from_millis(50),
    }
}

fn merger(store: &MemoryTagStore, backoff: BackoffPolicy) -> SyncMerger<MemoryTagStore, MemoryTagStore> {
    let roster = TransportRoster::new(SeverityTable::default(), chrono::Duration::seconds(2));
    SyncMerger::new(store.clone(), store.clone(), roster, backoff)
}

#[tokio::test]
async fn resubscribe_after_refusal_catches_up_on_missed_writes() {
    init_test_logging();
    let store = MemoryTagStore::new();

    // Written while the feed is still down.
    let tag = tag_assigned("T-2025-001", "ANON-000001", TriageCategory::Red, "Alpha");
    store.insert(tag.clone());
    store.fail_subscribes(1);

    let (tx, rx) = oneshot::channel::<()>();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(150)).await;
        let _ = tx.send(());
    });

    let mut merger = merger(&store, fast_backoff());
    merger.run(async {
        let _ = rx.await;
    })
    .await;

    // The first subscribe was refused; the retry succeeded and the
    // initial fetch picked up the pre-existing row.
    let ids: Vec<_> = merger.roster().visible().iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![tag.id]);
}

#[tokio::test]
async fn notification_during_run_refreshes_the_roster() {
    init_test_logging();
    let store = MemoryTagStore::new();
    let tag = tag_assigned("T-2025-002", "ANON-000002", TriageCategory::Yellow, "Bravo");

    let (tx, rx) = oneshot::channel::<()>();
    let writer = store.clone();
    let late = tag.clone();
    tokio::spawn(async move {
        // Land the write after the merger has subscribed; the insert
        // broadcasts the event that triggers the re-fetch.
        tokio::time::sleep(Duration::from_millis(50)).await;
        writer.insert(late);
        tokio::time::sleep(Duration::from_millis(50)).await;
        let _ = tx.send(());
    });

    let mut merger = merger(&store, fast_backoff());
    merger.run(async {
        let _ = rx.await;
    })
    .await;

    assert_eq!(merger.roster().visible().len(), 1);
    assert_eq!(merger.roster().get(&tag.id).map(|t| t.id), Some(tag.id));
}

#[tokio::test]
async fn shutdown_interrupts_a_long_backoff_wait() {
    init_test_logging();
    let store = MemoryTagStore::new();
    store.fail_subscribes(u32::MAX);

    let (tx, rx) = oneshot::channel::<()>();
    let _ = tx.send(());

    let slow = BackoffPolicy {
        initial: Duration::from_secs(60),
        max: Duration::from_secs(60),
    };
    let mut merger = merger(&store, slow);

    // Must return promptly instead of sleeping out the backoff.
    tokio::time::timeout(Duration::from_secs(1), merger.run(async {
        let _ = rx.await;
    }))
    .await
    .unwrap();
}
