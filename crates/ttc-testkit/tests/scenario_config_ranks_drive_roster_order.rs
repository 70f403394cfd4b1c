//! Scenario: operator config flows through to the live roster.
//!
//! The severity rank table is configuration, not code: a loaded YAML
//! file must produce the ordering it declares, including one that
//! disagrees with the built-in default.

use std::io::Write;
use std::time::Duration;

use ttc_schemas::TriageCategory;
use ttc_status::SeverityTable;
use ttc_sync::{BackoffPolicy, SyncMerger, TransportRoster};
use ttc_testkit::{init_test_logging, tag_assigned, ts0, MemoryTagStore};
use uuid::Uuid;

fn write_config(yaml: &str) -> tempfile::NamedTempFile {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    f.write_all(yaml.as_bytes()).unwrap();
    f
}

#[tokio::test]
async fn loaded_ranks_override_default_roster_order() {
    init_test_logging();
    // An exercise profile that moves green ahead of yellow.
    let f = write_config(
        "severity_ranks: { red: 0, green: 1, yellow: 2, black: 3 }\n\
         transport_teams: [Alpha]\n\
         indicator_window_ms: 1000\n\
         reconnect: { initial_backoff_ms: 100, max_backoff_ms: 5000 }\n",
    );
    let loaded = ttc_config::load(f.path()).unwrap();
    let table = loaded.config.severity_table();
    assert_ne!(table, SeverityTable::default());

    let store = MemoryTagStore::new();
    let red = tag_assigned("T-2025-001", "ANON-000001", TriageCategory::Red, "Alpha");
    // Yellow is the oldest row; under the default table FIFO within the
    // default ranks would show it ahead of green.
    let mut yellow = tag_assigned("T-2025-002", "ANON-000002", TriageCategory::Yellow, "Alpha");
    yellow.created_at = ts0();
    let mut green = tag_assigned("T-2025-003", "ANON-000003", TriageCategory::Green, "Alpha");
    green.created_at = ts0() + chrono::Duration::minutes(10);
    for tag in [&red, &yellow, &green] {
        store.insert(tag.clone());
    }

    let roster = TransportRoster::new(
        table,
        chrono::Duration::milliseconds(loaded.config.indicator_window_ms as i64),
    );
    let backoff = BackoffPolicy {
        initial: Duration::from_millis(loaded.config.reconnect.initial_backoff_ms),
        max: Duration::from_millis(loaded.config.reconnect.max_backoff_ms),
    };
    let mut merger = SyncMerger::new(store.clone(), store.clone(), roster, backoff);
    merger.refresh().await.unwrap();

    // Configured rank wins over both the default table and FIFO age.
    let ids: Vec<Uuid> = merger.roster().visible().iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![red.id, green.id, yellow.id]);
}

#[tokio::test]
async fn defaulted_config_reproduces_transport_priority() {
    init_test_logging();
    let f = write_config("transport_teams: [Alpha, Bravo]\n");
    let loaded = ttc_config::load(f.path()).unwrap();
    assert_eq!(loaded.config.severity_table(), SeverityTable::default());

    let store = MemoryTagStore::new();
    let black = tag_assigned("T-2025-001", "ANON-000001", TriageCategory::Black, "Alpha");
    let red = tag_assigned("T-2025-002", "ANON-000002", TriageCategory::Red, "Bravo");
    store.insert(black.clone());
    store.insert(red.clone());

    let roster = TransportRoster::new(
        loaded.config.severity_table(),
        chrono::Duration::milliseconds(loaded.config.indicator_window_ms as i64),
    );
    let mut merger = SyncMerger::new(
        store.clone(),
        store.clone(),
        roster,
        BackoffPolicy::default(),
    );
    merger.refresh().await.unwrap();

    let ids: Vec<Uuid> = merger.roster().visible().iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![red.id, black.id], "red outranks black");
}
