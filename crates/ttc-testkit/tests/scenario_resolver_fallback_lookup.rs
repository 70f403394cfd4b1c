//! Scenario: identifier resolution against a populated store.
//!
//! Covers the lookup ladder end to end: structured payload decode,
//! primary id lookup, fallback by tag number / anonymous id, and the
//! admission checks the caller runs on the resolved tag.

use ttc_guard::{check_actionable, AdmissionError};
use ttc_resolve::{resolve, ResolveError};
use ttc_schemas::{LegStatus, TriageCategory};
use ttc_status::CanonicalStatus;
use ttc_testkit::{init_test_logging, tag_assigned, tag_unassigned, MemoryTagStore};

fn seeded_store() -> MemoryTagStore {
    let store = MemoryTagStore::new();
    store.insert(tag_assigned(
        "T-2025-001",
        "ANON-123456",
        TriageCategory::Red,
        "Alpha",
    ));
    store.insert(tag_unassigned(
        "T-2025-002",
        "ANON-777777",
        TriageCategory::Green,
    ));
    store
}

#[tokio::test]
async fn scanned_tag_number_resolves_via_fallback() {
    init_test_logging();
    let store = seeded_store();
    // No record has this as its id; exactly one has it as tag_number.
    let tag = resolve(&store, "T-2025-001").await.unwrap();
    assert_eq!(tag.tag_number, "T-2025-001");
    assert!(check_actionable(&tag).is_ok());
}

#[tokio::test]
async fn qr_payload_with_patient_id_resolves() {
    init_test_logging();
    let store = seeded_store();
    let tag = resolve(&store, r#"{"patient_id":"ANON-123456"}"#)
        .await
        .unwrap();
    assert_eq!(tag.anonymous_id, "ANON-123456");
}

#[tokio::test]
async fn uuid_scan_hits_primary_lookup() {
    init_test_logging();
    let store = seeded_store();
    let seeded = resolve(&store, "T-2025-001").await.unwrap();
    let again = resolve(&store, &seeded.id.to_string()).await.unwrap();
    assert_eq!(again.id, seeded.id);
}

#[tokio::test]
async fn unknown_token_is_not_found() {
    init_test_logging();
    let store = seeded_store();
    let err = resolve(&store, "T-9999-999").await.unwrap_err();
    assert_eq!(err, ResolveError::NotFound("T-9999-999".to_string()));
}

#[tokio::test]
async fn resolution_is_idempotent() {
    init_test_logging();
    let store = seeded_store();
    let first = resolve(&store, "ANON-123456").await.unwrap();
    let second = resolve(&store, "ANON-123456").await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn unassigned_tag_fails_admission_after_resolution() {
    init_test_logging();
    let store = seeded_store();
    let tag = resolve(&store, "T-2025-002").await.unwrap();
    assert_eq!(check_actionable(&tag), Err(AdmissionError::Unassigned));
}

#[tokio::test]
async fn terminal_tag_fails_admission_after_resolution() {
    init_test_logging();
    let store = MemoryTagStore::new();
    let mut tag = tag_assigned("T-2025-003", "ANON-000003", TriageCategory::Yellow, "Bravo");
    tag.transport.status = Some(LegStatus::Arrived);
    store.insert(tag);

    let resolved = resolve(&store, "T-2025-003").await.unwrap();
    assert_eq!(
        check_actionable(&resolved),
        Err(AdmissionError::AlreadyTerminal(CanonicalStatus::Arrived))
    );
}
