//! Unit tests for the session tracker: session minting, continuation within
//! the inactivity timeout, expiry, and new-session detection against the
//! local store.

use chrono::Utc;

use visitrack::managers::local_store::LocalStore;
use visitrack::managers::session_tracker::{SessionTracker, SessionTrackerTrait};
use visitrack::storage::{MemoryStorage, StorageArea};

const TIMEOUT_MS: i64 = 30 * 60 * 1000;

/// Helper: ephemeral storage pre-seeded with a session descriptor whose
/// start time lies `age_ms` in the past.
fn seeded_storage(session_id: &str, age_ms: i64) -> MemoryStorage {
    let now = Utc::now().timestamp_millis();
    let descriptor = serde_json::json!({
        "sessionId": session_id,
        "startTime": now - age_ms,
        "lastActivity": now - age_ms,
    });
    let storage = MemoryStorage::new();
    storage
        .set_item("visitSessionData", &descriptor.to_string())
        .unwrap();
    storage
}

#[test]
fn test_mints_session_with_time_prefix() {
    let tracker = SessionTracker::new(MemoryStorage::new(), TIMEOUT_MS);
    let id = tracker.current_session_id();
    assert!(id.starts_with("session_"), "unexpected id format: {}", id);

    let descriptor = tracker.current_descriptor().expect("descriptor missing");
    assert_eq!(descriptor.session_id, id);
    assert_eq!(descriptor.start_time, descriptor.last_activity);
}

#[test]
fn test_session_id_stable_across_calls() {
    let tracker = SessionTracker::new(MemoryStorage::new(), TIMEOUT_MS);
    let first = tracker.current_session_id();
    let second = tracker.current_session_id();
    assert_eq!(first, second);
}

#[test]
fn test_unexpired_session_continues_and_refreshes_activity() {
    let tracker = SessionTracker::new(seeded_storage("session_1_live", 60_000), TIMEOUT_MS);

    assert_eq!(tracker.current_session_id(), "session_1_live");

    let descriptor = tracker.current_descriptor().expect("descriptor missing");
    assert!(
        descriptor.last_activity > descriptor.start_time,
        "last_activity should have been refreshed"
    );
}

#[test]
fn test_expired_session_is_replaced() {
    let tracker = SessionTracker::new(
        seeded_storage("session_1_stale", TIMEOUT_MS + 60_000),
        TIMEOUT_MS,
    );

    let id = tracker.current_session_id();
    assert_ne!(id, "session_1_stale");
    assert!(id.starts_with("session_"));
}

#[test]
fn test_corrupted_descriptor_starts_fresh() {
    let storage = MemoryStorage::new();
    storage.set_item("visitSessionData", "{not json").unwrap();

    let tracker = SessionTracker::new(storage, TIMEOUT_MS);
    let id = tracker.current_session_id();
    assert!(id.starts_with("session_"));

    // The fresh descriptor replaced the corrupted blob.
    assert_eq!(tracker.current_descriptor().unwrap().session_id, id);
}

#[test]
fn test_is_new_session_true_exactly_once() {
    let tracker = SessionTracker::new(MemoryStorage::new(), TIMEOUT_MS);
    let store = LocalStore::new(MemoryStorage::new(), 100);

    assert!(tracker.is_new_session(&store));
    assert!(!tracker.is_new_session(&store));
    assert!(!tracker.is_new_session(&store));
}

#[test]
fn test_fresh_tab_is_a_new_session_again() {
    let store = LocalStore::new(MemoryStorage::new(), 100);

    let first_tab = SessionTracker::new(MemoryStorage::new(), TIMEOUT_MS);
    assert!(first_tab.is_new_session(&store));

    // A new tab gets fresh ephemeral storage and therefore a fresh session.
    let second_tab = SessionTracker::new(MemoryStorage::new(), TIMEOUT_MS);
    assert!(second_tab.is_new_session(&store));
    assert!(!second_tab.is_new_session(&store));
}
