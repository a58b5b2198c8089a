//! Unit tests for the visit recorder state machine: counting once per
//! session, notifying on every evaluation, self-healing, and manual
//! overrides.

use std::sync::{Arc, Mutex};

use chrono::{TimeZone, Utc};

use visitrack::managers::local_store::{LocalStore, LocalStoreTrait};
use visitrack::managers::session_tracker::SessionTracker;
use visitrack::managers::visit_recorder::{RecorderState, VisitRecorder, VisitRecorderTrait};
use visitrack::storage::MemoryStorage;
use visitrack::types::visit::{VisitEvent, VisitRecord};

const TIMEOUT_MS: i64 = 30 * 60 * 1000;

fn recorder_over(store: Arc<LocalStore>) -> VisitRecorder {
    let tracker = SessionTracker::new(MemoryStorage::new(), TIMEOUT_MS);
    VisitRecorder::new(tracker, store, "test-agent/1.0 (unit tests)")
}

/// Helper: registers a listener collecting every dispatched event.
fn collect_events(recorder: &mut VisitRecorder) -> Arc<Mutex<Vec<VisitEvent>>> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    recorder.on_visit_updated(Box::new(move |event| {
        sink.lock().unwrap().push(event.clone());
    }));
    events
}

#[test]
fn test_fresh_browser_first_load_counts_one() {
    let store = Arc::new(LocalStore::new(MemoryStorage::new(), 100));
    let mut recorder = recorder_over(store.clone());
    let events = collect_events(&mut recorder);

    let event = recorder.handle_page_load("/docs/intro", None);

    assert_eq!(event.total_visits, 1);
    assert!(event.is_new_session);
    assert_eq!(event.current_page, "/docs/intro");
    assert_eq!(recorder.state(), RecorderState::Recorded);

    let history = store.read_history();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].visit_number, 1);
    assert_eq!(history[0].page, "/docs/intro");
    assert_eq!(history[0].referrer, "Direct");

    assert_eq!(events.lock().unwrap().len(), 1);
}

#[test]
fn test_same_session_navigation_does_not_recount() {
    let store = Arc::new(LocalStore::new(MemoryStorage::new(), 100));
    let mut recorder = recorder_over(store.clone());
    let events = collect_events(&mut recorder);

    recorder.handle_page_load("/docs/intro", None);
    let event = recorder.handle_navigation("/docs/advanced", None);

    assert_eq!(event.total_visits, 1, "same session must not recount");
    assert!(!event.is_new_session);
    assert_eq!(event.current_page, "/docs/advanced");
    assert_eq!(recorder.state(), RecorderState::Skipped);

    assert_eq!(store.read_history().len(), 1, "no new history record");

    // Both evaluations notified observers.
    let seen = events.lock().unwrap();
    assert_eq!(seen.len(), 2);
    assert!(seen[0].is_new_session);
    assert!(!seen[1].is_new_session);
}

#[test]
fn test_new_tab_counts_again() {
    let store = Arc::new(LocalStore::new(MemoryStorage::new(), 100));

    let mut first_tab = recorder_over(store.clone());
    first_tab.handle_page_load("/docs/intro", None);

    let mut second_tab = recorder_over(store.clone());
    let event = second_tab.handle_page_load("/docs/intro", None);

    assert_eq!(event.total_visits, 2);
    assert!(event.is_new_session);
    assert_eq!(store.read_history().len(), 2);
    assert_eq!(store.read_history()[1].visit_number, 2);
}

#[test]
fn test_recorder_starts_idle() {
    let store = Arc::new(LocalStore::new(MemoryStorage::new(), 100));
    let recorder = recorder_over(store);
    assert_eq!(recorder.state(), RecorderState::Idle);
    assert_eq!(recorder.current_page(), "");
}

#[test]
fn test_integrity_check_repairs_zero_counter_from_history() {
    let store = Arc::new(LocalStore::new(MemoryStorage::new(), 100));
    for n in [3u64, 7, 5] {
        store.append_history(VisitRecord {
            timestamp: Utc.timestamp_millis_opt(1_000 * n as i64).unwrap(),
            page: "/p".to_string(),
            session: format!("session_{}", n),
            user_agent: "test-agent".to_string(),
            referrer: "Direct".to_string(),
            visit_number: n,
        });
    }
    assert_eq!(store.read_counter(), 0);

    let mut recorder = recorder_over(store.clone());
    let events = collect_events(&mut recorder);

    let repaired = recorder.check_integrity();

    assert_eq!(repaired, Some(7), "counter adopts the highest visit number");
    assert_eq!(store.read_counter(), 7);

    let seen = events.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert!(!seen[0].is_new_session);
    assert_eq!(seen[0].total_visits, 7);
}

#[test]
fn test_integrity_check_leaves_healthy_state_alone() {
    let store = Arc::new(LocalStore::new(MemoryStorage::new(), 100));
    let mut recorder = recorder_over(store.clone());
    recorder.handle_page_load("/docs/intro", None);

    assert_eq!(recorder.check_integrity(), None);
    assert_eq!(store.read_counter(), 1);

    // Empty history with a zero counter is also healthy.
    let empty_store = Arc::new(LocalStore::new(MemoryStorage::new(), 100));
    let mut empty_recorder = recorder_over(empty_store);
    assert_eq!(empty_recorder.check_integrity(), None);
}

#[test]
fn test_manual_override_notifies_without_counting() {
    let store = Arc::new(LocalStore::new(MemoryStorage::new(), 100));
    let mut recorder = recorder_over(store.clone());
    let events = collect_events(&mut recorder);

    recorder.set_total_visits(250);

    assert_eq!(store.read_counter(), 250);
    assert!(store.read_history().is_empty(), "override records no visit");

    let seen = events.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].total_visits, 250);
    assert!(!seen[0].is_new_session);
}

#[test]
fn test_user_agent_is_truncated_in_records() {
    let store = Arc::new(LocalStore::new(MemoryStorage::new(), 100));
    let tracker = SessionTracker::new(MemoryStorage::new(), TIMEOUT_MS);
    let long_agent = "x".repeat(300);
    let mut recorder = VisitRecorder::new(tracker, store.clone(), &long_agent);

    recorder.handle_page_load("/docs/intro", None);

    assert_eq!(store.read_history()[0].user_agent.len(), 100);
}

#[test]
fn test_referrer_is_preserved_when_present() {
    let store = Arc::new(LocalStore::new(MemoryStorage::new(), 100));
    let mut recorder = recorder_over(store.clone());

    recorder.handle_page_load("/docs/intro", Some("https://news.example.com"));

    assert_eq!(store.read_history()[0].referrer, "https://news.example.com");
}
