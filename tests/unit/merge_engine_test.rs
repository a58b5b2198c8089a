//! Unit tests for the merge engine: max-counter policy, history union with
//! dedupe, ordering, truncation, and the identity case.

use chrono::{TimeZone, Utc};

use visitrack::services::merge_engine::{dedupe_history, merge};
use visitrack::types::visit::{Snapshot, VisitRecord};

fn record_at(session: &str, ts_ms: i64, visit_number: u64) -> VisitRecord {
    VisitRecord {
        timestamp: Utc.timestamp_millis_opt(ts_ms).unwrap(),
        page: "/p".to_string(),
        session: session.to_string(),
        user_agent: "test-agent".to_string(),
        referrer: "Direct".to_string(),
        visit_number,
    }
}

fn snapshot(visits: u64, history: Vec<VisitRecord>) -> Snapshot {
    Snapshot {
        visits,
        history,
        last_session_id: None,
    }
}

#[test]
fn test_absent_remote_is_identity() {
    let local = snapshot(4, vec![record_at("session_a", 1_000, 4)]);
    assert_eq!(merge(&local, None, 100), local);
}

#[test]
fn test_counter_merges_by_max_not_last_writer() {
    let local = snapshot(2, vec![]);
    let remote = snapshot(5, vec![]);

    assert_eq!(merge(&local, Some(&remote), 100).visits, 5);
    assert_eq!(merge(&remote, Some(&local), 100).visits, 5);
}

#[test]
fn test_disjoint_histories_union_sorted_descending() {
    let local = snapshot(
        2,
        vec![record_at("session_l1", 1_000, 1), record_at("session_l2", 4_000, 2)],
    );
    let remote = snapshot(
        5,
        vec![
            record_at("session_r1", 2_000, 3),
            record_at("session_r2", 3_000, 4),
            record_at("session_r3", 5_000, 5),
        ],
    );

    let merged = merge(&local, Some(&remote), 100);

    assert_eq!(merged.visits, 5);
    assert_eq!(merged.history.len(), 5);

    let times: Vec<i64> = merged
        .history
        .iter()
        .map(|v| v.timestamp.timestamp_millis())
        .collect();
    assert_eq!(times, vec![5_000, 4_000, 3_000, 2_000, 1_000]);
}

#[test]
fn test_shared_records_are_deduplicated() {
    let shared = record_at("session_shared", 2_000, 1);
    let local = snapshot(2, vec![shared.clone(), record_at("session_l", 3_000, 2)]);
    let remote = snapshot(2, vec![shared.clone(), record_at("session_r", 1_000, 2)]);

    let merged = merge(&local, Some(&remote), 100);

    assert_eq!(merged.history.len(), 3);
    let shared_count = merged
        .history
        .iter()
        .filter(|v| v.session == "session_shared")
        .count();
    assert_eq!(shared_count, 1);
}

#[test]
fn test_same_session_different_timestamps_both_kept() {
    // Duplicate detection is the exact (session, timestamp) pair.
    let local = snapshot(2, vec![record_at("session_a", 1_000, 1)]);
    let remote = snapshot(2, vec![record_at("session_a", 2_000, 1)]);

    assert_eq!(merge(&local, Some(&remote), 100).history.len(), 2);
}

#[test]
fn test_merged_history_is_truncated_to_cap() {
    let local_history: Vec<_> = (0..80).map(|i| record_at("session_l", i * 10, 1)).collect();
    let remote_history: Vec<_> = (0..80)
        .map(|i| record_at("session_r", i * 10 + 5, 1))
        .collect();

    let merged = merge(
        &snapshot(80, local_history),
        Some(&snapshot(80, remote_history)),
        100,
    );

    assert_eq!(merged.history.len(), 100);
    // The newest records survive truncation.
    assert_eq!(merged.history[0].timestamp.timestamp_millis(), 795);
}

#[test]
fn test_last_session_id_prefers_local() {
    let mut local = snapshot(1, vec![]);
    local.last_session_id = Some("session_local".to_string());
    let mut remote = snapshot(1, vec![]);
    remote.last_session_id = Some("session_remote".to_string());

    let merged = merge(&local, Some(&remote), 100);
    assert_eq!(merged.last_session_id, Some("session_local".to_string()));

    local.last_session_id = None;
    let merged = merge(&local, Some(&remote), 100);
    assert_eq!(merged.last_session_id, Some("session_remote".to_string()));
}

#[test]
fn test_dedupe_keeps_first_occurrence() {
    let first = record_at("session_a", 1_000, 1);
    let mut duplicate = first.clone();
    duplicate.page = "/other".to_string();

    let deduped = dedupe_history(vec![first.clone(), duplicate]);
    assert_eq!(deduped.len(), 1);
    assert_eq!(deduped[0].page, "/p", "first occurrence wins");
}
