//! Merge Engine for visitrack.
//!
//! Pure snapshot combination, used by `RemoteSync` to reconcile local and
//! remote state. Both sides only ever increment, so the counter merges by
//! maximum rather than last-writer-wins, and histories merge by set union.
//!
//! Note the counter is not a CRDT-grade counter: two devices incrementing
//! independently between syncs can undercount the true total. That is an
//! accepted approximation of this protocol, not a resolvable conflict.

use std::collections::HashSet;

use crate::types::visit::{Snapshot, VisitRecord};

/// Combines a local and an optional remote snapshot.
///
/// - counter: maximum of both sides;
/// - history: union of both sides, deduplicated, sorted by timestamp
///   descending, truncated to the most recent `cap` entries;
/// - last session id: local wins, remote fills in when local has none;
/// - absent remote: the local snapshot unchanged (identity case).
///
/// Idempotent (`merge(x, x) = x` up to history order/truncation) and
/// commutative on the counter and the history set.
pub fn merge(local: &Snapshot, remote: Option<&Snapshot>, cap: usize) -> Snapshot {
    let remote = match remote {
        Some(r) => r,
        None => return local.clone(),
    };

    let mut history = dedupe_history(
        local
            .history
            .iter()
            .chain(remote.history.iter())
            .cloned()
            .collect(),
    );
    history.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    history.truncate(cap);

    Snapshot {
        visits: local.visits.max(remote.visits),
        history,
        last_session_id: local
            .last_session_id
            .clone()
            .or_else(|| remote.last_session_id.clone()),
    }
}

/// Removes duplicate records, keeping the first occurrence.
///
/// Two records are duplicates iff their `(session, timestamp)` pairs match
/// exactly.
pub fn dedupe_history(records: Vec<VisitRecord>) -> Vec<VisitRecord> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|record| seen.insert((record.session.clone(), record.timestamp)))
        .collect()
}
