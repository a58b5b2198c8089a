//! Local Store for visitrack.
//!
//! Implements `LocalStoreTrait` — the durable per-browser record of the
//! total visit counter, the bounded visit-history log, and the last counted
//! session id, behind a [`StorageArea`] backend.
//!
//! Durability is best-effort: storage or serialization failures degrade to
//! no-ops with a logged warning. Reads of corrupted values fall back to
//! empty/zero rather than erroring, so a damaged profile never breaks the
//! host page.

use chrono::{Duration, Utc};
use std::collections::BTreeMap;

use crate::storage::StorageArea;
use crate::types::visit::{Snapshot, VisitRecord, VisitStats};

const KEY_WEBSITE_VISITS: &str = "websiteVisits";
const KEY_VISIT_HISTORY: &str = "visitHistory";
const KEY_LAST_SESSION_ID: &str = "lastSessionId";

/// Trait defining local visit bookkeeping operations.
pub trait LocalStoreTrait {
    fn read_counter(&self) -> u64;
    fn write_counter(&self, value: u64);
    fn append_history(&self, record: VisitRecord);
    fn read_history(&self) -> Vec<VisitRecord>;
    fn read_last_session_id(&self) -> Option<String>;
    fn write_last_session_id(&self, id: &str);
    fn set_counter_override(&self, value: u64);
    fn snapshot(&self) -> Snapshot;
    fn apply_snapshot(&self, snapshot: &Snapshot);
    fn reset(&self);
    fn backup(&self) -> String;
    fn restore(&self, backup: &str) -> bool;
    fn today_visits(&self) -> usize;
    fn week_visits(&self) -> usize;
    fn visit_stats(&self, current_session: &str) -> VisitStats;
}

/// Local store backed by any [`StorageArea`].
pub struct LocalStore {
    storage: Box<dyn StorageArea>,
    history_cap: usize,
}

impl LocalStore {
    /// Creates a new `LocalStore` over the given backend.
    ///
    /// `history_cap` bounds the retained visit history; the oldest entries
    /// are evicted first once the cap is exceeded.
    pub fn new(storage: impl StorageArea + 'static, history_cap: usize) -> Self {
        Self {
            storage: Box::new(storage),
            history_cap,
        }
    }

    /// The configured history cap.
    pub fn history_cap(&self) -> usize {
        self.history_cap
    }

    fn set_absorbing(&self, key: &str, value: &str) {
        if let Err(e) = self.storage.set_item(key, value) {
            log::warn!("failed to persist {}: {}", key, e);
        }
    }

    fn write_history(&self, history: &[VisitRecord]) {
        match serde_json::to_string(history) {
            Ok(json) => self.set_absorbing(KEY_VISIT_HISTORY, &json),
            Err(e) => log::warn!("failed to serialize visit history: {}", e),
        }
    }
}

impl LocalStoreTrait for LocalStore {
    /// Reads the total visit counter. Missing or unparsable values read as 0.
    fn read_counter(&self) -> u64 {
        match self.storage.get_item(KEY_WEBSITE_VISITS) {
            Ok(Some(raw)) => raw.trim().parse().unwrap_or_else(|_| {
                log::warn!("stored counter {:?} is not an integer, reading as 0", raw);
                0
            }),
            Ok(None) => 0,
            Err(e) => {
                log::warn!("failed to read counter: {}", e);
                0
            }
        }
    }

    /// Overwrites the counter. Callers guarantee monotonic non-decrease;
    /// the sanctioned exceptions are `set_counter_override`, `restore`, and
    /// `reset`.
    fn write_counter(&self, value: u64) {
        self.set_absorbing(KEY_WEBSITE_VISITS, &value.to_string());
    }

    /// Appends a record, then truncates the history to the most recent
    /// `history_cap` entries (oldest dropped first).
    fn append_history(&self, record: VisitRecord) {
        let mut history = self.read_history();
        history.push(record);
        if history.len() > self.history_cap {
            let excess = history.len() - self.history_cap;
            history.drain(..excess);
        }
        self.write_history(&history);
    }

    /// Reads the visit history. Missing or corrupted values read as empty.
    fn read_history(&self) -> Vec<VisitRecord> {
        match self.storage.get_item(KEY_VISIT_HISTORY) {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                log::warn!("stored visit history is unparsable, reading as empty: {}", e);
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(e) => {
                log::warn!("failed to read visit history: {}", e);
                Vec::new()
            }
        }
    }

    fn read_last_session_id(&self) -> Option<String> {
        match self.storage.get_item(KEY_LAST_SESSION_ID) {
            Ok(value) => value,
            Err(e) => {
                log::warn!("failed to read last session id: {}", e);
                None
            }
        }
    }

    fn write_last_session_id(&self, id: &str) {
        self.set_absorbing(KEY_LAST_SESSION_ID, id);
    }

    /// Explicit counter override, used for data restoration and integrity
    /// repair. The one write path allowed to decrease the counter.
    fn set_counter_override(&self, value: u64) {
        log::info!("visit counter set to {}", value);
        self.set_absorbing(KEY_WEBSITE_VISITS, &value.to_string());
    }

    /// Captures the sync-relevant state tuple.
    fn snapshot(&self) -> Snapshot {
        Snapshot {
            visits: self.read_counter(),
            history: self.read_history(),
            last_session_id: self.read_last_session_id(),
        }
    }

    /// Writes a (typically merged) snapshot back into durable storage.
    ///
    /// An absent `last_session_id` leaves the stored value untouched so a
    /// remote document can never clear the local session marker.
    fn apply_snapshot(&self, snapshot: &Snapshot) {
        self.write_counter(snapshot.visits);
        self.write_history(&snapshot.history);
        if let Some(id) = &snapshot.last_session_id {
            self.write_last_session_id(id);
        }
    }

    /// Clears counter, history, and last session id. Debug/testing only,
    /// never invoked automatically.
    fn reset(&self) {
        for key in [KEY_WEBSITE_VISITS, KEY_VISIT_HISTORY, KEY_LAST_SESSION_ID] {
            if let Err(e) = self.storage.remove_item(key) {
                log::warn!("failed to remove {}: {}", key, e);
            }
        }
        log::info!("visit data cleared");
    }

    /// Serializes the raw stored counter and history into a backup blob.
    fn backup(&self) -> String {
        let raw_visits = self.storage.get_item(KEY_WEBSITE_VISITS).ok().flatten();
        let raw_history = self.storage.get_item(KEY_VISIT_HISTORY).ok().flatten();
        let blob = serde_json::json!({
            "websiteVisits": raw_visits,
            "visitHistory": raw_history,
            "backupTime": Utc::now().to_rfc3339(),
        });
        serde_json::to_string_pretty(&blob).unwrap_or_else(|_| "{}".to_string())
    }

    /// Restores counter and/or history from a backup blob.
    ///
    /// Returns false if the blob does not parse; keys absent from the blob
    /// leave the corresponding stored value untouched.
    fn restore(&self, backup: &str) -> bool {
        let parsed: serde_json::Value = match serde_json::from_str(backup) {
            Ok(v) => v,
            Err(e) => {
                log::error!("failed to restore visit data: {}", e);
                return false;
            }
        };

        match &parsed[KEY_WEBSITE_VISITS] {
            serde_json::Value::String(s) => self.set_absorbing(KEY_WEBSITE_VISITS, s),
            serde_json::Value::Number(n) => {
                self.set_absorbing(KEY_WEBSITE_VISITS, &n.to_string())
            }
            _ => {}
        }

        match &parsed[KEY_VISIT_HISTORY] {
            serde_json::Value::String(s) => self.set_absorbing(KEY_VISIT_HISTORY, s),
            array @ serde_json::Value::Array(_) => {
                self.set_absorbing(KEY_VISIT_HISTORY, &array.to_string())
            }
            _ => {}
        }

        log::info!("visit data restored from backup");
        true
    }

    /// Number of retained visits recorded today (UTC).
    fn today_visits(&self) -> usize {
        let today = Utc::now().date_naive();
        self.read_history()
            .iter()
            .filter(|v| v.timestamp.date_naive() == today)
            .count()
    }

    /// Number of retained visits recorded within the last seven days.
    fn week_visits(&self) -> usize {
        let week_ago = Utc::now() - Duration::days(7);
        self.read_history()
            .iter()
            .filter(|v| v.timestamp >= week_ago)
            .count()
    }

    /// Aggregates per-page counts, most-visited page, and the ten most
    /// recent records over the retained history window.
    fn visit_stats(&self, current_session: &str) -> VisitStats {
        let history = self.read_history();

        let mut page_counts: BTreeMap<String, u64> = BTreeMap::new();
        for visit in &history {
            *page_counts.entry(visit.page.clone()).or_insert(0) += 1;
        }

        let mut most_visited_page = "/".to_string();
        let mut best = 0u64;
        for (page, count) in &page_counts {
            if *count > best {
                best = *count;
                most_visited_page = page.clone();
            }
        }

        let recent = history[history.len().saturating_sub(10)..].to_vec();

        VisitStats {
            total_visits: self.read_counter(),
            today_visits: self.today_visits(),
            week_visits: self.week_visits(),
            page_counts,
            most_visited_page,
            recent,
            current_session: current_session.to_string(),
        }
    }
}
