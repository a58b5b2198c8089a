use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User-agent strings are truncated to this length before storage.
pub const USER_AGENT_MAX_LEN: usize = 100;

/// A single counted visit. Immutable once created.
///
/// Field names follow the wire format: the same shape is stored in the
/// durable `visitHistory` key and JSON-stringified into remote documents.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VisitRecord {
    /// RFC 3339 timestamp of the visit.
    pub timestamp: DateTime<Utc>,
    /// Path of the page that triggered the count.
    pub page: String,
    /// Session id that this visit was counted under.
    pub session: String,
    /// Truncated user-agent string.
    pub user_agent: String,
    /// Referrer, or `"Direct"` when the page was reached without one.
    pub referrer: String,
    /// Value of the total counter at the time this visit was recorded.
    pub visit_number: u64,
}

impl VisitRecord {
    /// Builds a record for the current instant, truncating the user agent
    /// and defaulting an absent referrer to `"Direct"`.
    pub fn new(
        page: &str,
        session: &str,
        user_agent: &str,
        referrer: Option<&str>,
        visit_number: u64,
    ) -> Self {
        let user_agent = if user_agent.len() > USER_AGENT_MAX_LEN {
            let mut end = USER_AGENT_MAX_LEN;
            while !user_agent.is_char_boundary(end) {
                end -= 1;
            }
            user_agent[..end].to_string()
        } else {
            user_agent.to_string()
        };

        Self {
            timestamp: Utc::now(),
            page: page.to_string(),
            session: session.to_string(),
            user_agent,
            referrer: match referrer {
                Some(r) if !r.is_empty() => r.to_string(),
                _ => "Direct".to_string(),
            },
            visit_number,
        }
    }
}

/// The sync-relevant state tuple at one point in time, local or remote.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub visits: u64,
    pub history: Vec<VisitRecord>,
    pub last_session_id: Option<String>,
}

impl Snapshot {
    /// An empty snapshot: zero visits, no history, no last session.
    pub fn empty() -> Self {
        Self {
            visits: 0,
            history: Vec::new(),
            last_session_id: None,
        }
    }
}

/// Payload dispatched to observers on every recorder evaluation and on
/// manual counter overrides.
#[derive(Debug, Clone, PartialEq)]
pub struct VisitEvent {
    pub total_visits: u64,
    pub current_page: String,
    pub is_new_session: bool,
    pub session_id: String,
}

/// Aggregated statistics derived from the visit history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisitStats {
    pub total_visits: u64,
    pub today_visits: usize,
    pub week_visits: usize,
    /// Visit count per page path, over the retained history window.
    pub page_counts: BTreeMap<String, u64>,
    pub most_visited_page: String,
    /// The ten most recent visit records.
    pub recent: Vec<VisitRecord>,
    pub current_session: String,
}
