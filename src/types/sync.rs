use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::errors::SyncError;
use super::visit::{Snapshot, VisitRecord};

/// Wire format version stamped into every pushed document.
pub const WIRE_VERSION: &str = "1.0";

/// In-memory synchronization state, owned by `RemoteSync`.
///
/// Re-derived on every startup and never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncState {
    /// Epoch milliseconds of the last successful push; 0 = never.
    pub last_sync: i64,
    /// True while a push is in flight. Concurrent pushes are dropped.
    pub is_syncing: bool,
    /// Consecutive failed push attempts in the current cycle.
    pub retry_count: u32,
    /// Message of the most recent failure, cleared on success.
    pub last_error: Option<String>,
}

impl Default for SyncState {
    fn default() -> Self {
        Self {
            last_sync: 0,
            is_syncing: false,
            retry_count: 0,
            last_error: None,
        }
    }
}

/// Snapshot of `SyncState` plus scheduling info, for status queries.
#[derive(Debug, Clone)]
pub struct SyncStatus {
    pub last_sync: i64,
    pub is_syncing: bool,
    pub retry_count: u32,
    pub last_error: Option<String>,
    /// Epoch milliseconds when the next periodic sync is due.
    pub next_sync: i64,
    pub is_configured: bool,
}

/// Top-level document returned by a remote GET.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteDocument {
    pub record: RemoteRecord,
}

/// The remote store's record shape.
///
/// `website_visits` is a decimal-string integer and `visit_history` a
/// JSON-stringified array of `VisitRecord`, both inherited from the remote
/// store's document format, which stores every value as a string.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteRecord {
    pub website_visits: String,
    pub visit_history: String,
    #[serde(default)]
    pub last_session_id: Option<String>,
    pub last_update: String,
    pub version: String,
}

impl RemoteRecord {
    /// Encodes a snapshot into the wire shape, stamping the update time.
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        Self {
            website_visits: snapshot.visits.to_string(),
            visit_history: serde_json::to_string(&snapshot.history)
                .unwrap_or_else(|_| "[]".to_string()),
            last_session_id: snapshot.last_session_id.clone(),
            last_update: Utc::now().to_rfc3339(),
            version: WIRE_VERSION.to_string(),
        }
    }

    /// Decodes the wire shape back into a snapshot.
    ///
    /// Parsing is defensive: a non-numeric counter or an unparsable history
    /// array rejects the whole document, which callers treat as the
    /// remote-absent case.
    pub fn to_snapshot(&self) -> Result<Snapshot, SyncError> {
        let visits: u64 = self.website_visits.trim().parse().map_err(|_| {
            SyncError::InvalidDocument(format!(
                "websiteVisits is not a decimal integer: {:?}",
                self.website_visits
            ))
        })?;

        let history: Vec<VisitRecord> = serde_json::from_str(&self.visit_history)
            .map_err(|e| SyncError::InvalidDocument(format!("visitHistory: {}", e)))?;

        Ok(Snapshot {
            visits,
            history,
            last_session_id: self.last_session_id.clone(),
        })
    }
}
