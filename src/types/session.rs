use serde::{Deserialize, Serialize};

/// Per-tab session descriptor held in ephemeral storage.
///
/// Identity is `session_id`; the descriptor expires once
/// `now - start_time` exceeds the configured inactivity timeout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionDescriptor {
    pub session_id: String,
    /// Epoch milliseconds at session creation.
    pub start_time: i64,
    /// Epoch milliseconds of the most recent activity, refreshed on read.
    pub last_activity: i64,
}
