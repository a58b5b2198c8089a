//! Session Tracker for visitrack.
//!
//! Decides whether the current page load belongs to a new visit session or
//! continues one already counted. The session descriptor lives in ephemeral
//! per-tab storage and expires after a fixed inactivity timeout; the id of
//! the last session that triggered a count is persisted durably through the
//! [`LocalStore`].

use chrono::Utc;
use uuid::Uuid;

use crate::managers::local_store::{LocalStore, LocalStoreTrait};
use crate::storage::StorageArea;
use crate::types::session::SessionDescriptor;

const SESSION_STORAGE_KEY: &str = "visitSessionData";

/// Trait defining session tracking operations.
pub trait SessionTrackerTrait {
    /// Returns the current session id, minting a new session if the stored
    /// one is absent, expired, or unreadable. Refreshes `last_activity`.
    fn current_session_id(&self) -> String;

    /// True exactly once per session lifetime: compares the current session
    /// id against the store's last counted session id and, on difference,
    /// persists the new value.
    fn is_new_session(&self, store: &LocalStore) -> bool;

    /// The stored descriptor, if present and readable.
    fn current_descriptor(&self) -> Option<SessionDescriptor>;
}

/// Session tracker over an ephemeral storage area.
pub struct SessionTracker {
    ephemeral: Box<dyn StorageArea>,
    timeout_ms: i64,
}

impl SessionTracker {
    /// Creates a tracker with the given per-tab storage and inactivity
    /// timeout in milliseconds.
    pub fn new(ephemeral: impl StorageArea + 'static, timeout_ms: i64) -> Self {
        Self {
            ephemeral: Box::new(ephemeral),
            timeout_ms,
        }
    }

    fn now_ms() -> i64 {
        Utc::now().timestamp_millis()
    }

    /// Session ids carry a time prefix plus a short random suffix, unique
    /// with overwhelming probability.
    fn mint_session_id(now: i64) -> String {
        let suffix = Uuid::new_v4().simple().to_string();
        format!("session_{}_{}", now, &suffix[..9])
    }

    fn persist(&self, descriptor: &SessionDescriptor) {
        match serde_json::to_string(descriptor) {
            Ok(json) => {
                if let Err(e) = self.ephemeral.set_item(SESSION_STORAGE_KEY, &json) {
                    log::warn!("failed to persist session descriptor: {}", e);
                }
            }
            Err(e) => log::warn!("failed to serialize session descriptor: {}", e),
        }
    }
}

impl SessionTrackerTrait for SessionTracker {
    fn current_session_id(&self) -> String {
        let now = Self::now_ms();

        if let Ok(Some(raw)) = self.ephemeral.get_item(SESSION_STORAGE_KEY) {
            match serde_json::from_str::<SessionDescriptor>(&raw) {
                Ok(mut descriptor) => {
                    if now - descriptor.start_time < self.timeout_ms {
                        descriptor.last_activity = now;
                        self.persist(&descriptor);
                        return descriptor.session_id;
                    }
                }
                Err(e) => {
                    // Unreadable descriptor counts as expired.
                    log::warn!("session descriptor unparsable, starting fresh: {}", e);
                }
            }
        }

        let descriptor = SessionDescriptor {
            session_id: Self::mint_session_id(now),
            start_time: now,
            last_activity: now,
        };
        self.persist(&descriptor);
        log::debug!("new session {}", descriptor.session_id);
        descriptor.session_id
    }

    fn is_new_session(&self, store: &LocalStore) -> bool {
        let current = self.current_session_id();
        match store.read_last_session_id() {
            Some(last) if last == current => false,
            _ => {
                store.write_last_session_id(&current);
                true
            }
        }
    }

    fn current_descriptor(&self) -> Option<SessionDescriptor> {
        let raw = self.ephemeral.get_item(SESSION_STORAGE_KEY).ok().flatten()?;
        serde_json::from_str(&raw).ok()
    }
}
