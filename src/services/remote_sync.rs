//! Remote Sync for visitrack.
//!
//! Reconciles the local store with the shared remote document: fetch, merge
//! through the merge engine, write the merged snapshot locally, then push it
//! back with bounded linear-backoff retry. Every sync is a full
//! read-merge-write; the remote API has no partial updates.
//!
//! All failures are soft: a failed sync leaves local counting working and
//! the remote merely stale until the next scheduled tick.

use std::sync::Mutex;
use std::time::Duration;

use chrono::Utc;

use crate::managers::local_store::{LocalStore, LocalStoreTrait};
use crate::services::merge_engine;
use crate::services::remote_store::RemoteStore;
use crate::types::errors::SyncError;
use crate::types::settings::ServerSettings;
use crate::types::sync::{RemoteRecord, SyncState, SyncStatus};
use crate::types::visit::Snapshot;

/// Synchronizer over any [`RemoteStore`] transport.
pub struct RemoteSync<R: RemoteStore> {
    remote: R,
    settings: ServerSettings,
    history_cap: usize,
    state: Mutex<SyncState>,
}

impl<R: RemoteStore> RemoteSync<R> {
    /// Creates a synchronizer. `SyncState` starts fresh each process.
    pub fn new(remote: R, settings: ServerSettings, history_cap: usize) -> Self {
        Self {
            remote,
            settings,
            history_cap,
            state: Mutex::new(SyncState::default()),
        }
    }

    /// Runs one full sync cycle: fetch, merge, write local, push.
    ///
    /// Returns true if the push reached the remote. A fetch failure falls
    /// back to merging against nothing, so the local snapshot round-trips
    /// unchanged; an unconfigured remote makes the whole call a no-op.
    pub async fn sync_now(&self, store: &LocalStore) -> bool {
        if !self.remote.is_configured() {
            return false;
        }

        let local = store.snapshot();

        let remote_snapshot = match self.remote.fetch().await {
            Ok(Some(record)) => match record.to_snapshot() {
                Ok(snapshot) => Some(snapshot),
                Err(e) => {
                    log::warn!("rejecting remote document: {}", e);
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                log::warn!("remote fetch failed: {}", e);
                self.record_error(&e);
                None
            }
        };

        let merged = merge_engine::merge(&local, remote_snapshot.as_ref(), self.history_cap);
        store.apply_snapshot(&merged);

        self.push(&merged).await
    }

    /// Pushes a snapshot to the remote with bounded retry.
    ///
    /// Only one push may be in flight at a time; concurrent triggers are
    /// dropped, not queued. Failed attempts back off linearly
    /// (`retry_delay * attempt`) up to the configured maximum, then give up
    /// until the next scheduled sync, leaving `last_error` set.
    pub async fn push(&self, snapshot: &Snapshot) -> bool {
        {
            let mut state = self.state.lock().unwrap();
            if state.is_syncing {
                log::debug!("push already in flight, dropping trigger");
                return false;
            }
            state.is_syncing = true;
        }

        let record = RemoteRecord::from_snapshot(snapshot);
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            match self.remote.put(&record).await {
                Ok(()) => {
                    let mut state = self.state.lock().unwrap();
                    state.last_sync = Utc::now().timestamp_millis();
                    state.last_error = None;
                    state.retry_count = 0;
                    state.is_syncing = false;
                    log::debug!("snapshot pushed to remote");
                    return true;
                }
                Err(e) => {
                    log::warn!("push attempt {} failed: {}", attempt, e);
                    let exhausted = {
                        let mut state = self.state.lock().unwrap();
                        state.retry_count = attempt;
                        state.last_error = Some(e.to_string());
                        attempt >= self.settings.max_retries
                    };

                    if exhausted {
                        self.state.lock().unwrap().is_syncing = false;
                        log::warn!("push gave up after {} attempts", attempt);
                        return false;
                    }

                    let backoff = self.settings.retry_delay_ms * attempt as u64;
                    tokio::time::sleep(Duration::from_millis(backoff)).await;
                }
            }
        }
    }

    /// Periodic sync loop. Runs forever; callers spawn it as a task.
    pub async fn run_periodic(&self, store: &LocalStore) {
        let mut interval =
            tokio::time::interval(Duration::from_millis(self.settings.sync_interval_ms));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick completes immediately; skip it so the loop waits a
        // full interval before its first sync.
        interval.tick().await;

        loop {
            interval.tick().await;
            self.sync_now(store).await;
        }
    }

    /// Best-effort unload-time push of the current local snapshot. Never
    /// blocks; delivery is not guaranteed.
    pub fn dispatch_unload(&self, store: &LocalStore) {
        let record = RemoteRecord::from_snapshot(&store.snapshot());
        self.remote.dispatch(record);
        log::debug!("unload push dispatched");
    }

    /// Current sync state plus scheduling info.
    pub fn sync_status(&self) -> SyncStatus {
        let state = self.state.lock().unwrap().clone();
        SyncStatus {
            next_sync: state.last_sync + self.settings.sync_interval_ms as i64,
            is_configured: self.remote.is_configured(),
            last_sync: state.last_sync,
            is_syncing: state.is_syncing,
            retry_count: state.retry_count,
            last_error: state.last_error,
        }
    }

    fn record_error(&self, error: &SyncError) {
        self.state.lock().unwrap().last_error = Some(error.to_string());
    }
}
