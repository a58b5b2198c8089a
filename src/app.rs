//! App Core for visitrack.
//!
//! Central struct wiring storage, the session tracker, the visit recorder,
//! and the remote synchronizer together, and managing the page lifecycle:
//! startup integrity check, periodic sync, unload-time push.

use std::sync::Arc;

use crate::database::Database;
use crate::managers::local_store::LocalStore;
use crate::managers::session_tracker::SessionTracker;
use crate::managers::visit_recorder::{VisitRecorder, VisitRecorderTrait};
use crate::services::remote_store::HttpRemoteStore;
use crate::services::remote_sync::RemoteSync;
use crate::storage::{MemoryStorage, SqliteStorage};
use crate::types::settings::TrackerSettings;

/// Central application struct holding all components.
///
/// The local store is shared (`Arc`) between the recorder and the sync
/// task; the session tracker's ephemeral storage is process-local, mirroring
/// a tab's lifetime.
pub struct App {
    pub db: Arc<Database>,
    pub settings: TrackerSettings,
    pub store: Arc<LocalStore>,
    pub recorder: VisitRecorder,
    pub sync: Arc<RemoteSync<HttpRemoteStore>>,
}

impl App {
    /// Creates a new App with a durable SQLite store at `db_path`.
    pub fn new(
        db_path: &str,
        settings: TrackerSettings,
        user_agent: &str,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let db = Arc::new(Database::open(db_path)?);

        let store = Arc::new(LocalStore::new(
            SqliteStorage::new(db.clone()),
            settings.local.max_history_records,
        ));
        let tracker = SessionTracker::new(MemoryStorage::new(), settings.local.session_timeout_ms);
        let recorder = VisitRecorder::new(tracker, store.clone(), user_agent);

        let remote = HttpRemoteStore::new(settings.server.clone());
        let sync = Arc::new(RemoteSync::new(
            remote,
            settings.server.clone(),
            settings.local.max_history_records,
        ));

        Ok(Self {
            db,
            settings,
            store,
            recorder,
            sync,
        })
    }

    /// Startup sequence: validate configuration (warnings only) and run the
    /// counter integrity check.
    pub fn startup(&mut self) {
        let report = self.settings.validate();
        if !report.is_valid {
            for finding in &report.errors {
                log::warn!("configuration: {}", finding);
            }
        }

        self.recorder.check_integrity();
    }

    /// Spawns the sync task: one immediate reconciliation, then the
    /// periodic loop. Must be called within a tokio runtime.
    pub fn spawn_sync(&self) -> tokio::task::JoinHandle<()> {
        let sync = self.sync.clone();
        let store = self.store.clone();
        tokio::spawn(async move {
            sync.sync_now(&store).await;
            sync.run_periodic(&store).await;
        })
    }

    /// Shutdown sequence: best-effort unload push of the current snapshot.
    pub fn shutdown(&self) {
        self.sync.dispatch_unload(&self.store);
    }
}
