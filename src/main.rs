//! Visitrack — session-deduplicated website visit tracking.
//!
//! Entry point: runs an interactive console demo walking every component
//! with an in-memory database and an unconfigured remote.

#[tokio::main]
async fn main() {
    env_logger::init();

    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║              Visitrack v{} — Demo Mode                    ║", env!("CARGO_PKG_VERSION"));
    println!("║     Session-deduplicated visit tracking with remote sync   ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();

    demo_database();
    demo_settings();
    demo_session_tracker();
    demo_local_store();
    demo_visit_recorder();
    demo_merge_engine();
    demo_sync().await;
    demo_app();

    println!();
    println!("═══════════════════════════════════════════════════════════════");
    println!("  ✅ All components demonstrated successfully!");
    println!("═══════════════════════════════════════════════════════════════");
}

fn section(name: &str) {
    println!("───────────────────────────────────────────────────────────────");
    println!("  📦 {}", name);
    println!("───────────────────────────────────────────────────────────────");
}

fn demo_database() {
    use visitrack::database::Database;
    section("Database Layer");

    let db = Database::open_in_memory().expect("Failed to open database");
    let tables: Vec<String> = {
        let conn = db.connection();
        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap();
        stmt.query_map([], |row| row.get(0))
            .unwrap()
            .filter_map(|r| r.ok())
            .collect()
    };
    println!("  Created {} tables: {}", tables.len(), tables.join(", "));
    println!("  ✓ Database + migrations OK");
    println!();
}

fn demo_settings() {
    use visitrack::types::settings::TrackerSettings;
    section("Tracker Settings");

    let mut settings = TrackerSettings::default();
    println!("  Endpoint: {}", settings.server.endpoint);
    println!("  Sync interval: {} ms", settings.server.sync_interval_ms);
    println!("  History cap: {}", settings.local.max_history_records);
    println!("  Session timeout: {} min", settings.local.session_timeout_ms / 60_000);

    settings.server.enabled = true;
    let report = settings.validate();
    println!("  Validation with placeholder credentials: valid={}", report.is_valid);
    for finding in &report.errors {
        println!("    ⚠ {}", finding);
    }
    println!("  ✓ TrackerSettings OK");
    println!();
}

fn demo_session_tracker() {
    use visitrack::managers::local_store::LocalStore;
    use visitrack::managers::session_tracker::{SessionTracker, SessionTrackerTrait};
    use visitrack::storage::MemoryStorage;
    section("Session Tracker");

    let tracker = SessionTracker::new(MemoryStorage::new(), 30 * 60 * 1000);
    let store = LocalStore::new(MemoryStorage::new(), 100);

    let sid = tracker.current_session_id();
    println!("  Minted session: {}", sid);
    println!("  Stable across calls: {}", tracker.current_session_id() == sid);

    println!("  First evaluation is a new session: {}", tracker.is_new_session(&store));
    println!("  Second evaluation is not: {}", !tracker.is_new_session(&store));

    let descriptor = tracker.current_descriptor().unwrap();
    println!("  Descriptor start/activity: {} / {}", descriptor.start_time, descriptor.last_activity);
    println!("  ✓ SessionTracker OK");
    println!();
}

fn demo_local_store() {
    use visitrack::managers::local_store::{LocalStore, LocalStoreTrait};
    use visitrack::storage::MemoryStorage;
    use visitrack::types::visit::VisitRecord;
    section("Local Store");

    let store = LocalStore::new(MemoryStorage::new(), 5);
    println!("  Fresh counter reads: {}", store.read_counter());

    for n in 1..=8u64 {
        store.write_counter(n);
        store.append_history(VisitRecord::new("/docs/intro", "session_demo", "demo-agent", None, n));
    }
    let history = store.read_history();
    println!("  After 8 appends with cap 5: {} records, oldest visit #{}", history.len(), history[0].visit_number);

    let backup = store.backup();
    println!("  Backup blob: {} bytes", backup.len());

    store.reset();
    println!("  After reset: counter={}, history={}", store.read_counter(), store.read_history().len());

    store.restore(&backup);
    println!("  After restore: counter={}, history={}", store.read_counter(), store.read_history().len());
    println!("  ✓ LocalStore OK");
    println!();
}

fn demo_visit_recorder() {
    use std::sync::Arc;
    use visitrack::managers::local_store::{LocalStore, LocalStoreTrait};
    use visitrack::managers::session_tracker::SessionTracker;
    use visitrack::managers::visit_recorder::{VisitRecorder, VisitRecorderTrait};
    use visitrack::storage::MemoryStorage;
    section("Visit Recorder");

    let store = Arc::new(LocalStore::new(MemoryStorage::new(), 100));
    let tracker = SessionTracker::new(MemoryStorage::new(), 30 * 60 * 1000);
    let mut recorder = VisitRecorder::new(tracker, store.clone(), "demo-agent/1.0");

    recorder.on_visit_updated(Box::new(|event| {
        println!(
            "    event: total={} page={} new_session={}",
            event.total_visits, event.current_page, event.is_new_session
        );
    }));

    let event = recorder.handle_page_load("/docs/intro", None);
    println!("  Page load: counter={}, state={:?}", event.total_visits, recorder.state());

    let event = recorder.handle_navigation("/docs/advanced", None);
    println!("  Navigation: counter={}, state={:?}", event.total_visits, recorder.state());

    let stats = recorder.stats();
    println!("  Stats: total={}, today={}, most visited={}", stats.total_visits, stats.today_visits, stats.most_visited_page);

    println!("  History records: {}", store.read_history().len());
    println!("  ✓ VisitRecorder OK");
    println!();
}

fn demo_merge_engine() {
    use visitrack::services::merge_engine;
    use visitrack::types::visit::{Snapshot, VisitRecord};
    section("Merge Engine");

    let local = Snapshot {
        visits: 2,
        history: vec![
            VisitRecord::new("/a", "session_local_1", "demo-agent", None, 1),
            VisitRecord::new("/b", "session_local_2", "demo-agent", None, 2),
        ],
        last_session_id: Some("session_local_2".to_string()),
    };
    let remote = Snapshot {
        visits: 5,
        history: vec![
            VisitRecord::new("/c", "session_remote_1", "other-agent", None, 3),
            VisitRecord::new("/d", "session_remote_2", "other-agent", None, 4),
            VisitRecord::new("/e", "session_remote_3", "other-agent", None, 5),
        ],
        last_session_id: Some("session_remote_3".to_string()),
    };

    let merged = merge_engine::merge(&local, Some(&remote), 100);
    println!("  Merged counter: {} (max of 2 and 5)", merged.visits);
    println!("  Merged history: {} records", merged.history.len());

    let identity = merge_engine::merge(&local, None, 100);
    println!("  Absent remote is identity: {}", identity == local);
    println!("  ✓ MergeEngine OK");
    println!();
}

async fn demo_sync() {
    use visitrack::managers::local_store::LocalStore;
    use visitrack::services::remote_store::HttpRemoteStore;
    use visitrack::services::remote_sync::RemoteSync;
    use visitrack::storage::MemoryStorage;
    use visitrack::types::settings::ServerSettings;
    section("Remote Sync (unconfigured)");

    let settings = ServerSettings::default();
    let sync = RemoteSync::new(HttpRemoteStore::new(settings.clone()), settings, 100);
    let store = LocalStore::new(MemoryStorage::new(), 100);

    let status = sync.sync_status();
    println!("  Configured: {}", status.is_configured);
    println!("  sync_now with placeholder credentials: {}", sync.sync_now(&store).await);
    println!("  Last sync: {} (never)", sync.sync_status().last_sync);
    println!("  ✓ RemoteSync OK");
    println!();
}

fn demo_app() {
    use visitrack::app::App;
    use visitrack::managers::visit_recorder::VisitRecorderTrait;
    use visitrack::types::settings::TrackerSettings;
    section("App Core (full lifecycle)");

    let mut app = App::new(":memory:", TrackerSettings::default(), "demo-agent/1.0").unwrap();
    println!("  Initialized App with SQLite-backed local store");

    app.startup();
    println!("  Startup sequence: config validation → integrity check");

    let event = app.recorder.handle_page_load("/docs/intro", Some("https://example.com"));
    println!("  First visit counted: total={}", event.total_visits);

    app.shutdown();
    println!("  Shutdown sequence: unload push dispatched (unconfigured → dropped)");
    println!("  ✓ App Core OK");
}
