//! Visit Recorder for visitrack.
//!
//! The orchestrating state machine: on every page load or detected path
//! change it asks the session tracker whether this load starts a new
//! session, increments the counter and appends a history record if so, and
//! always notifies observers. Navigations within one session notify without
//! counting twice.
//!
//! Navigation detection itself is the host environment's job; the core only
//! consumes the resulting stream of `handle_page_load` / `handle_navigation`
//! calls.

use std::sync::Arc;

use crate::managers::local_store::{LocalStore, LocalStoreTrait};
use crate::managers::session_tracker::{SessionTracker, SessionTrackerTrait};
use crate::types::visit::{VisitEvent, VisitRecord, VisitStats};

/// Observer callback for visit-updated notifications.
pub type VisitListener = Box<dyn Fn(&VisitEvent) + Send + Sync>;

/// Evaluation state, terminal per page load and re-entered on navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    Idle,
    Evaluating,
    Recorded,
    Skipped,
}

/// Trait defining visit recording operations.
pub trait VisitRecorderTrait {
    /// Runs the evaluation for an initial page load.
    fn handle_page_load(&mut self, page: &str, referrer: Option<&str>) -> VisitEvent;

    /// Runs the evaluation for a single-page navigation (path change or
    /// history pop). Within an unexpired session this skips counting and
    /// only re-notifies observers.
    fn handle_navigation(&mut self, page: &str, referrer: Option<&str>) -> VisitEvent;

    /// Startup integrity check: a zero counter alongside a non-empty
    /// history is repaired by adopting the highest recorded visit number.
    /// Returns the repaired counter value if a repair happened.
    fn check_integrity(&mut self) -> Option<u64>;

    /// Manual counter override; notifies observers without counting a visit.
    fn set_total_visits(&mut self, value: u64);

    /// Registers an observer for visit-updated notifications.
    fn on_visit_updated(&mut self, listener: VisitListener);

    fn state(&self) -> RecorderState;
    fn current_page(&self) -> &str;
}

/// Visit recorder tying the session tracker to the local store.
pub struct VisitRecorder {
    tracker: SessionTracker,
    store: Arc<LocalStore>,
    user_agent: String,
    state: RecorderState,
    current_page: String,
    listeners: Vec<VisitListener>,
}

impl VisitRecorder {
    /// Creates a recorder. `user_agent` is truncated when records are built.
    pub fn new(tracker: SessionTracker, store: Arc<LocalStore>, user_agent: &str) -> Self {
        Self {
            tracker,
            store,
            user_agent: user_agent.to_string(),
            state: RecorderState::Idle,
            current_page: String::new(),
            listeners: Vec::new(),
        }
    }

    /// Visit statistics for the retained history window, tagged with the
    /// current session id.
    pub fn stats(&self) -> VisitStats {
        self.store.visit_stats(&self.tracker.current_session_id())
    }

    fn evaluate(&mut self, page: &str, referrer: Option<&str>) -> VisitEvent {
        self.state = RecorderState::Evaluating;
        self.current_page = page.to_string();

        let is_new = self.tracker.is_new_session(&self.store);
        if is_new {
            let total = self.store.read_counter() + 1;
            self.store.write_counter(total);

            let record = VisitRecord::new(
                page,
                &self.tracker.current_session_id(),
                &self.user_agent,
                referrer,
                total,
            );
            self.store.append_history(record);

            self.state = RecorderState::Recorded;
            log::debug!("new session visit, total={}, page={}", total, page);
        } else {
            self.state = RecorderState::Skipped;
            log::debug!("same session, not recounting, page={}", page);
        }

        self.notify(is_new)
    }

    fn notify(&self, is_new_session: bool) -> VisitEvent {
        let event = VisitEvent {
            total_visits: self.store.read_counter(),
            current_page: self.current_page.clone(),
            is_new_session,
            session_id: self.tracker.current_session_id(),
        };
        for listener in &self.listeners {
            listener(&event);
        }
        event
    }
}

impl VisitRecorderTrait for VisitRecorder {
    fn handle_page_load(&mut self, page: &str, referrer: Option<&str>) -> VisitEvent {
        self.evaluate(page, referrer)
    }

    fn handle_navigation(&mut self, page: &str, referrer: Option<&str>) -> VisitEvent {
        self.evaluate(page, referrer)
    }

    fn check_integrity(&mut self) -> Option<u64> {
        if self.store.read_counter() != 0 {
            return None;
        }
        let max_recorded = self
            .store
            .read_history()
            .iter()
            .map(|v| v.visit_number)
            .max()
            .unwrap_or(0);
        if max_recorded == 0 {
            return None;
        }

        log::info!("counter repaired from history, adopting {}", max_recorded);
        self.store.set_counter_override(max_recorded);
        self.notify(false);
        Some(max_recorded)
    }

    fn set_total_visits(&mut self, value: u64) {
        self.store.set_counter_override(value);
        self.notify(false);
    }

    fn on_visit_updated(&mut self, listener: VisitListener) {
        self.listeners.push(listener);
    }

    fn state(&self) -> RecorderState {
        self.state
    }

    fn current_page(&self) -> &str {
        &self.current_page
    }
}
