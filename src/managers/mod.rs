// Visitrack state managers
// Managers handle stateful bookkeeping: session identity, durable visit data, and recording.

pub mod local_store;
pub mod session_tracker;
pub mod visit_recorder;
