// Visitrack services
// Services provide the sync machinery: pure snapshot merging, the remote
// transport, and the reconciliation loop.

pub mod merge_engine;
pub mod remote_store;
pub mod remote_sync;
