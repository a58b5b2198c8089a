//! Storage areas for visitrack.
//!
//! Durable state (counter, history, last session id) and ephemeral per-tab
//! state (the session descriptor) both live behind the [`StorageArea`]
//! interface, so the durable SQLite backend and the in-memory backend are
//! interchangeable and tests can run entirely in memory.

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStorage;
pub use sqlite::SqliteStorage;

use crate::types::errors::StorageError;

/// A flat string-keyed storage area.
///
/// Mirrors the host environment's storage surface: get/set/remove by key,
/// values are opaque strings. Implementations must be safe to share between
/// the page-load path and the sync timer.
pub trait StorageArea: Send + Sync {
    /// Returns the stored value for `key`, or `None` if absent.
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Stores `value` under `key`, overwriting any previous value.
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removes `key` if present. Removing an absent key is not an error.
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;
}
