use std::fmt;

// === StorageError ===

/// Errors raised by storage backends.
///
/// These never escape the `LocalStore` surface: callers there absorb them
/// into no-ops with a logged warning, since local durability is best-effort.
#[derive(Debug)]
pub enum StorageError {
    /// The underlying backend (SQLite, in-memory map) failed.
    Backend(String),
    /// A stored value could not be serialized or deserialized.
    Serialization(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::Backend(msg) => write!(f, "Storage backend error: {}", msg),
            StorageError::Serialization(msg) => {
                write!(f, "Storage serialization error: {}", msg)
            }
        }
    }
}

impl std::error::Error for StorageError {}

// === SyncError ===

/// Errors related to remote store synchronization.
#[derive(Debug)]
pub enum SyncError {
    /// Remote credentials are missing or still placeholders.
    NotConfigured,
    /// A transport-level failure (connect, timeout, TLS).
    Network(String),
    /// The remote answered with a non-success HTTP status.
    HttpStatus(u16),
    /// The remote document exists but does not parse as a valid snapshot.
    InvalidDocument(String),
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncError::NotConfigured => write!(f, "Remote store is not configured"),
            SyncError::Network(msg) => write!(f, "Sync network error: {}", msg),
            SyncError::HttpStatus(code) => write!(f, "Sync HTTP error: status {}", code),
            SyncError::InvalidDocument(msg) => {
                write!(f, "Invalid remote document: {}", msg)
            }
        }
    }
}

impl std::error::Error for SyncError {}
