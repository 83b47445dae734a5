//! Memory store error types.

use thiserror::Error;

/// Errors that can occur while opening, using or wiping the memory store.
#[derive(Debug, Error)]
pub enum MemoryError {
    /// SQLite operation failed.
    #[error("database error: {reason}")]
    DatabaseError { reason: String },

    /// Filesystem operation on the backing files failed.
    #[error("io error on {path}: {reason}")]
    IoError { path: String, reason: String },

    /// The handle was closed by a memory wipe.
    #[error("memory database at {path} is closed")]
    Closed { path: String },
}

impl From<rusqlite::Error> for MemoryError {
    fn from(e: rusqlite::Error) -> Self {
        MemoryError::DatabaseError {
            reason: e.to_string(),
        }
    }
}
