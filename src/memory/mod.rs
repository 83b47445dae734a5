//! Persistent memory store shared with the active engine.
//!
//! Submodules:
//! - `database`: SQLite handle, backing-file removal, opener seam
//! - `errors`: memory-level error types

pub mod database;
pub mod errors;

// Re-exports for convenience
pub use database::{
    remove_backing_files, ContextDatabase, ContextDatabaseHandle, ContextStoreOpener,
    MemoryRecord, SqliteStoreOpener,
};
pub use errors::MemoryError;
