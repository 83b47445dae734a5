//! SQLite-backed persistent memory for the active engine.
//!
//! Uses `rusqlite` in synchronous mode. WAL mode is enabled so an engine can
//! read memories while another request appends. The connection sits behind a
//! mutex so one handle can be shared (`Arc`) between the coordinator and the
//! engine it is bound to.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use rusqlite::{params, Connection};
use serde::Serialize;

use super::errors::MemoryError;
use crate::lock_or_recover;

/// Shared reference to the memory store, swappable as a unit.
pub type ContextDatabaseHandle = Arc<ContextDatabase>;

// ─── Database ───────────────────────────────────────────────────────────────

/// One stored memory row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemoryRecord {
    pub id: i64,
    pub role: String,
    pub content: String,
    pub created_at: String,
}

/// SQLite handle for the memory store.
pub struct ContextDatabase {
    path: PathBuf,
    conn: Mutex<Option<Connection>>,
}

impl ContextDatabase {
    /// Open (or create) the memory database at the given path.
    ///
    /// Missing parent directories are created. Pass `":memory:"` for an
    /// in-memory database (tests).
    pub fn open(path: &Path) -> Result<Self, MemoryError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| MemoryError::IoError {
                    path: parent.display().to_string(),
                    reason: e.to_string(),
                })?;
            }
        }

        let conn = Connection::open(path)?;

        // Enable WAL mode for concurrent reads
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;

        let db = Self {
            path: path.to_path_buf(),
            conn: Mutex::new(Some(conn)),
        };
        db.create_tables()?;
        Ok(db)
    }

    fn create_tables(&self) -> Result<(), MemoryError> {
        self.with_conn(|conn| {
            conn.execute_batch(
                "
                CREATE TABLE IF NOT EXISTS memories (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    role TEXT NOT NULL,
                    content TEXT NOT NULL,
                    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
                );

                CREATE INDEX IF NOT EXISTS idx_memories_created
                    ON memories(created_at);
                ",
            )?;
            Ok(())
        })
    }

    fn with_conn<T>(
        &self,
        f: impl FnOnce(&Connection) -> Result<T, MemoryError>,
    ) -> Result<T, MemoryError> {
        let guard = lock_or_recover(&self.conn);
        let conn = guard.as_ref().ok_or_else(|| MemoryError::Closed {
            path: self.path.display().to_string(),
        })?;
        f(conn)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_open(&self) -> bool {
        lock_or_recover(&self.conn).is_some()
    }

    // ─── Memories ───────────────────────────────────────────────────────

    /// Append a memory. Returns its row id.
    pub fn remember(&self, role: &str, content: &str) -> Result<i64, MemoryError> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO memories (role, content) VALUES (?1, ?2)",
                params![role, content],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// The most recent `limit` memories, oldest first.
    pub fn recent(&self, limit: usize) -> Result<Vec<MemoryRecord>, MemoryError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, role, content, created_at FROM (
                     SELECT id, role, content, created_at FROM memories
                     ORDER BY id DESC LIMIT ?1
                 ) ORDER BY id ASC",
            )?;
            let rows = stmt.query_map(params![limit as i64], |row| {
                Ok(MemoryRecord {
                    id: row.get(0)?,
                    role: row.get(1)?,
                    content: row.get(2)?,
                    created_at: row.get(3)?,
                })
            })?;
            let mut out = Vec::new();
            for row in rows {
                out.push(row?);
            }
            Ok(out)
        })
    }

    pub fn count(&self) -> Result<u64, MemoryError> {
        self.with_conn(|conn| {
            let n: i64 = conn.query_row("SELECT COUNT(*) FROM memories", [], |row| row.get(0))?;
            Ok(n as u64)
        })
    }

    // ─── Lifecycle ──────────────────────────────────────────────────────

    /// Close the connection. Later calls on this handle fail with `Closed`.
    ///
    /// Closing twice is a no-op.
    pub fn close(&self) -> Result<(), MemoryError> {
        let conn = lock_or_recover(&self.conn).take();
        match conn {
            Some(conn) => conn.close().map_err(|(_, e)| MemoryError::from(e)),
            None => Ok(()),
        }
    }
}

/// Delete a database file and its WAL/SHM siblings. Missing files are fine.
pub fn remove_backing_files(path: &Path) -> Result<(), MemoryError> {
    let base = path.as_os_str().to_os_string();
    let mut wal = base.clone();
    wal.push("-wal");
    let mut shm = base;
    shm.push("-shm");

    for file in [path.to_path_buf(), PathBuf::from(wal), PathBuf::from(shm)] {
        match std::fs::remove_file(&file) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(MemoryError::IoError {
                    path: file.display().to_string(),
                    reason: e.to_string(),
                })
            }
        }
    }
    Ok(())
}

// ─── Opener ─────────────────────────────────────────────────────────────────

/// Opens memory stores. The coordinator goes through this seam so a wipe can
/// be exercised against a store that refuses to reopen.
pub trait ContextStoreOpener: Send + Sync {
    fn open(&self, path: &Path) -> Result<ContextDatabaseHandle, MemoryError>;
}

/// Default opener backed by [`ContextDatabase::open`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SqliteStoreOpener;

impl ContextStoreOpener for SqliteStoreOpener {
    fn open(&self, path: &Path) -> Result<ContextDatabaseHandle, MemoryError> {
        Ok(Arc::new(ContextDatabase::open(path)?))
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
