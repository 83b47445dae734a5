pub mod agent_core;
pub mod api;
pub mod config;
pub mod connectors;
pub mod engine;
pub mod errors;
pub mod mcp_client;
pub mod memory;
pub mod models;
pub mod runtime;

#[cfg(test)]
pub(crate) mod test_support;

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

pub use errors::{CoordinatorError, ErrorCategory};
pub use runtime::{Runtime, RuntimeSettings};

/// Lock a metadata mutex, recovering the guard if a previous holder panicked.
///
/// Every critical section in this crate leaves its data consistent before
/// anything that can panic, so a poisoned lock carries no torn state.
pub(crate) fn lock_or_recover<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Return the platform-standard data directory for Petting Zoo.
///
/// - macOS: `~/Library/Application Support/petting-zoo/`
/// - Windows: `{FOLDERID_RoamingAppData}\petting-zoo\`
/// - Linux: `$XDG_DATA_HOME/petting-zoo/` (fallback `~/.local/share/...`)
///
/// Falls back to `~/.petting-zoo/` only if none of the above can be resolved.
pub fn data_dir() -> PathBuf {
    if let Some(dir) = dirs::data_dir() {
        return dir.join("petting-zoo");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".petting-zoo")
}

/// Initialize the tracing subscriber, writing structured logs under `log_dir`.
///
/// On each startup:
/// 1. Rotates existing logs (coordinator.log → .1 → .2 → .3, keeps last 3).
/// 2. Opens a fresh coordinator.log with a line-flushing writer.
/// 3. Logs a startup banner with the log path for discoverability.
///
/// Fails if the log file cannot be opened or a global subscriber is
/// already installed.
pub fn init_tracing(log_dir: &Path) -> std::io::Result<PathBuf> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    std::fs::create_dir_all(log_dir)?;
    let log_path = log_dir.join("coordinator.log");

    rotate_log_file(&log_path, 3);

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("petting_zoo_core=info,warn"));

    fmt::fmt()
        .with_env_filter(filter)
        .with_writer(FlushingWriter::new(log_file))
        .with_ansi(false)
        .with_target(true)
        .with_thread_names(true)
        .try_init()
        .map_err(|e| std::io::Error::other(format!("tracing already initialized: {e}")))?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        log_file = %log_path.display(),
        pid = std::process::id(),
        "=== Petting Zoo coordinator starting ==="
    );
    Ok(log_path)
}

/// Rotate log files: `coordinator.log` → `coordinator.log.1` → … → `.{keep}`.
///
/// Oldest file beyond `keep` is deleted. Missing files in the chain are skipped.
fn rotate_log_file(base_path: &Path, keep: u32) {
    let oldest = format!("{}.{keep}", base_path.display());
    let _ = std::fs::remove_file(&oldest);

    for i in (1..keep).rev() {
        let from = format!("{}.{i}", base_path.display());
        let to = format!("{}.{}", base_path.display(), i + 1);
        let _ = std::fs::rename(&from, &to);
    }

    if base_path.exists() {
        let to = format!("{}.1", base_path.display());
        let _ = std::fs::rename(base_path, &to);
    }
}

/// A writer that wraps `std::fs::File` and flushes after every write, so a
/// crash never loses the last log lines.
#[derive(Clone)]
struct FlushingWriter {
    file: std::sync::Arc<Mutex<std::fs::File>>,
}

impl FlushingWriter {
    fn new(file: std::fs::File) -> Self {
        Self {
            file: std::sync::Arc::new(Mutex::new(file)),
        }
    }
}

impl std::io::Write for FlushingWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let mut f = lock_or_recover(&self.file);
        let n = std::io::Write::write(&mut *f, buf)?;
        std::io::Write::flush(&mut *f)?;
        Ok(n)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        std::io::Write::flush(&mut *lock_or_recover(&self.file))
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for FlushingWriter {
    type Writer = FlushingWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
