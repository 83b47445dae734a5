//! Model catalog types.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Context window assigned to a model when neither registration nor
/// configuration names one.
pub const DEFAULT_CONTEXT_SIZE: u32 = 8192;

/// Whether a model's backing file is present right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelStatus {
    Available,
    Unavailable,
}

impl ModelStatus {
    /// Probe the filesystem.
    pub fn of(path: &std::path::Path) -> Self {
        if path.is_file() {
            ModelStatus::Available
        } else {
            ModelStatus::Unavailable
        }
    }
}

/// A known model file.
///
/// `status` is derived: the registry recomputes it on every read and never
/// trusts a stored value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelEntry {
    pub id: String,
    pub display_name: String,
    pub path: PathBuf,
    pub status: ModelStatus,
    pub context_size: u32,
    pub file_size_bytes: u64,
}

impl ModelEntry {
    /// Copy of this entry with `status` recomputed.
    pub fn with_live_status(&self) -> Self {
        Self {
            status: ModelStatus::of(&self.path),
            ..self.clone()
        }
    }
}

/// Input to `ModelRegistry::register`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RegisterModel {
    pub path: PathBuf,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub context_size: Option<u32>,
}

impl RegisterModel {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn context_size(mut self, size: u32) -> Self {
        self.context_size = Some(size);
        self
    }
}
