//! Coordinator configuration loading.
//!
//! Reads `petting-zoo.yaml` and resolves environment variables. Every field
//! is optional; a missing file yields the defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::connectors::ConnectorSpec;
use crate::mcp_client::DEFAULT_PROTOCOL_VERSION;
use crate::models::{RegisterModel, DEFAULT_CONTEXT_SIZE};

/// File name searched for when no explicit path is given.
pub const CONFIG_FILE_NAME: &str = "petting-zoo.yaml";

/// Env var naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "PETTING_ZOO_CONFIG";

// ─── Errors ──────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config not found: {reason}")]
    NotFound { reason: String },

    #[error("failed to read {path}: {reason}")]
    ReadFailed { path: String, reason: String },

    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },
}

// ─── Public Types ────────────────────────────────────────────────────────────

/// Engine construction parameters.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EngineSection {
    #[serde(default = "default_context_size")]
    pub default_context_size: u32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            default_context_size: default_context_size(),
            max_tokens: default_max_tokens(),
        }
    }
}

fn default_context_size() -> u32 {
    DEFAULT_CONTEXT_SIZE
}
fn default_max_tokens() -> u32 {
    crate::agent_core::DEFAULT_MAX_TOKENS
}

/// Persistent memory store settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MemorySection {
    /// Defaults to `<data_dir>/memory.db`.
    #[serde(default)]
    pub db_path: Option<PathBuf>,
}

/// Top-level configuration (mirrors `petting-zoo.yaml`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub engine: EngineSection,
    #[serde(default)]
    pub memory: MemorySection,
    /// Protocol version given to connectors that do not name one.
    #[serde(default = "default_protocol_version")]
    pub protocol_version: String,
    /// Model files registered at startup. Failures are logged and skipped.
    #[serde(default)]
    pub models: Vec<RegisterModel>,
    /// Connectors added at startup, disconnected.
    #[serde(default)]
    pub connectors: Vec<ConnectorSpec>,
    /// Model id selected at startup, if any.
    #[serde(default)]
    pub active_model: Option<String>,
}

fn default_protocol_version() -> String {
    DEFAULT_PROTOCOL_VERSION.to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            engine: EngineSection::default(),
            memory: MemorySection::default(),
            protocol_version: default_protocol_version(),
            models: Vec::new(),
            connectors: Vec::new(),
            active_model: None,
        }
    }
}

impl AppConfig {
    /// Resolved memory database path.
    pub fn memory_db_path(&self) -> PathBuf {
        self.memory
            .db_path
            .clone()
            .unwrap_or_else(|| crate::data_dir().join("memory.db"))
    }
}

// ─── Loading ─────────────────────────────────────────────────────────────────

/// Locate the config file.
///
/// Checks `PETTING_ZOO_CONFIG` first, then searches upward from `start` for
/// `petting-zoo.yaml`.
pub fn find_config_path(start: &Path) -> Result<PathBuf, ConfigError> {
    if let Ok(explicit) = std::env::var(CONFIG_ENV_VAR) {
        let candidate = PathBuf::from(expand_tilde(&explicit));
        if candidate.is_file() {
            return Ok(candidate);
        }
        tracing::warn!(path = %candidate.display(), "{CONFIG_ENV_VAR} points at a missing file");
    }

    let mut dir = start.to_path_buf();
    loop {
        let candidate = dir.join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            return Ok(candidate);
        }
        if !dir.pop() {
            break;
        }
    }

    Err(ConfigError::NotFound {
        reason: format!("could not find {CONFIG_FILE_NAME}"),
    })
}

/// Load and parse a configuration file.
///
/// Performs environment-variable interpolation on `${VAR_NAME}` and
/// `${VAR_NAME:-default}`, then expands a leading `~` in every path field.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    parse_config(&raw)
}

/// Parse configuration text.
pub fn parse_config(raw: &str) -> Result<AppConfig, ConfigError> {
    let interpolated = interpolate_env_vars(raw);
    if interpolated.trim().is_empty() {
        return Ok(AppConfig::default());
    }

    let mut config: AppConfig =
        serde_yaml::from_str(&interpolated).map_err(|e| ConfigError::ParseFailed {
            reason: e.to_string(),
        })?;

    if let Some(db_path) = config.memory.db_path.take() {
        config.memory.db_path = Some(expand_tilde_path(&db_path));
    }
    for model in &mut config.models {
        model.path = expand_tilde_path(&model.path);
    }
    Ok(config)
}

/// Find and load the config, falling back to defaults when there is none.
///
/// A file that exists but fails to parse is still an error.
pub fn load_or_default(start: &Path) -> Result<AppConfig, ConfigError> {
    match find_config_path(start) {
        Ok(path) => {
            let config = load_config(&path)?;
            tracing::info!(path = %path.display(), "configuration loaded");
            Ok(config)
        }
        Err(ConfigError::NotFound { .. }) => {
            tracing::info!("no configuration file found, using defaults");
            Ok(AppConfig::default())
        }
        Err(e) => Err(e),
    }
}

// ─── Env-var interpolation ───────────────────────────────────────────────────

/// Replace `${VAR}` and `${VAR:-default}` in a string.
fn interpolate_env_vars(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && chars.peek() == Some(&'{') {
            chars.next();
            let mut var_expr = String::new();
            for c in chars.by_ref() {
                if c == '}' {
                    break;
                }
                var_expr.push(c);
            }
            result.push_str(&resolve_var_expr(&var_expr));
        } else {
            result.push(ch);
        }
    }

    result
}

fn resolve_var_expr(expr: &str) -> String {
    match expr.split_once(":-") {
        Some((name, default)) => std::env::var(name).unwrap_or_else(|_| expand_tilde(default)),
        None => std::env::var(expr).unwrap_or_default(),
    }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &str) -> String {
    if let Some(rest) = path.strip_prefix('~') {
        if let Some(home) = dirs::home_dir() {
            return format!("{}{rest}", home.display());
        }
    }
    path.to_string()
}

fn expand_tilde_path(path: &Path) -> PathBuf {
    match path.to_str() {
        Some(s) => PathBuf::from(expand_tilde(s)),
        None => path.to_path_buf(),
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
