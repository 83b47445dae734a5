//! Coordinator error taxonomy.
//!
//! Every operation the coordinator exposes returns `Result<T, CoordinatorError>`.
//! Each variant maps to a stable wire code and one of five categories; the
//! category decides the HTTP status hint and whether a retry is advisable.

use serde::Serialize;
use thiserror::Error;

use crate::engine::EngineError;
use crate::memory::MemoryError;

// ─── Category ────────────────────────────────────────────────────────────────

/// Coarse classification shared by every error the coordinator returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Validation,
    NotFound,
    Conflict,
    Upstream,
    Internal,
}

impl ErrorCategory {
    /// HTTP status the transport layer should answer with.
    pub fn http_status(self) -> u16 {
        match self {
            ErrorCategory::Validation => 400,
            ErrorCategory::NotFound => 404,
            ErrorCategory::Conflict => 409,
            ErrorCategory::Upstream => 502,
            ErrorCategory::Internal => 500,
        }
    }

    /// Advisory only: the coordinator never retries on its own.
    pub fn is_retryable(self) -> bool {
        matches!(self, ErrorCategory::Conflict | ErrorCategory::Upstream)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCategory::Validation => "validation",
            ErrorCategory::NotFound => "not_found",
            ErrorCategory::Conflict => "conflict",
            ErrorCategory::Upstream => "upstream",
            ErrorCategory::Internal => "internal",
        }
    }
}

// ─── CoordinatorError ────────────────────────────────────────────────────────

/// Errors returned by the model registry, agent coordinator and connector registry.
#[derive(Debug, Error)]
pub enum CoordinatorError {
    /// Caller-supplied input failed a precondition.
    #[error("{message}")]
    InvalidInput { message: String },

    /// A registered model's backing file is gone.
    #[error("Model path is no longer available: {path}")]
    ModelFileMissing { model_id: String, path: String },

    #[error("Model not found: '{model_id}'")]
    ModelNotFound { model_id: String },

    #[error("Connector not found: '{connector_id}'")]
    ConnectorNotFound { connector_id: String },

    /// Chat, reset and connector operations need a loaded engine.
    #[error("No active model is loaded")]
    NoActiveModel,

    #[error("Connector ID already exists: '{connector_id}'")]
    ConnectorExists { connector_id: String },

    #[error("Connector '{connector_id}' is already connected")]
    ConnectorAlreadyConnected { connector_id: String },

    #[error("Connector '{connector_id}' is not connected")]
    ConnectorNotConnected { connector_id: String },

    /// The inference engine failed to load or generate.
    #[error("inference engine failure: {reason}")]
    EngineFailure { reason: String },

    /// A tool server could not be attached, detached or queried.
    #[error("tool server '{connector_id}' failure: {reason}")]
    ToolServerFailure { connector_id: String, reason: String },

    /// The persistent memory store could not be recreated.
    #[error("Failed to recreate memory database: {reason}")]
    MemoryUnavailable { reason: String },

    /// The streaming worker thread could not be started.
    #[error("failed to spawn stream worker: {reason}")]
    WorkerSpawn { reason: String },
}

impl CoordinatorError {
    pub fn invalid(message: impl Into<String>) -> Self {
        CoordinatorError::InvalidInput {
            message: message.into(),
        }
    }

    /// Stable wire code.
    pub fn code(&self) -> &'static str {
        match self {
            CoordinatorError::InvalidInput { .. } | CoordinatorError::ModelFileMissing { .. } => {
                "APP-VAL-001"
            }
            CoordinatorError::ModelNotFound { .. } => "APP-MOD-404",
            CoordinatorError::ConnectorNotFound { .. } => "APP-MCP-404",
            CoordinatorError::NoActiveModel => "APP-STATE-409",
            CoordinatorError::ConnectorExists { .. }
            | CoordinatorError::ConnectorAlreadyConnected { .. }
            | CoordinatorError::ConnectorNotConnected { .. } => "APP-MCP-409",
            CoordinatorError::EngineFailure { .. } => "APP-UPSTREAM-001",
            CoordinatorError::ToolServerFailure { .. } => "APP-UPSTREAM-002",
            CoordinatorError::MemoryUnavailable { .. } => "APP-DB-500",
            CoordinatorError::WorkerSpawn { .. } => "APP-INT-500",
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            CoordinatorError::InvalidInput { .. } | CoordinatorError::ModelFileMissing { .. } => {
                ErrorCategory::Validation
            }
            CoordinatorError::ModelNotFound { .. } | CoordinatorError::ConnectorNotFound { .. } => {
                ErrorCategory::NotFound
            }
            CoordinatorError::NoActiveModel
            | CoordinatorError::ConnectorExists { .. }
            | CoordinatorError::ConnectorAlreadyConnected { .. }
            | CoordinatorError::ConnectorNotConnected { .. } => ErrorCategory::Conflict,
            CoordinatorError::EngineFailure { .. } | CoordinatorError::ToolServerFailure { .. } => {
                ErrorCategory::Upstream
            }
            CoordinatorError::MemoryUnavailable { .. } | CoordinatorError::WorkerSpawn { .. } => {
                ErrorCategory::Internal
            }
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.category().is_retryable()
    }

    /// Structured context attached to the error envelope, when there is any.
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            CoordinatorError::ModelFileMissing { model_id, path } => {
                Some(serde_json::json!({ "model_id": model_id, "path": path }))
            }
            CoordinatorError::ModelNotFound { model_id } => {
                Some(serde_json::json!({ "model_id": model_id }))
            }
            CoordinatorError::ConnectorNotFound { connector_id }
            | CoordinatorError::ConnectorExists { connector_id }
            | CoordinatorError::ConnectorAlreadyConnected { connector_id }
            | CoordinatorError::ConnectorNotConnected { connector_id }
            | CoordinatorError::ToolServerFailure { connector_id, .. } => {
                Some(serde_json::json!({ "connector_id": connector_id }))
            }
            _ => None,
        }
    }
}

impl From<EngineError> for CoordinatorError {
    fn from(e: EngineError) -> Self {
        CoordinatorError::EngineFailure {
            reason: e.to_string(),
        }
    }
}

impl From<MemoryError> for CoordinatorError {
    fn from(e: MemoryError) -> Self {
        CoordinatorError::MemoryUnavailable {
            reason: e.to_string(),
        }
    }
}
