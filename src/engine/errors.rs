//! Inference engine error types.
//!
//! Structured logging is the caller's responsibility. These types carry the
//! context needed to build meaningful log entries.

use thiserror::Error;

use crate::mcp_client::McpError;

/// Errors an engine implementation reports back to the coordinator.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The model could not be loaded into a new engine instance.
    #[error("failed to load model {model_path}: {reason}")]
    LoadFailed { model_path: String, reason: String },

    /// Generation failed mid-turn.
    #[error("generation failed: {reason}")]
    GenerationFailed { reason: String },

    /// A tool server could not be attached, queried or detached.
    #[error("tool server '{server_id}': {reason}")]
    ToolServer { server_id: String, reason: String },

    /// The engine has no tool server with this id.
    #[error("unknown tool server: '{server_id}'")]
    UnknownToolServer { server_id: String },
}

impl EngineError {
    pub fn is_unknown_tool_server(&self) -> bool {
        matches!(self, EngineError::UnknownToolServer { .. })
    }
}

impl From<McpError> for EngineError {
    fn from(e: McpError) -> Self {
        match e {
            McpError::UnknownServer { server } => EngineError::UnknownToolServer { server_id: server },
            McpError::ConnectFailed { server, reason }
            | McpError::TransportError { server, reason }
            | McpError::DiscoveryFailed { server, reason } => EngineError::ToolServer {
                server_id: server,
                reason,
            },
            McpError::ConfigError { reason } => EngineError::ToolServer {
                server_id: String::new(),
                reason,
            },
        }
    }
}
