//! Tool server error types.

use thiserror::Error;

/// Errors that can occur while attaching, querying or detaching tool servers.
#[derive(Debug, Error)]
pub enum McpError {
    /// The transport could not be created or the handshake failed.
    #[error("failed to connect server '{server}': {reason}")]
    ConnectFailed { server: String, reason: String },

    /// I/O or framing failure on an established transport.
    #[error("transport error for server '{server}': {reason}")]
    TransportError { server: String, reason: String },

    /// `tools/list` failed or returned something unusable.
    #[error("tool discovery failed for server '{server}': {reason}")]
    DiscoveryFailed { server: String, reason: String },

    /// No server with this id is attached.
    #[error("unknown server: '{server}'")]
    UnknownServer { server: String },

    /// The server config is unusable (empty command, empty endpoint).
    #[error("config error: {reason}")]
    ConfigError { reason: String },
}

impl McpError {
    pub fn is_unknown_server(&self) -> bool {
        matches!(self, McpError::UnknownServer { .. })
    }
}
