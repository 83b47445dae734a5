//! Transport seam for tool servers.
//!
//! The wire protocol lives outside this crate. A transport implementation
//! owns one connection (a child process for stdio, a session for HTTP) and
//! answers the handful of calls the server pool needs.

use super::errors::McpError;
use super::types::{ToolDescriptor, ToolServerConfig, TransportDescriptor};

/// One live connection to a tool server.
pub trait ToolTransport: Send {
    /// Open the connection and run the initialize handshake.
    fn connect(&mut self) -> Result<(), McpError>;

    /// Close the connection. Closing an already closed transport is a no-op.
    fn disconnect(&mut self) -> Result<(), McpError>;

    /// Run `tools/list` against the connected server.
    fn discover_tools(&mut self) -> Result<Vec<ToolDescriptor>, McpError>;

    fn is_connected(&self) -> bool;
}

/// Builds transports from server configs.
pub trait ToolTransportFactory: Send + Sync {
    fn create(&self, config: &ToolServerConfig) -> Result<Box<dyn ToolTransport>, McpError>;
}

/// Reject configs no transport could ever connect with.
pub fn validate_config(config: &ToolServerConfig) -> Result<(), McpError> {
    if config.server_id.trim().is_empty() {
        return Err(McpError::ConfigError {
            reason: "server_id must not be empty".into(),
        });
    }
    match &config.transport {
        TransportDescriptor::Stdio { command, .. } if command.trim().is_empty() => {
            Err(McpError::ConfigError {
                reason: format!("server '{}': stdio command is empty", config.server_id),
            })
        }
        TransportDescriptor::HttpStream { endpoint } if endpoint.trim().is_empty() => {
            Err(McpError::ConfigError {
                reason: format!("server '{}': http endpoint is empty", config.server_id),
            })
        }
        _ => Ok(()),
    }
}
