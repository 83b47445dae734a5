//! Shared types for tool servers.
//!
//! Configuration handed to an engine when a connector attaches, and the
//! structures an engine reports back about attached servers.

use serde::{Deserialize, Serialize};

/// MCP protocol revision used when a connector does not name one.
pub const DEFAULT_PROTOCOL_VERSION: &str = "2025-06-18";

// ─── Transport ───────────────────────────────────────────────────────────────

/// How a tool server is reached.
///
/// Serialized with an inline `transport` tag so a connector renders as
/// `{"transport": "stdio", "command": ..., "args": [...]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "transport", rename_all = "snake_case")]
pub enum TransportDescriptor {
    /// Child process speaking JSON-RPC over stdin/stdout.
    Stdio {
        command: String,
        #[serde(default)]
        args: Vec<String>,
    },
    /// Streamable HTTP endpoint.
    HttpStream { endpoint: String },
}

impl TransportDescriptor {
    pub fn stdio(command: impl Into<String>, args: Vec<String>) -> Self {
        TransportDescriptor::Stdio {
            command: command.into(),
            args,
        }
    }

    pub fn http_stream(endpoint: impl Into<String>) -> Self {
        TransportDescriptor::HttpStream {
            endpoint: endpoint.into(),
        }
    }

    /// Wire name of the transport kind.
    pub fn kind(&self) -> &'static str {
        match self {
            TransportDescriptor::Stdio { .. } => "stdio",
            TransportDescriptor::HttpStream { .. } => "http_stream",
        }
    }
}

// ─── Server Config ───────────────────────────────────────────────────────────

/// Everything an engine needs to attach one tool server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolServerConfig {
    pub server_id: String,
    #[serde(flatten)]
    pub transport: TransportDescriptor,
    #[serde(default = "default_protocol_version")]
    pub protocol_version: String,
}

fn default_protocol_version() -> String {
    DEFAULT_PROTOCOL_VERSION.to_string()
}

// ─── Discovery ───────────────────────────────────────────────────────────────

/// A tool advertised by a server's `tools/list`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, alias = "inputSchema")]
    pub input_schema: serde_json::Value,
}

/// What an engine reports about one attached server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolServerSummary {
    pub server_id: String,
    pub connected: bool,
    pub discovered_tool_count: usize,
}
