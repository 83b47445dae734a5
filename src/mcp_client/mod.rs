//! MCP Client: tool server configuration and attach/detach plumbing.
//!
//! This module handles:
//! - Connector transport descriptors (stdio command, streamable HTTP endpoint)
//! - The transport seam an MCP wire implementation plugs into
//! - `ToolServerPool`, the per-engine registry of attached servers and their
//!   discovered tools
//!
//! The wire protocol itself is supplied by the embedding application.

pub mod client;
pub mod errors;
pub mod transport;
pub mod types;

// Re-exports for convenience
pub use client::ToolServerPool;
pub use errors::McpError;
pub use transport::{ToolTransport, ToolTransportFactory};
pub use types::{
    ToolDescriptor, ToolServerConfig, ToolServerSummary, TransportDescriptor,
    DEFAULT_PROTOCOL_VERSION,
};
