//! Tool server pool: the attach/detach bookkeeping an engine embeds.
//!
//! An inference engine implementation owns one `ToolServerPool` and forwards
//! its `add_tool_server` / `remove_tool_server` / `get_tool_server` /
//! `discover_tools` calls here. The pool keeps one transport per server id
//! and caches the last discovered tool list.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use super::errors::McpError;
use super::transport::{validate_config, ToolTransport, ToolTransportFactory};
use super::types::{ToolDescriptor, ToolServerConfig, ToolServerSummary};
use crate::lock_or_recover;

// ─── ToolServerPool ──────────────────────────────────────────────────────────

struct ManagedServer {
    config: ToolServerConfig,
    transport: Box<dyn ToolTransport>,
    tools: Vec<ToolDescriptor>,
}

/// Attached tool servers keyed by server id.
pub struct ToolServerPool {
    factory: Arc<dyn ToolTransportFactory>,
    servers: Mutex<HashMap<String, ManagedServer>>,
}

impl ToolServerPool {
    pub fn new(factory: Arc<dyn ToolTransportFactory>) -> Self {
        Self {
            factory,
            servers: Mutex::new(HashMap::new()),
        }
    }

    // ─── Lifecycle ───────────────────────────────────────────────────────

    /// Connect a server and run initial discovery.
    ///
    /// An existing server with the same id is disconnected and replaced.
    /// Nothing is stored unless both the handshake and discovery succeed.
    pub fn add(&self, config: ToolServerConfig) -> Result<ToolServerSummary, McpError> {
        validate_config(&config)?;
        let start = Instant::now();

        let mut transport = self.factory.create(&config)?;
        transport.connect()?;
        let tools = match transport.discover_tools() {
            Ok(tools) => tools,
            Err(e) => {
                let _ = transport.disconnect();
                return Err(e);
            }
        };

        let server_id = config.server_id.clone();
        let summary = ToolServerSummary {
            server_id: server_id.clone(),
            connected: transport.is_connected(),
            discovered_tool_count: tools.len(),
        };

        let previous = lock_or_recover(&self.servers).insert(
            server_id.clone(),
            ManagedServer {
                config,
                transport,
                tools,
            },
        );
        if let Some(mut old) = previous {
            let _ = old.transport.disconnect();
        }

        tracing::info!(
            server = %server_id,
            tools = summary.discovered_tool_count,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "tool server attached"
        );
        Ok(summary)
    }

    /// Disconnect and forget a server.
    pub fn remove(&self, server_id: &str) -> Result<(), McpError> {
        let removed = lock_or_recover(&self.servers).remove(server_id);
        let mut server = removed.ok_or_else(|| McpError::UnknownServer {
            server: server_id.to_string(),
        })?;
        server.transport.disconnect()?;
        tracing::info!(server = %server_id, "tool server detached");
        Ok(())
    }

    /// Disconnect every server. Errors are logged and swallowed.
    pub fn shutdown_all(&self) {
        let drained: Vec<(String, ManagedServer)> =
            lock_or_recover(&self.servers).drain().collect();
        for (id, mut server) in drained {
            if let Err(e) = server.transport.disconnect() {
                tracing::warn!(server = %id, error = %e, "tool server disconnect failed");
            }
        }
    }

    // ─── Discovery ───────────────────────────────────────────────────────

    /// Re-run `tools/list` and replace the cached tool list.
    pub fn discover(&self, server_id: &str) -> Result<Vec<ToolDescriptor>, McpError> {
        let mut servers = lock_or_recover(&self.servers);
        let server = servers
            .get_mut(server_id)
            .ok_or_else(|| McpError::UnknownServer {
                server: server_id.to_string(),
            })?;
        if !server.transport.is_connected() {
            return Err(McpError::TransportError {
                server: server_id.to_string(),
                reason: "transport is not connected".into(),
            });
        }
        let tools = server.transport.discover_tools()?;
        server.tools = tools.clone();
        Ok(tools)
    }

    // ─── Status ──────────────────────────────────────────────────────────

    pub fn summary(&self, server_id: &str) -> Option<ToolServerSummary> {
        lock_or_recover(&self.servers)
            .get(server_id)
            .map(|server| ToolServerSummary {
                server_id: server.config.server_id.clone(),
                connected: server.transport.is_connected(),
                discovered_tool_count: server.tools.len(),
            })
    }

    /// Cached tools from the last successful discovery.
    pub fn tools(&self, server_id: &str) -> Option<Vec<ToolDescriptor>> {
        lock_or_recover(&self.servers)
            .get(server_id)
            .map(|server| server.tools.clone())
    }

    pub fn len(&self) -> usize {
        lock_or_recover(&self.servers).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// An engine dropped on unload or replace takes its tool servers down with it.
impl Drop for ToolServerPool {
    fn drop(&mut self) {
        if !self.is_empty() {
            tracing::info!(servers = self.len(), "shutting down tool servers");
            self.shutdown_all();
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
