//! Connector Registry: tool connector definitions and their live state.
//!
//! Every call that reaches into the engine goes through
//! `AgentCoordinator::with_engine`, which holds the operation lock. Status
//! updates happen inside that window so they cannot interleave with another
//! connect or disconnect of the same connector.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::templates::{builtin_templates, first_failure, validation_checks};
use super::types::{
    now_millis, ConnectorEntry, ConnectorSpec, ConnectorStatus, ConnectorTemplate, ValidationCheck,
};
use crate::agent_core::AgentCoordinator;
use crate::engine::{EngineError, InferenceEngine};
use crate::errors::CoordinatorError;
use crate::lock_or_recover;
use crate::mcp_client::{ToolDescriptor, ToolServerSummary, DEFAULT_PROTOCOL_VERSION};

pub struct ConnectorRegistry {
    coordinator: Arc<AgentCoordinator>,
    connectors: Mutex<HashMap<String, ConnectorEntry>>,
    default_protocol_version: String,
}

impl ConnectorRegistry {
    pub fn new(coordinator: Arc<AgentCoordinator>) -> Self {
        Self::with_protocol_version(coordinator, DEFAULT_PROTOCOL_VERSION)
    }

    pub fn with_protocol_version(
        coordinator: Arc<AgentCoordinator>,
        default_protocol_version: impl Into<String>,
    ) -> Self {
        Self {
            coordinator,
            connectors: Mutex::new(HashMap::new()),
            default_protocol_version: default_protocol_version.into(),
        }
    }

    // ─── Catalog ─────────────────────────────────────────────────────────

    /// Every connector, newest first.
    pub fn list(&self) -> Vec<ConnectorEntry> {
        let mut out: Vec<ConnectorEntry> =
            lock_or_recover(&self.connectors).values().cloned().collect();
        out.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        out
    }

    pub fn get(&self, id: &str) -> Result<ConnectorEntry, CoordinatorError> {
        lock_or_recover(&self.connectors)
            .get(id)
            .cloned()
            .ok_or_else(|| not_found(id))
    }

    /// Tools found by the last successful discovery.
    pub fn list_tools(&self, id: &str) -> Result<Vec<ToolDescriptor>, CoordinatorError> {
        self.get(id).map(|entry| entry.tools)
    }

    pub fn templates(&self) -> Vec<ConnectorTemplate> {
        builtin_templates()
    }

    pub fn validate(&self, spec: &ConnectorSpec) -> Vec<ValidationCheck> {
        validation_checks(spec)
    }

    pub fn add(&self, spec: ConnectorSpec) -> Result<ConnectorEntry, CoordinatorError> {
        if let Some(failed) = first_failure(&spec) {
            return Err(CoordinatorError::invalid(failed.message));
        }

        let now = now_millis();
        let entry = ConnectorEntry {
            id: spec.id.trim().to_string(),
            name: spec.name.filter(|n| !n.trim().is_empty()),
            transport: spec.transport,
            protocol_version: spec
                .protocol_version
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| self.default_protocol_version.clone()),
            status: ConnectorStatus::Disconnected,
            created_at: now,
            updated_at: now,
            discovered_tool_count: 0,
            tools: Vec::new(),
            last_error: None,
        };

        let mut connectors = lock_or_recover(&self.connectors);
        if connectors.contains_key(&entry.id) {
            return Err(CoordinatorError::ConnectorExists {
                connector_id: entry.id,
            });
        }
        connectors.insert(entry.id.clone(), entry.clone());
        drop(connectors);

        tracing::info!(
            connector_id = %entry.id,
            transport = entry.transport.kind(),
            "connector added"
        );
        Ok(entry)
    }

    /// Delete a connector, detaching it from the active engine first.
    /// Detach failures are ignored.
    pub fn remove(&self, id: &str) -> Result<ConnectorEntry, CoordinatorError> {
        self.get(id)?;

        self.coordinator.with_engine(|engine| {
            if let Err(e) = engine.remove_tool_server(id) {
                if !e.is_unknown_tool_server() {
                    tracing::warn!(connector_id = %id, error = %e, "detach on remove failed");
                }
            }
        });

        let removed = lock_or_recover(&self.connectors)
            .remove(id)
            .ok_or_else(|| not_found(id))?;
        tracing::info!(connector_id = %id, "connector removed");
        Ok(removed)
    }

    // ─── Lifecycle ───────────────────────────────────────────────────────

    /// Attach a connector to the active engine and discover its tools.
    ///
    /// On failure the connector is kept, marked degraded. A connector still
    /// marked connected whose server is gone from the active engine (the
    /// engine was replaced or unloaded) is attached again.
    pub fn connect(&self, id: &str) -> Result<ToolServerSummary, CoordinatorError> {
        self.get(id)?;

        let outcome = self.coordinator.with_engine(|engine| {
            // Checked under the operation lock; a concurrent connect may have won.
            let entry = self.get(id)?;
            if entry.status == ConnectorStatus::Connected {
                if engine.get_tool_server(id).is_some() {
                    return Err(CoordinatorError::ConnectorAlreadyConnected {
                        connector_id: id.to_string(),
                    });
                }
                tracing::info!(connector_id = %id, "stale connection, reattaching");
            }

            match attach(engine, &entry) {
                Ok((summary, tools)) => {
                    self.update(id, |e| {
                        e.discovered_tool_count = tools.len();
                        e.tools = tools;
                        e.last_error = None;
                        e.transition(ConnectorStatus::Connected);
                    })?;
                    tracing::info!(
                        connector_id = %id,
                        tools = summary.discovered_tool_count,
                        "connector connected"
                    );
                    Ok(summary)
                }
                Err(e) => Err(self.demote(id, e)),
            }
        });

        outcome.unwrap_or(Err(CoordinatorError::NoActiveModel))
    }

    /// Detach a connector. Idempotent; with no engine loaded the connector
    /// is simply marked disconnected.
    pub fn disconnect(&self, id: &str) -> Result<ConnectorEntry, CoordinatorError> {
        self.get(id)?;

        let outcome = self.coordinator.with_engine(|engine| {
            match engine.remove_tool_server(id) {
                Ok(()) => {}
                Err(e) if e.is_unknown_tool_server() => {}
                Err(e) => {
                    tracing::warn!(connector_id = %id, error = %e, "disconnect failed");
                    return Err(CoordinatorError::ToolServerFailure {
                        connector_id: id.to_string(),
                        reason: e.to_string(),
                    });
                }
            }
            self.mark_disconnected(id)
        });

        match outcome {
            Some(result) => result,
            None => self.mark_disconnected(id),
        }
    }

    /// Re-run tool discovery on a connected connector.
    ///
    /// Failure demotes it to degraded.
    pub fn refresh_tools(&self, id: &str) -> Result<Vec<ToolDescriptor>, CoordinatorError> {
        let entry = self.get(id)?;
        if entry.status != ConnectorStatus::Connected {
            return Err(CoordinatorError::ConnectorNotConnected {
                connector_id: id.to_string(),
            });
        }

        let outcome = self.coordinator.with_engine(|engine| {
            let entry = self.get(id)?;
            if entry.status != ConnectorStatus::Connected {
                return Err(CoordinatorError::ConnectorNotConnected {
                    connector_id: id.to_string(),
                });
            }

            match engine.discover_tools(id) {
                Ok(tools) => {
                    self.update(id, |e| {
                        e.discovered_tool_count = tools.len();
                        e.tools = tools.clone();
                        e.updated_at = now_millis();
                    })?;
                    tracing::info!(connector_id = %id, tools = tools.len(), "tools refreshed");
                    Ok(tools)
                }
                Err(e) => Err(self.demote(id, e)),
            }
        });

        outcome.unwrap_or(Err(CoordinatorError::NoActiveModel))
    }

    // ─── Internals ───────────────────────────────────────────────────────

    fn update(
        &self,
        id: &str,
        f: impl FnOnce(&mut ConnectorEntry),
    ) -> Result<ConnectorEntry, CoordinatorError> {
        let mut connectors = lock_or_recover(&self.connectors);
        let entry = connectors.get_mut(id).ok_or_else(|| not_found(id))?;
        f(entry);
        Ok(entry.clone())
    }

    fn demote(&self, id: &str, err: EngineError) -> CoordinatorError {
        let reason = err.to_string();
        tracing::warn!(connector_id = %id, error = %reason, "connector degraded");
        // A connector removed in the meantime has nothing left to demote.
        let _ = self.update(id, |e| {
            e.last_error = Some(reason.clone());
            e.transition(ConnectorStatus::Degraded);
        });
        CoordinatorError::ToolServerFailure {
            connector_id: id.to_string(),
            reason,
        }
    }

    fn mark_disconnected(&self, id: &str) -> Result<ConnectorEntry, CoordinatorError> {
        let entry = self.update(id, |e| {
            if e.status != ConnectorStatus::Disconnected {
                e.tools.clear();
                e.discovered_tool_count = 0;
                e.transition(ConnectorStatus::Disconnected);
            }
        })?;
        tracing::info!(connector_id = %id, "connector disconnected");
        Ok(entry)
    }
}

/// Attach, confirm, and read back the tool list. A server attached but not
/// confirmed is detached again before the error is returned.
fn attach(
    engine: &dyn InferenceEngine,
    entry: &ConnectorEntry,
) -> Result<(ToolServerSummary, Vec<ToolDescriptor>), EngineError> {
    engine.add_tool_server(entry.tool_server_config())?;

    confirm(engine, entry).inspect_err(|_| {
        if let Err(e) = engine.remove_tool_server(&entry.id) {
            if !e.is_unknown_tool_server() {
                tracing::warn!(connector_id = %entry.id, error = %e, "detach after failed attach");
            }
        }
    })
}

fn confirm(
    engine: &dyn InferenceEngine,
    entry: &ConnectorEntry,
) -> Result<(ToolServerSummary, Vec<ToolDescriptor>), EngineError> {
    let summary = engine
        .get_tool_server(&entry.id)
        .ok_or_else(|| EngineError::ToolServer {
            server_id: entry.id.clone(),
            reason: "server not reported after attach".into(),
        })?;
    if !summary.connected {
        return Err(EngineError::ToolServer {
            server_id: entry.id.clone(),
            reason: "server reported disconnected after attach".into(),
        });
    }

    let tools = engine.discover_tools(&entry.id)?;
    Ok((summary, tools))
}

fn not_found(id: &str) -> CoordinatorError {
    CoordinatorError::ConnectorNotFound {
        connector_id: id.to_string(),
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
