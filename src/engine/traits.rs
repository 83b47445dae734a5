//! Engine seams.
//!
//! The coordinator never calls into an engine concurrently: every method
//! below runs under the coordinator's operation lock. Implementations still
//! have to be `Send + Sync` because the handle is shared with stream workers.

use std::sync::Arc;

use super::errors::EngineError;
use super::types::{ChatResponse, EngineConfig};
use crate::mcp_client::{ToolDescriptor, ToolServerConfig, ToolServerSummary};
use crate::memory::ContextDatabaseHandle;

/// One loaded model with its conversation history.
pub trait InferenceEngine: Send + Sync {
    /// Run one turn to completion.
    fn chat(&self, message: &str) -> Result<ChatResponse, EngineError>;

    /// Run one turn, invoking `on_token` for every generated token in order.
    fn chat_stream(
        &self,
        message: &str,
        on_token: &mut dyn FnMut(&str),
    ) -> Result<ChatResponse, EngineError>;

    /// Drop the conversation history, keeping the model loaded.
    fn clear_history(&self);

    /// Bind (or unbind, with `None`) the persistent memory store.
    fn set_context_database(&self, database: Option<ContextDatabaseHandle>);

    fn add_tool_server(&self, config: ToolServerConfig) -> Result<(), EngineError>;

    fn remove_tool_server(&self, server_id: &str) -> Result<(), EngineError>;

    fn get_tool_server(&self, server_id: &str) -> Option<ToolServerSummary>;

    /// Re-run tool discovery on an attached server.
    fn discover_tools(&self, server_id: &str) -> Result<Vec<ToolDescriptor>, EngineError>;
}

/// Builds engine instances. Construction may be slow (model load) and is
/// always called with no coordinator lock held.
pub trait EngineFactory: Send + Sync {
    fn create(&self, config: &EngineConfig) -> Result<Arc<dyn InferenceEngine>, EngineError>;
}

impl<F> EngineFactory for F
where
    F: Fn(&EngineConfig) -> Result<Arc<dyn InferenceEngine>, EngineError> + Send + Sync,
{
    fn create(&self, config: &EngineConfig) -> Result<Arc<dyn InferenceEngine>, EngineError> {
        self(config)
    }
}
