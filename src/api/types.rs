//! Request and response shapes for the API façade.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::correlation::correlation_id;
use super::errors::ApiError;
use crate::connectors::{ConnectorEntry, ConnectorTemplate, ValidationCheck};
use crate::errors::CoordinatorError;
use crate::mcp_client::ToolDescriptor;
use crate::models::ModelEntry;
use crate::runtime::Runtime;

/// Façade over a shared [`Runtime`], one method per exposed operation.
///
/// Every method takes the caller's correlation id (if any) and echoes the
/// resolved id in its response or error.
#[derive(Clone)]
pub struct Api {
    runtime: Arc<Runtime>,
}

impl Api {
    pub fn new(runtime: Arc<Runtime>) -> Self {
        Self { runtime }
    }

    pub fn runtime(&self) -> &Arc<Runtime> {
        &self.runtime
    }

    /// Resolve a correlation id and run `op`, wrapping the outcome.
    pub(crate) fn call<T>(
        &self,
        operation: &'static str,
        incoming: Option<&str>,
        status: u16,
        op: impl FnOnce(&Runtime) -> Result<T, CoordinatorError>,
    ) -> ApiResult<T> {
        let cid = correlation_id(incoming);
        match op(&self.runtime) {
            Ok(body) => Ok(ApiResponse {
                correlation_id: cid,
                status,
                body,
            }),
            Err(e) => {
                tracing::warn!(
                    operation,
                    correlation_id = %cid,
                    code = e.code(),
                    error = %e,
                    "request failed"
                );
                Err(ApiError::from_coordinator(&e, &cid))
            }
        }
    }
}

// ─── Envelope ────────────────────────────────────────────────────────────────

/// A successful call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiResponse<T> {
    #[serde(skip)]
    pub correlation_id: String,
    /// HTTP status hint.
    #[serde(skip)]
    pub status: u16,
    #[serde(flatten)]
    pub body: T,
}

impl<T> ApiResponse<T> {
    /// A 200 response for an operation that cannot fail.
    pub(crate) fn ok(incoming: Option<&str>, body: T) -> Self {
        Self {
            correlation_id: correlation_id(incoming),
            status: 200,
            body,
        }
    }
}

pub type ApiResult<T> = Result<ApiResponse<T>, ApiError>;

// ─── Requests ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SelectModelRequest {
    pub model_id: String,
    #[serde(default)]
    pub context_size: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

// ─── Bodies ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthBody {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelListBody {
    pub models: Vec<ModelEntry>,
    pub active_model_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelBody {
    pub model: ModelEntry,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActiveModelBody {
    pub active_model: ModelEntry,
}

/// `{status, model_id}` acknowledgement for model state changes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelStatusBody {
    pub status: &'static str,
    pub model_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectorListBody {
    pub connectors: Vec<ConnectorEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemplateListBody {
    pub templates: Vec<ConnectorTemplate>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationBody {
    pub ok: bool,
    pub checks: Vec<ValidationCheck>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectorBody {
    pub connector: ConnectorEntry,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RemovedBody {
    pub status: &'static str,
    pub connector_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisconnectedBody {
    pub status: &'static str,
    pub server_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolListBody {
    pub connector_id: String,
    pub tools: Vec<ToolDescriptor>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_serializes_body_only() {
        let response = ApiResponse {
            correlation_id: "cor_1".into(),
            status: 200,
            body: ModelStatusBody {
                status: "unloaded",
                model_id: Some("llama".into()),
            },
        };
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            serde_json::json!({"status": "unloaded", "model_id": "llama"})
        );
    }

    #[test]
    fn test_select_request_context_optional() {
        let req: SelectModelRequest = serde_json::from_str(r#"{"model_id":"llama"}"#).unwrap();
        assert_eq!(req.context_size, None);
        let req: SelectModelRequest =
            serde_json::from_str(r#"{"model_id":"llama","context_size":4096}"#).unwrap();
        assert_eq!(req.context_size, Some(4096));
    }
}
