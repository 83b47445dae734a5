//! Call surface consumed by the HTTP layer.
//!
//! [`Api`] wraps a shared [`crate::Runtime`]. Each method resolves a
//! correlation id, runs one coordinator operation and returns either an
//! [`ApiResponse`] or an [`ApiError`] carrying the uniform error envelope.

pub mod chat;
pub mod connectors;
pub mod correlation;
pub mod errors;
pub mod health;
pub mod models;
pub mod sse;
pub mod types;

// Re-exports for convenience
pub use correlation::{correlation_id, CORRELATION_HEADER};
pub use errors::{ApiError, ErrorBody, ErrorEnvelope};
pub use sse::{encode_frame, SseResponse};
pub use types::{
    ActiveModelBody, Api, ApiResponse, ApiResult, ChatRequest, ConnectorBody, ConnectorListBody,
    DisconnectedBody, HealthBody, ModelBody, ModelListBody, ModelStatusBody, RemovedBody,
    SelectModelRequest, TemplateListBody, ToolListBody, ValidationBody,
};
