//! Uniform error envelope returned for every failed call.
//!
//! ```json
//! {"error": {"code": "APP-STATE-409", "category": "conflict",
//!            "message": "No active model is loaded", "retryable": true,
//!            "correlation_id": "cor_..."}}
//! ```

use serde::Serialize;
use thiserror::Error;

use crate::errors::{CoordinatorError, ErrorCategory};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub category: ErrorCategory,
    pub message: String,
    pub retryable: bool,
    pub correlation_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

/// An error ready to be written by the transport.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("[{}] {}", .envelope.error.code, .envelope.error.message)]
pub struct ApiError {
    /// HTTP status hint.
    pub status: u16,
    pub envelope: ErrorEnvelope,
}

impl ApiError {
    pub fn from_coordinator(err: &CoordinatorError, correlation_id: &str) -> Self {
        let category = err.category();
        Self {
            status: category.http_status(),
            envelope: ErrorEnvelope {
                error: ErrorBody {
                    code: err.code().to_string(),
                    category,
                    message: err.to_string(),
                    retryable: category.is_retryable(),
                    correlation_id: correlation_id.to_string(),
                    details: err.details(),
                },
            },
        }
    }

    /// Request-shape failure caught before reaching the coordinator.
    pub fn validation(
        message: impl Into<String>,
        details: Option<serde_json::Value>,
        correlation_id: &str,
    ) -> Self {
        let mut err = Self::from_coordinator(&CoordinatorError::invalid(message), correlation_id);
        err.envelope.error.details = details;
        err
    }

    pub fn code(&self) -> &str {
        &self.envelope.error.code
    }

    pub fn correlation_id(&self) -> &str {
        &self.envelope.error.correlation_id
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(&self.envelope).unwrap_or_else(|_| {
            serde_json::json!({ "error": { "code": self.code(), "message": "unserializable error" } })
        })
    }
}
