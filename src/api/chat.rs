//! Chat calls: complete, stream, reset and memory wipe.

use super::correlation::correlation_id;
use super::errors::ApiError;
use super::sse::SseResponse;
use super::types::{Api, ApiResult, ChatRequest, ModelStatusBody};
use crate::engine::ChatResponse;

impl Api {
    pub fn chat(
        &self,
        correlation_id: Option<&str>,
        request: ChatRequest,
    ) -> ApiResult<ChatResponse> {
        let message = require_message(&request, correlation_id)?;
        self.call("chat", correlation_id, 200, |rt| rt.agent.chat_complete(message))
    }

    /// Start a streamed chat. Errors before the first frame (no model,
    /// empty message, worker spawn) come back as an ordinary error; errors
    /// after that arrive as the stream's terminal `error` event.
    pub fn chat_stream(
        &self,
        incoming: Option<&str>,
        request: ChatRequest,
    ) -> Result<SseResponse, ApiError> {
        let cid = correlation_id(incoming);
        let message = require_message(&request, Some(cid.as_str()))?;
        let stream = self
            .call("chat_stream", Some(cid.as_str()), 200, |rt| rt.agent.chat_stream(message))?
            .body;
        tracing::debug!(correlation_id = %cid, model_id = stream.model_id(), "chat stream opened");
        Ok(SseResponse::new(cid, stream))
    }

    pub fn reset_chat(&self, correlation_id: Option<&str>) -> ApiResult<ModelStatusBody> {
        self.call("reset_chat", correlation_id, 200, |rt| {
            rt.agent.reset().map(|model_id| ModelStatusBody {
                status: "cleared",
                model_id: Some(model_id),
            })
        })
    }

    /// Wipe persistent memory. `model_id` is `"none"` when nothing is loaded.
    pub fn clear_memory(&self, correlation_id: Option<&str>) -> ApiResult<ModelStatusBody> {
        self.call("clear_memory", correlation_id, 200, |rt| {
            rt.agent.clear_memory().map(|model_id| ModelStatusBody {
                status: "memory_wiped",
                model_id: Some(model_id.unwrap_or_else(|| "none".to_string())),
            })
        })
    }
}

fn require_message<'a>(
    request: &'a ChatRequest,
    incoming: Option<&str>,
) -> Result<&'a str, ApiError> {
    if request.message.trim().is_empty() {
        return Err(ApiError::validation(
            "message is required",
            Some(serde_json::json!({ "field": "message" })),
            &correlation_id(incoming),
        ));
    }
    Ok(&request.message)
}
