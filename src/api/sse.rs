//! Server-sent events framing for streamed chat.

use futures::stream::BoxStream;
use futures::StreamExt;

use super::correlation::CORRELATION_HEADER;
use crate::agent_core::{ChatStream, StreamFrame};

/// Encode one frame as an SSE `data:` event.
pub fn encode_frame(frame: &StreamFrame) -> String {
    let payload = serde_json::to_string(frame).unwrap_or_else(|e| {
        serde_json::json!({
            "type": "error",
            "code": "APP-INT-500",
            "message": format!("failed to encode frame: {e}"),
        })
        .to_string()
    });
    format!("data: {payload}\n\n")
}

/// A streamed chat response: headers plus a stream of encoded events.
pub struct SseResponse {
    pub correlation_id: String,
    pub model_id: String,
    pub headers: Vec<(&'static str, String)>,
    pub body: BoxStream<'static, String>,
}

impl SseResponse {
    pub fn new(correlation_id: String, stream: ChatStream) -> Self {
        let model_id = stream.model_id().to_string();
        Self {
            headers: sse_headers(&correlation_id),
            correlation_id,
            model_id,
            body: stream.map(|frame| encode_frame(&frame)).boxed(),
        }
    }
}

pub fn sse_headers(correlation_id: &str) -> Vec<(&'static str, String)> {
    vec![
        ("Content-Type", "text/event-stream".to_string()),
        ("Cache-Control", "no-cache".to_string()),
        ("X-Accel-Buffering", "no".to_string()),
        (CORRELATION_HEADER, correlation_id.to_string()),
    ]
}
