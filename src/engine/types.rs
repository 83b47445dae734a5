//! Value types exchanged with an inference engine.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Parameters for constructing one engine instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub model_path: PathBuf,
    pub context_size: u32,
    pub max_tokens: u32,
}

/// Token accounting for one chat turn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl TokenUsage {
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

/// Latency and throughput for one chat turn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatMetrics {
    pub latency_ms: u64,
    pub time_to_first_token_ms: u64,
    pub tokens_per_second: f64,
}

/// A completed chat turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub text: String,
    pub usage: TokenUsage,
    pub metrics: ChatMetrics,
}
