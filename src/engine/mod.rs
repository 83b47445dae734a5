//! Inference engine contract.
//!
//! The engine (model loading, prompt formatting, token generation) is an
//! external collaborator. This module defines what the coordinator expects
//! from it:
//! - `EngineFactory`: builds an instance from an `EngineConfig`
//! - `InferenceEngine`: chat, streamed chat, history reset, memory binding,
//!   tool server attach/detach
//! - `types`: request/response value types
//! - `errors`: engine-level error types

pub mod errors;
pub mod traits;
pub mod types;

// Re-exports for convenience
pub use errors::EngineError;
pub use traits::{EngineFactory, InferenceEngine};
pub use types::{ChatMetrics, ChatResponse, EngineConfig, TokenUsage};
