//! Agent Core: the active engine and everything that crosses into it.
//!
//! Submodules:
//! - `coordinator`: model select/unload, chat, streamed chat, history reset,
//!   memory wipe, and the operation lock that serializes them
//! - `streaming`: stream frames, the worker-side sender and `ChatStream`

pub mod coordinator;
pub mod streaming;

// Re-exports for convenience
pub use coordinator::{AgentCoordinator, CoordinatorSettings, DEFAULT_MAX_TOKENS};
pub use streaming::{ChatStream, StreamFrame};
