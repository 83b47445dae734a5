//! Model Registry: known model files, their ids and live availability.

pub mod registry;
pub mod types;

// Re-exports for convenience
pub use registry::{slugify, ModelRegistry};
pub use types::{ModelEntry, ModelStatus, RegisterModel, DEFAULT_CONTEXT_SIZE};
