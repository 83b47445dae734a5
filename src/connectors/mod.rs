//! Connector Registry: tool connector catalog and connection state machine.
//!
//! Submodules:
//! - `registry`: add/remove/connect/disconnect/refresh
//! - `templates`: built-in templates and pre-flight checks
//! - `types`: connector entries, specs, status

pub mod registry;
pub mod templates;
pub mod types;

// Re-exports for convenience
pub use registry::ConnectorRegistry;
pub use types::{
    ConnectorEntry, ConnectorSpec, ConnectorStatus, ConnectorTemplate, ValidationCheck,
};
