//! Runtime: the explicitly constructed owner of the three components.
//!
//! The entry point builds one `Runtime` and shares it (`Arc`) with every
//! request handler. There is no process-wide state.

use std::path::PathBuf;
use std::sync::Arc;

use crate::agent_core::{AgentCoordinator, CoordinatorSettings};
use crate::config::AppConfig;
use crate::connectors::ConnectorRegistry;
use crate::engine::EngineFactory;
use crate::memory::{ContextStoreOpener, SqliteStoreOpener};
use crate::models::ModelRegistry;

/// Tunables resolved from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeSettings {
    pub default_context_size: u32,
    pub max_tokens: u32,
    pub memory_db_path: PathBuf,
    pub protocol_version: String,
}

impl From<&AppConfig> for RuntimeSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            default_context_size: config.engine.default_context_size,
            max_tokens: config.engine.max_tokens,
            memory_db_path: config.memory_db_path(),
            protocol_version: config.protocol_version.clone(),
        }
    }
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

pub struct Runtime {
    pub models: Arc<ModelRegistry>,
    pub agent: Arc<AgentCoordinator>,
    pub connectors: Arc<ConnectorRegistry>,
}

impl Runtime {
    pub fn new(
        settings: RuntimeSettings,
        factory: Arc<dyn EngineFactory>,
        opener: Arc<dyn ContextStoreOpener>,
    ) -> Self {
        let models = Arc::new(ModelRegistry::new(settings.default_context_size));
        let agent = Arc::new(AgentCoordinator::new(
            models.clone(),
            factory,
            opener,
            CoordinatorSettings {
                max_tokens: settings.max_tokens,
                memory_db_path: settings.memory_db_path,
            },
        ));
        let connectors = Arc::new(ConnectorRegistry::with_protocol_version(
            agent.clone(),
            settings.protocol_version,
        ));
        Self {
            models,
            agent,
            connectors,
        }
    }

    /// Build a runtime from configuration and apply its startup entries.
    ///
    /// Models, connectors and the startup selection are best-effort: each
    /// failure is logged and the rest still apply.
    pub fn from_config(config: &AppConfig, factory: Arc<dyn EngineFactory>) -> Self {
        let runtime = Self::new(
            RuntimeSettings::from(config),
            factory,
            Arc::new(SqliteStoreOpener),
        );
        runtime.apply_startup(config);
        runtime
    }

    fn apply_startup(&self, config: &AppConfig) {
        for model in &config.models {
            if let Err(e) = self.models.register(model.clone()) {
                tracing::warn!(
                    path = %model.path.display(),
                    error = %e,
                    "skipping configured model"
                );
            }
        }

        for spec in &config.connectors {
            if let Err(e) = self.connectors.add(spec.clone()) {
                tracing::warn!(connector_id = %spec.id, error = %e, "skipping configured connector");
            }
        }

        if let Some(model_id) = &config.active_model {
            if let Err(e) = self.agent.select(model_id, None) {
                tracing::warn!(model_id = %model_id, error = %e, "startup model selection failed");
            }
        }

        tracing::info!(
            models = self.models.len(),
            connectors = self.connectors.list().len(),
            active_model = self.agent.active_model_id().as_deref().unwrap_or("none"),
            "runtime initialized"
        );
    }
}
