//! Agent Coordinator: owner of the one live engine instance.
//!
//! Two locking domains:
//! - `slot` (metadata): active handle, active model id, memory handle. Held
//!   only long enough to read or swap them, never across an engine call.
//! - `operations`: serializes every call that crosses into the engine.
//!
//! Lock order: `operations` first, then `slot` briefly. Never the reverse.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use super::streaming::{ChatStream, FrameSender};
use crate::engine::{ChatResponse, EngineConfig, EngineFactory, InferenceEngine};
use crate::errors::CoordinatorError;
use crate::lock_or_recover;
use crate::memory::{remove_backing_files, ContextDatabaseHandle, ContextStoreOpener};
use crate::models::{ModelEntry, ModelRegistry, ModelStatus};

/// Generation cap handed to every engine instance unless configured otherwise.
pub const DEFAULT_MAX_TOKENS: u32 = 512;

/// Name of the streaming worker threads.
const STREAM_THREAD_NAME: &str = "chat-stream";

// ─── Settings ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinatorSettings {
    pub max_tokens: u32,
    pub memory_db_path: PathBuf,
}

impl Default for CoordinatorSettings {
    fn default() -> Self {
        Self {
            max_tokens: DEFAULT_MAX_TOKENS,
            memory_db_path: crate::data_dir().join("memory.db"),
        }
    }
}

// ─── Engine Slot ─────────────────────────────────────────────────────────────

#[derive(Default)]
struct EngineSlot {
    engine: Option<Arc<dyn InferenceEngine>>,
    model_id: Option<String>,
    context_db: Option<ContextDatabaseHandle>,
}

// ─── AgentCoordinator ────────────────────────────────────────────────────────

pub struct AgentCoordinator {
    models: Arc<ModelRegistry>,
    factory: Arc<dyn EngineFactory>,
    opener: Arc<dyn ContextStoreOpener>,
    settings: CoordinatorSettings,
    slot: Mutex<EngineSlot>,
    operations: Mutex<()>,
}

impl AgentCoordinator {
    /// Create a coordinator and open the memory store.
    ///
    /// A store that fails to open is logged and left absent; chat still works
    /// without persistent memory and `clear_memory` will try again.
    pub fn new(
        models: Arc<ModelRegistry>,
        factory: Arc<dyn EngineFactory>,
        opener: Arc<dyn ContextStoreOpener>,
        settings: CoordinatorSettings,
    ) -> Self {
        let context_db = match opener.open(&settings.memory_db_path) {
            Ok(db) => {
                tracing::info!(path = %settings.memory_db_path.display(), "memory database opened");
                Some(db)
            }
            Err(e) => {
                tracing::warn!(
                    path = %settings.memory_db_path.display(),
                    error = %e,
                    "memory database unavailable, continuing without it"
                );
                None
            }
        };

        Self {
            models,
            factory,
            opener,
            settings,
            slot: Mutex::new(EngineSlot {
                context_db,
                ..EngineSlot::default()
            }),
            operations: Mutex::new(()),
        }
    }

    pub fn settings(&self) -> &CoordinatorSettings {
        &self.settings
    }

    fn lock_operations(&self) -> MutexGuard<'_, ()> {
        lock_or_recover(&self.operations)
    }

    fn active(&self) -> Option<(Arc<dyn InferenceEngine>, String)> {
        let slot = lock_or_recover(&self.slot);
        match (&slot.engine, &slot.model_id) {
            (Some(engine), Some(id)) => Some((engine.clone(), id.clone())),
            _ => None,
        }
    }

    // ─── Status ──────────────────────────────────────────────────────────

    pub fn active_model_id(&self) -> Option<String> {
        lock_or_recover(&self.slot).model_id.clone()
    }

    pub fn has_active_engine(&self) -> bool {
        lock_or_recover(&self.slot).engine.is_some()
    }

    pub fn context_database(&self) -> Option<ContextDatabaseHandle> {
        lock_or_recover(&self.slot).context_db.clone()
    }

    // ─── Model Lifecycle ─────────────────────────────────────────────────

    /// Load `model_id` into a fresh engine and make it the active one.
    ///
    /// The engine is built with no lock held. The swap waits for any
    /// in-flight chat or stream to finish. A failed build leaves the current
    /// engine in place.
    pub fn select(
        &self,
        model_id: &str,
        context_override: Option<u32>,
    ) -> Result<ModelEntry, CoordinatorError> {
        if context_override == Some(0) {
            return Err(CoordinatorError::invalid("context_size must be positive"));
        }

        let entry = self.models.get(model_id)?;
        if entry.status == ModelStatus::Unavailable {
            return Err(CoordinatorError::ModelFileMissing {
                model_id: entry.id.clone(),
                path: entry.path.display().to_string(),
            });
        }

        let config = EngineConfig {
            model_path: entry.path.clone(),
            context_size: context_override.unwrap_or(entry.context_size),
            max_tokens: self.settings.max_tokens,
        };

        let started = Instant::now();
        let engine = self.factory.create(&config).map_err(|e| {
            tracing::warn!(model_id = %entry.id, error = %e, "engine construction failed");
            CoordinatorError::from(e)
        })?;

        let previous = {
            let _ops = self.lock_operations();
            let context_db = lock_or_recover(&self.slot).context_db.clone();
            if context_db.is_some() {
                engine.set_context_database(context_db);
            }
            let mut slot = lock_or_recover(&self.slot);
            slot.model_id = Some(entry.id.clone());
            slot.engine.replace(engine)
        };
        // The old instance is released here, outside both locks.
        drop(previous);

        tracing::info!(
            model_id = %entry.id,
            context_size = config.context_size,
            max_tokens = config.max_tokens,
            load_ms = started.elapsed().as_millis() as u64,
            "model selected"
        );
        Ok(entry)
    }

    /// Drop the active engine. Callers already inside the engine keep their
    /// own reference and finish normally.
    pub fn unload(&self) -> Option<String> {
        let (previous_engine, previous_id) = {
            let mut slot = lock_or_recover(&self.slot);
            (slot.engine.take(), slot.model_id.take())
        };
        drop(previous_engine);

        if let Some(id) = &previous_id {
            tracing::info!(model_id = %id, "model unloaded");
        }
        previous_id
    }

    // ─── Chat ────────────────────────────────────────────────────────────

    pub fn chat_complete(&self, message: &str) -> Result<ChatResponse, CoordinatorError> {
        if !self.has_active_engine() {
            return Err(CoordinatorError::NoActiveModel);
        }

        let _ops = self.lock_operations();
        let (engine, model_id) = self.active().ok_or(CoordinatorError::NoActiveModel)?;

        let response = engine.chat(message).map_err(|e| {
            tracing::warn!(model_id = %model_id, error = %e, "chat failed");
            CoordinatorError::from(e)
        })?;

        tracing::info!(
            model_id = %model_id,
            total_tokens = response.usage.total_tokens,
            latency_ms = response.metrics.latency_ms,
            "chat completed"
        );
        Ok(response)
    }

    /// Start a streamed chat turn on a worker thread.
    ///
    /// Returns immediately. A missing engine is reported here, before any
    /// stream exists. The worker holds the operation lock for the whole turn.
    pub fn chat_stream(self: &Arc<Self>, message: &str) -> Result<ChatStream, CoordinatorError> {
        let (_, model_id) = self.active().ok_or(CoordinatorError::NoActiveModel)?;

        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let sender = FrameSender::new(tx);
        let this = Arc::clone(self);
        let message = message.to_string();

        std::thread::Builder::new()
            .name(STREAM_THREAD_NAME.to_string())
            .spawn(move || this.run_stream(&message, sender))
            .map_err(|e| CoordinatorError::WorkerSpawn {
                reason: e.to_string(),
            })?;

        Ok(ChatStream::new(model_id, rx))
    }

    fn run_stream(&self, message: &str, mut sender: FrameSender) {
        let _ops = self.lock_operations();
        let Some((engine, model_id)) = self.active() else {
            // Unloaded between the request and the worker getting the lock.
            sender.fail(&CoordinatorError::NoActiveModel);
            return;
        };

        let result = engine.chat_stream(message, &mut |token| sender.token(token));
        match result {
            Ok(response) => {
                tracing::info!(
                    model_id = %model_id,
                    tokens = sender.tokens_sent(),
                    latency_ms = response.metrics.latency_ms,
                    "chat stream completed"
                );
                sender.done(response);
            }
            Err(e) => {
                tracing::warn!(model_id = %model_id, error = %e, "chat stream failed");
                sender.fail(&CoordinatorError::from(e));
            }
        }
    }

    /// Clear the active engine's conversation history. Returns the model id.
    pub fn reset(&self) -> Result<String, CoordinatorError> {
        if !self.has_active_engine() {
            return Err(CoordinatorError::NoActiveModel);
        }

        let _ops = self.lock_operations();
        let (engine, model_id) = self.active().ok_or(CoordinatorError::NoActiveModel)?;
        engine.clear_history();

        tracing::info!(model_id = %model_id, "chat history cleared");
        Ok(model_id)
    }

    // ─── Memory ──────────────────────────────────────────────────────────

    /// Wipe and recreate the persistent memory store, rebinding the active
    /// engine to the new handle. Returns the active model id, if any.
    ///
    /// If the store cannot be recreated the coordinator is left without one
    /// and the active engine is unbound; calling again retries.
    pub fn clear_memory(&self) -> Result<Option<String>, CoordinatorError> {
        let _ops = self.lock_operations();

        let (old_db, engine) = {
            let mut slot = lock_or_recover(&self.slot);
            (slot.context_db.take(), slot.engine.clone())
        };

        if let Some(db) = old_db {
            if let Err(e) = db.close() {
                tracing::warn!(error = %e, "failed to close memory database before wipe");
            }
        }

        let path = &self.settings.memory_db_path;
        let reopened = remove_backing_files(path).and_then(|()| self.opener.open(path));

        match reopened {
            Ok(db) => {
                lock_or_recover(&self.slot).context_db = Some(db.clone());
                if let Some(engine) = &engine {
                    engine.set_context_database(Some(db));
                }
                let model_id = self.active_model_id();
                tracing::info!(
                    path = %path.display(),
                    model_id = model_id.as_deref().unwrap_or("none"),
                    "memory database wiped"
                );
                Ok(model_id)
            }
            Err(e) => {
                if let Some(engine) = &engine {
                    engine.set_context_database(None);
                }
                tracing::error!(path = %path.display(), error = %e, "memory database wipe failed");
                Err(CoordinatorError::from(e))
            }
        }
    }

    // ─── Engine Access ───────────────────────────────────────────────────

    /// Run `f` against the active engine under the operation lock.
    ///
    /// Returns `None` when no engine is loaded. `f` may take other metadata
    /// locks briefly; it must not call back into the coordinator's locking
    /// operations.
    pub(crate) fn with_engine<T>(&self, f: impl FnOnce(&dyn InferenceEngine) -> T) -> Option<T> {
        let _ops = self.lock_operations();
        let (engine, _) = self.active()?;
        Some(f(engine.as_ref()))
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
