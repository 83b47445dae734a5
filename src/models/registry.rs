//! Model Registry: catalog of model files keyed by a stable slug.
//!
//! Filesystem probing happens outside the map lock. The lock is only held to
//! read or assign ids, so a listing never waits on anything slow.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use super::types::{ModelEntry, ModelStatus, RegisterModel, DEFAULT_CONTEXT_SIZE};
use crate::errors::CoordinatorError;
use crate::lock_or_recover;

// ─── Slugs ───────────────────────────────────────────────────────────────────

/// Turn a filename stem into a model id.
///
/// ASCII letters and digits are lower-cased and kept; every run of anything
/// else becomes a single `-`. Leading and trailing dashes are trimmed. An
/// empty result falls back to `"model"`.
pub fn slugify(stem: &str) -> String {
    let mut out = String::with_capacity(stem.len());
    let mut pending_dash = false;
    for ch in stem.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    if out.is_empty() {
        "model".to_string()
    } else {
        out
    }
}

// ─── ModelRegistry ───────────────────────────────────────────────────────────

pub struct ModelRegistry {
    models: Mutex<HashMap<String, ModelEntry>>,
    default_context_size: u32,
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_CONTEXT_SIZE)
    }
}

impl ModelRegistry {
    pub fn new(default_context_size: u32) -> Self {
        Self {
            models: Mutex::new(HashMap::new()),
            default_context_size,
        }
    }

    /// Every entry with live status, ordered by display name then id.
    pub fn list(&self) -> Vec<ModelEntry> {
        let snapshot: Vec<ModelEntry> = lock_or_recover(&self.models).values().cloned().collect();
        let mut out: Vec<ModelEntry> = snapshot.iter().map(ModelEntry::with_live_status).collect();
        out.sort_by(|a, b| {
            a.display_name
                .cmp(&b.display_name)
                .then_with(|| a.id.cmp(&b.id))
        });
        out
    }

    /// One entry with live status.
    pub fn get(&self, model_id: &str) -> Result<ModelEntry, CoordinatorError> {
        let entry = lock_or_recover(&self.models).get(model_id).cloned();
        entry
            .map(|e| e.with_live_status())
            .ok_or_else(|| CoordinatorError::ModelNotFound {
                model_id: model_id.to_string(),
            })
    }

    pub fn len(&self) -> usize {
        lock_or_recover(&self.models).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Register a model file.
    ///
    /// Re-registering a path that is already known returns the same id.
    /// A different path whose stem slugifies to a taken id gets the first
    /// free `-2`, `-3`, ... suffix.
    pub fn register(&self, request: RegisterModel) -> Result<ModelEntry, CoordinatorError> {
        let not_a_file =
            || CoordinatorError::invalid("Model path does not exist or is not a regular file");

        if request.path.as_os_str().is_empty() {
            return Err(not_a_file());
        }
        let canonical = std::fs::canonicalize(&request.path).map_err(|_| not_a_file())?;
        let metadata = std::fs::metadata(&canonical).map_err(|_| not_a_file())?;
        if !metadata.is_file() {
            return Err(not_a_file());
        }

        let context_size = match request.context_size {
            Some(0) => return Err(CoordinatorError::invalid("context_size must be positive")),
            Some(n) => n,
            None => self.default_context_size,
        };

        let file_name = file_name_of(&canonical);
        let display_name = request
            .display_name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| file_name.clone());

        let stem = canonical
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let base = slugify(&stem);

        let mut models = lock_or_recover(&self.models);
        let id = pick_id(&models, &base, &canonical);
        let entry = ModelEntry {
            id: id.clone(),
            display_name,
            path: canonical,
            status: ModelStatus::Available,
            context_size,
            file_size_bytes: metadata.len(),
        };
        let replaced = models.insert(id.clone(), entry.clone()).is_some();
        drop(models);

        tracing::info!(
            model_id = %id,
            path = %entry.path.display(),
            size_bytes = entry.file_size_bytes,
            replaced,
            "model registered"
        );
        Ok(entry)
    }
}

/// First of `base`, `base-2`, `base-3`, ... that is free or already maps to `path`.
fn pick_id(models: &HashMap<String, ModelEntry>, base: &str, path: &Path) -> String {
    let mut candidate = base.to_string();
    let mut suffix = 2u32;
    loop {
        match models.get(&candidate) {
            None => return candidate,
            Some(existing) if existing.path == path => return candidate,
            Some(_) => {
                candidate = format!("{base}-{suffix}");
                suffix += 1;
            }
        }
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorCategory;

    fn touch(dir: &Path, rel: &str, bytes: &[u8]) -> std::path::PathBuf {
        let path = dir.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, bytes).unwrap();
        path
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Llama-2-7B"), "llama-2-7b");
        assert_eq!(slugify("Qwen2.5 7B__Instruct"), "qwen2-5-7b-instruct");
        assert_eq!(slugify("--weird--"), "weird");
        assert_eq!(slugify("___"), "model");
        assert_eq!(slugify(""), "model");
    }

    #[test]
    fn test_register_then_list_available() {
        let dir = tempfile::tempdir().unwrap();
        let path = touch(dir.path(), "Phi-3 Mini.gguf", b"GGUF");
        let registry = ModelRegistry::default();

        let entry = registry.register(RegisterModel::new(&path)).unwrap();
        assert_eq!(entry.id, "phi-3-mini");
        assert_eq!(entry.display_name, "Phi-3 Mini.gguf");
        assert_eq!(entry.context_size, DEFAULT_CONTEXT_SIZE);
        assert_eq!(entry.file_size_bytes, 4);

        let listed = registry.list();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].status, ModelStatus::Available);
    }

    #[test]
    fn test_status_flips_when_file_removed() {
        let dir = tempfile::tempdir().unwrap();
        let path = touch(dir.path(), "tiny.gguf", b"x");
        let registry = ModelRegistry::default();
        let entry = registry.register(RegisterModel::new(&path)).unwrap();

        std::fs::remove_file(&path).unwrap();

        let listed = registry.list();
        assert_eq!(listed[0].status, ModelStatus::Unavailable);
        assert_eq!(listed[0].path, entry.path);
        assert_eq!(
            registry.get("tiny").unwrap().status,
            ModelStatus::Unavailable
        );
    }

    #[test]
    fn test_colliding_stems_get_suffixes() {
        let dir = tempfile::tempdir().unwrap();
        let a = touch(dir.path(), "a/llama-2-7b.gguf", b"a");
        let b = touch(dir.path(), "b/Llama 2 7B.gguf", b"b");
        let c = touch(dir.path(), "c/llama_2_7b.bin", b"c");
        let registry = ModelRegistry::default();

        assert_eq!(registry.register(RegisterModel::new(&a)).unwrap().id, "llama-2-7b");
        assert_eq!(registry.register(RegisterModel::new(&b)).unwrap().id, "llama-2-7b-2");
        assert_eq!(registry.register(RegisterModel::new(&c)).unwrap().id, "llama-2-7b-3");
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_reregister_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let a = touch(dir.path(), "a/model.gguf", b"a");
        let b = touch(dir.path(), "b/model.gguf", b"b");
        let registry = ModelRegistry::default();

        registry.register(RegisterModel::new(&a)).unwrap();
        registry.register(RegisterModel::new(&b)).unwrap();

        let again_a = registry.register(RegisterModel::new(&a)).unwrap();
        let again_b = registry
            .register(RegisterModel::new(&b).display_name("Renamed"))
            .unwrap();
        assert_eq!(again_a.id, "model");
        assert_eq!(again_b.id, "model-2");
        assert_eq!(again_b.display_name, "Renamed");
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_register_rejects_missing_and_directories() {
        let dir = tempfile::tempdir().unwrap();
        let registry = ModelRegistry::default();

        let err = registry
            .register(RegisterModel::new(dir.path().join("nope.gguf")))
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Validation);
        assert_eq!(err.code(), "APP-VAL-001");

        let err = registry.register(RegisterModel::new(dir.path())).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Validation);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_register_rejects_zero_context() {
        let dir = tempfile::tempdir().unwrap();
        let path = touch(dir.path(), "m.gguf", b"m");
        let registry = ModelRegistry::default();
        let err = registry
            .register(RegisterModel::new(&path).context_size(0))
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Validation);
    }

    #[test]
    fn test_empty_display_name_falls_back_to_filename() {
        let dir = tempfile::tempdir().unwrap();
        let path = touch(dir.path(), "m.gguf", b"m");
        let registry = ModelRegistry::default();
        let entry = registry
            .register(RegisterModel::new(&path).display_name("  "))
            .unwrap();
        assert_eq!(entry.display_name, "m.gguf");
    }

    #[test]
    fn test_list_sorted_by_display_name() {
        let dir = tempfile::tempdir().unwrap();
        let z = touch(dir.path(), "zeta.gguf", b"z");
        let a = touch(dir.path(), "alpha.gguf", b"a");
        let registry = ModelRegistry::default();
        registry.register(RegisterModel::new(&z)).unwrap();
        registry.register(RegisterModel::new(&a)).unwrap();

        let names: Vec<String> = registry.list().into_iter().map(|m| m.display_name).collect();
        assert_eq!(names, vec!["alpha.gguf", "zeta.gguf"]);
    }

    #[test]
    fn test_get_unknown_model() {
        let registry = ModelRegistry::default();
        let err = registry.get("missing").unwrap_err();
        assert_eq!(err.code(), "APP-MOD-404");
    }
}
