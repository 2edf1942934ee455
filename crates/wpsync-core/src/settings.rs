//! Editor preferences persisted in a small key-value store.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde::Serialize;
use tracing::debug;

use crate::config::FeatureFlags;
use crate::error::{SyncError, SyncResult};

const VISUAL_EDITOR_ENABLED_KEY: &str = "kUserDefaultsNewEditorEnabled";
const NATIVE_EDITOR_ENABLED_KEY: &str = "kUserDefaultsNativeEditorEnabled";

/// Storage for boolean preferences
#[cfg_attr(test, mockall::automock)]
pub trait KeyValueStore: Send + Sync {
    fn get_bool(&self, key: &str) -> Option<bool>;

    fn set_bool(&self, key: &str, value: bool) -> SyncResult<()>;
}

/// In-memory store
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, bool>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get_bool(&self, key: &str) -> Option<bool> {
        self.values.read().ok()?.get(key).copied()
    }

    fn set_bool(&self, key: &str, value: bool) -> SyncResult<()> {
        self.values
            .write()
            .map_err(|_| SyncError::config("Settings store lock poisoned"))?
            .insert(key.to_string(), value);
        Ok(())
    }
}

/// Store backed by a JSON file, rewritten on every change
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    values: RwLock<BTreeMap<String, serde_json::Value>>,
}

impl JsonFileStore {
    /// Open the store, starting empty when the file does not exist
    pub fn open<P: AsRef<Path>>(path: P) -> SyncResult<Self> {
        let path = path.as_ref().to_path_buf();
        let values = if path.exists() {
            let json = std::fs::read_to_string(&path)?;
            serde_json::from_str(&json)?
        } else {
            BTreeMap::new()
        };

        debug!("Opened settings store at {}", path.display());
        Ok(Self {
            path,
            values: RwLock::new(values),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self, values: &BTreeMap<String, serde_json::Value>) -> SyncResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(values)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get_bool(&self, key: &str) -> Option<bool> {
        self.values.read().ok()?.get(key).and_then(|v| v.as_bool())
    }

    fn set_bool(&self, key: &str, value: bool) -> SyncResult<()> {
        let mut values = self
            .values
            .write()
            .map_err(|_| SyncError::config("Settings store lock poisoned"))?;
        values.insert(key.to_string(), serde_json::Value::Bool(value));
        self.save(&values)
    }
}

/// Snapshot of the editor preferences
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EditorPreferences {
    pub visual_editor_enabled: bool,
    pub native_editor_enabled: bool,
}

/// Editor preferences on top of a key-value store
pub struct EditorSettings<S: KeyValueStore> {
    store: S,
    features: FeatureFlags,
}

impl<S: KeyValueStore> EditorSettings<S> {
    pub fn new(store: S, features: FeatureFlags) -> Self {
        Self { store, features }
    }

    /// Visual editor preference; enabled unless turned off
    pub fn visual_editor_enabled(&self) -> bool {
        self.store.get_bool(VISUAL_EDITOR_ENABLED_KEY).unwrap_or(true)
    }

    pub fn set_visual_editor_enabled(&self, enabled: bool) -> SyncResult<()> {
        self.store.set_bool(VISUAL_EDITOR_ENABLED_KEY, enabled)
    }

    /// Native editor preference; always off while the feature flag is off
    pub fn native_editor_enabled(&self) -> bool {
        if !self.features.native_editor {
            return false;
        }
        self.store.get_bool(NATIVE_EDITOR_ENABLED_KEY).unwrap_or(false)
    }

    pub fn set_native_editor_enabled(&self, enabled: bool) -> SyncResult<()> {
        self.store.set_bool(NATIVE_EDITOR_ENABLED_KEY, enabled)
    }

    pub fn preferences(&self) -> EditorPreferences {
        EditorPreferences {
            visual_editor_enabled: self.visual_editor_enabled(),
            native_editor_enabled: self.native_editor_enabled(),
        }
    }
}
