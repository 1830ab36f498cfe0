//! Preference store implementations

use super::{PreferenceError, PreferenceStore};
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Preferences persisted as a flat TOML table of booleans.
///
/// A missing file reads as "nothing stored".
#[derive(Debug)]
pub struct FilePreferences {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process
    write_lock: Mutex<()>,
}

impl FilePreferences {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, bool>, PreferenceError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = std::fs::read_to_string(&self.path)?;
        toml::from_str(&content).map_err(|e| PreferenceError::Parse(e.to_string()))
    }
}

impl PreferenceStore for FilePreferences {
    fn get_bool(&self, key: &str) -> Result<Option<bool>, PreferenceError> {
        Ok(self.read_all()?.get(key).copied())
    }

    fn set_bool(&self, key: &str, value: bool) -> Result<(), PreferenceError> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let mut values = self.read_all()?;
        values.insert(key.to_string(), value);
        let content =
            toml::to_string(&values).map_err(|e| PreferenceError::Encode(e.to_string()))?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&self.path, content)?;

        tracing::debug!(key = key, value = value, path = %self.path.display(), "Stored preference");
        Ok(())
    }
}

/// Non-persistent preferences.
#[derive(Debug, Default)]
pub struct MemoryPreferences {
    values: DashMap<String, bool>,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryPreferences {
    fn get_bool(&self, key: &str) -> Result<Option<bool>, PreferenceError> {
        Ok(self.values.get(key).map(|entry| *entry.value()))
    }

    fn set_bool(&self, key: &str, value: bool) -> Result<(), PreferenceError> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }
}
