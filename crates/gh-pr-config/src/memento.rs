//! Workspace-scoped key/value persistence
//!
//! A `Memento` is the small durable store the sidebar keeps per workspace
//! (expanded categories, checkbox state). Values are JSON so callers can
//! store sets and maps without a schema of their own.
//!
//! `FileMemento` writes through on every update, so a crash never loses
//! more than the update in flight.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

const STATE_VERSION: u32 = 1;

/// Scoped key/value persistence surface
pub trait Memento: Send + Sync {
    /// Read the value stored under `key`
    fn get(&self, key: &str) -> Option<Value>;

    /// Store `value` under `key`, persisting it before returning
    fn update(&self, key: &str, value: Value) -> Result<()>;

    /// All keys currently stored
    fn keys(&self) -> Vec<String>;
}

/// In-memory memento for tests and ephemeral workspaces
#[derive(Debug, Default)]
pub struct MemoryMemento {
    values: Mutex<BTreeMap<String, Value>>,
    writes: AtomicUsize,
}

impl MemoryMemento {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `update` calls so far
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl Memento for MemoryMemento {
    fn get(&self, key: &str) -> Option<Value> {
        let values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        values.get(key).cloned()
    }

    fn update(&self, key: &str, value: Value) -> Result<()> {
        let mut values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        values.insert(key.to_string(), value);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        let values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        values.keys().cloned().collect()
    }
}

/// State file metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateMeta {
    pub last_modified: DateTime<Utc>,
    pub version: u32,
}

/// On-disk layout of a workspace state file
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StateFile {
    meta: StateMeta,
    #[serde(default)]
    values: BTreeMap<String, Value>,
}

/// JSON file backed memento, one file per workspace
#[derive(Debug)]
pub struct FileMemento {
    path: PathBuf,
    values: Mutex<BTreeMap<String, Value>>,
}

impl FileMemento {
    /// Open the state file of a workspace root (see [`crate::workspace_state_path`])
    pub fn for_workspace(workspace_root: &Path) -> Result<Self> {
        let path = crate::paths::workspace_state_path(workspace_root)?;
        Ok(Self::open(path))
    }

    /// Open a state file at an explicit path
    ///
    /// A missing or unreadable file yields an empty store; the next
    /// update rewrites it.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = match Self::load_from_path(&path) {
            Ok(state) => {
                log::info!("Loaded workspace state from {:?}", path);
                state.values
            }
            Err(e) => {
                if path.exists() {
                    log::warn!("Ignoring unreadable workspace state: {:#}", e);
                } else {
                    log::debug!("No workspace state at {:?}, starting empty", path);
                }
                BTreeMap::new()
            }
        };

        Self {
            path,
            values: Mutex::new(values),
        }
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load_from_path(path: &Path) -> Result<StateFile> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read state file: {:?}", path))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse state file: {:?}", path))
    }

    fn save(&self, values: &BTreeMap<String, Value>) -> Result<()> {
        let state = StateFile {
            meta: StateMeta {
                last_modified: Utc::now(),
                version: STATE_VERSION,
            },
            values: values.clone(),
        };
        let content = serde_json::to_string_pretty(&state).context("Failed to serialize state")?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(&self.path, content)
            .with_context(|| format!("Failed to write state file: {:?}", self.path))?;

        log::debug!("Saved workspace state to {:?}", self.path);
        Ok(())
    }
}

impl Memento for FileMemento {
    fn get(&self, key: &str) -> Option<Value> {
        let values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        values.get(key).cloned()
    }

    fn update(&self, key: &str, value: Value) -> Result<()> {
        let mut values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        values.insert(key.to_string(), value);
        self.save(&values)
    }

    fn keys(&self) -> Vec<String> {
        let values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        values.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_memory_memento_round_trip() {
        let memento = MemoryMemento::new();
        assert!(memento.get("expandedQueries").is_none());

        memento
            .update("expandedQueries", json!(["All Open"]))
            .unwrap();
        assert_eq!(memento.get("expandedQueries"), Some(json!(["All Open"])));
        assert_eq!(memento.keys(), vec!["expandedQueries".to_string()]);
        assert_eq!(memento.write_count(), 1);
    }

    #[test]
    fn test_file_memento_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");

        let memento = FileMemento::open(&path);
        memento
            .update("checkedFiles", json!({"src/lib.rs": true}))
            .unwrap();
        assert!(path.exists());

        let reopened = FileMemento::open(&path);
        assert_eq!(
            reopened.get("checkedFiles"),
            Some(json!({"src/lib.rs": true}))
        );
    }

    #[test]
    fn test_file_memento_ignores_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "{ not json").unwrap();

        let memento = FileMemento::open(&path);
        assert!(memento.keys().is_empty());

        // The next write replaces the corrupt content
        memento.update("expandedQueries", json!([])).unwrap();
        let reopened = FileMemento::open(&path);
        assert_eq!(reopened.get("expandedQueries"), Some(json!([])));
    }
}
