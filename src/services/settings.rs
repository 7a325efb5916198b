//! Persistent settings store
//!
//! A JSON-file-backed key/value store with dotted-path access. Module
//! install status lives under the reserved `modules.<name>` namespace and
//! is persisted on every transition so a crash mid-install leaves durable
//! evidence of the last known state.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::{Map, Value};

use crate::application::error::Result;
use crate::modules::ModuleStatus;

#[derive(Clone)]
pub struct SettingsStore {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    path: PathBuf,
    data: RwLock<Value>,
}

impl SettingsStore {
    /// Load the store from `path`. A missing file starts an empty store;
    /// the file is created on first `persist`.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let data = match std::fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Value::Object(Map::new()),
            Err(err) => return Err(err.into()),
        };

        Ok(Self {
            inner: Arc::new(StoreInner {
                path,
                data: RwLock::new(data),
            }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    /// Look up a value by dotted key (`"enrollment.poll_interval_secs"`).
    pub fn get(&self, key: &str) -> Option<Value> {
        let data = self.inner.data.read();
        let mut current = &*data;
        for part in key.split('.') {
            current = current.as_object()?.get(part)?;
        }
        Some(current.clone())
    }

    pub fn get_str(&self, key: &str) -> Option<String> {
        self.get(key).and_then(|v| v.as_str().map(String::from))
    }

    pub fn get_str_or(&self, key: &str, default: &str) -> String {
        self.get_str(key).unwrap_or_else(|| default.to_string())
    }

    pub fn get_u64_or(&self, key: &str, default: u64) -> u64 {
        self.get(key).and_then(|v| v.as_u64()).unwrap_or(default)
    }

    /// Set a value at a dotted key, creating intermediate objects as
    /// needed. Non-object intermediates are replaced.
    pub fn set(&self, key: &str, value: impl Into<Value>) {
        let mut data = self.inner.data.write();
        let mut current = &mut *data;
        let mut parts = key.split('.').peekable();
        while let Some(part) = parts.next() {
            if !current.is_object() {
                *current = Value::Object(Map::new());
            }
            let map = current.as_object_mut().expect("just ensured object");
            if parts.peek().is_none() {
                map.insert(part.to_string(), value.into());
                return;
            }
            current = map
                .entry(part.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
        }
    }

    /// Write the store to disk. Writes a sibling temp file first and
    /// renames it into place so readers never observe a half-written file.
    pub fn persist(&self) -> Result<()> {
        let serialized = {
            let data = self.inner.data.read();
            serde_json::to_string_pretty(&*data)?
        };

        if let Some(parent) = self.inner.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let tmp = self.inner.path.with_extension("json.tmp");
        std::fs::write(&tmp, serialized)?;
        std::fs::rename(&tmp, &self.inner.path)?;
        Ok(())
    }

    /// Full copy of the current settings tree (for the settings API).
    pub fn snapshot(&self) -> Value {
        self.inner.data.read().clone()
    }

    // ========================================================================
    // Module status namespace
    // ========================================================================

    /// Current status of a module; unknown or unparseable values read as
    /// `pending`.
    pub fn module_status(&self, name: &str) -> ModuleStatus {
        self.get_str(&format!("modules.{}", name))
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(ModuleStatus::Pending)
    }

    /// Record a module status and persist immediately.
    pub fn set_module_status(&self, name: &str, status: ModuleStatus) -> Result<()> {
        self.set(&format!("modules.{}", name), status.as_str());
        self.persist()
    }

    /// Snapshot of the status map for the given module names.
    pub fn module_statuses<'a>(
        &self,
        names: impl IntoIterator<Item = &'a str>,
    ) -> HashMap<String, ModuleStatus> {
        names
            .into_iter()
            .map(|name| (name.to_string(), self.module_status(name)))
            .collect()
    }
}
