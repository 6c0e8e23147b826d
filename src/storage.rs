//! Local key-value storage and the credential holder built on it.
//!
//! The store mirrors browser local storage: a flat map of string keys to
//! string values. The credential is a single entry under
//! [`CREDENTIAL_STORAGE_KEY`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use crate::error::{AdvisorError, Result};

pub const CREDENTIAL_STORAGE_KEY: &str = "gemini_api_key";

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// Process-local store; contents vanish with the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every entry, like wiping browser storage.
    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
        Ok(())
    }
}

/// JSON object file on disk. Writes go through a temp file and a rename.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) if content.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(content) => serde_json::from_str(&content).map_err(|e| AdvisorError::Storage {
                message: format!("{} is not a JSON string map: {}", self.path.display(), e),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(entries)?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entries = self.read_all()?;
        entries.insert(key.to_string(), value.to_string());
        self.write_all(&entries)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entries = self.read_all()?;
        if entries.remove(key).is_some() {
            self.write_all(&entries)?;
        }
        Ok(())
    }
}

/// Holds the generative endpoint credential for a resolver.
///
/// The persisted value is read once at construction; later reads are served
/// from memory. Values are never validated.
pub struct CredentialHolder {
    store: Arc<dyn KeyValueStore>,
    current: RwLock<Option<String>>,
}

impl CredentialHolder {
    pub fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let current = match store.get(CREDENTIAL_STORAGE_KEY) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Failed to read stored credential, treating as absent: {}", e);
                None
            }
        };
        Self {
            store,
            current: RwLock::new(current),
        }
    }

    /// Holder over a fresh [`MemoryStore`].
    pub fn in_memory() -> Self {
        Self::load(Arc::new(MemoryStore::new()))
    }

    pub fn get_credential(&self) -> Option<String> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The credential if it would enable the external call (non-empty).
    pub fn active_credential(&self) -> Option<String> {
        self.get_credential().filter(|c| !c.is_empty())
    }

    /// Overwrite and persist. On a storage failure the in-memory value is
    /// left unchanged.
    pub fn set_credential(&self, value: impl Into<String>) -> Result<()> {
        let value = value.into();
        self.store.set(CREDENTIAL_STORAGE_KEY, &value)?;
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(value);
        tracing::info!("Credential updated");
        Ok(())
    }

    pub fn clear_credential(&self) -> Result<()> {
        self.store.remove(CREDENTIAL_STORAGE_KEY)?;
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = None;
        tracing::info!("Credential cleared");
        Ok(())
    }
}

impl std::fmt::Debug for CredentialHolder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialHolder")
            .field("configured", &self.active_credential().is_some())
            .finish()
    }
}
