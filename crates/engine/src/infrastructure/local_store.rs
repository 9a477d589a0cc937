//! Local durable key-value stores.
//!
//! The file store keeps every key in a single JSON object on disk:
//! - Linux: ~/.config/charpick/storage.json
//! - macOS: ~/Library/Application Support/io.charpick.charpick/storage.json
//! - Windows: C:\Users\<User>\AppData\Roaming\charpick\charpick\storage.json

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use directories::ProjectDirs;
use tokio::sync::Mutex;

use crate::infrastructure::ports::{DurableStore, DurableStoreError};

const STORAGE_FILE_NAME: &str = "storage.json";

/// Platform config directory location, or the working directory when the
/// platform has none.
pub fn default_storage_path() -> PathBuf {
    match ProjectDirs::from("io", "charpick", "charpick") {
        Some(dirs) => dirs.config_dir().join(STORAGE_FILE_NAME),
        None => PathBuf::from("charpick_storage.json"),
    }
}

/// JSON-file backed durable store with an in-memory read cache.
pub struct FileDurableStore {
    storage_path: PathBuf,
    cache: RwLock<HashMap<String, String>>,
    /// Serializes file writes so an older snapshot never lands last.
    write_lock: Mutex<()>,
}

impl FileDurableStore {
    /// Open the store, loading existing data if the file exists.
    ///
    /// An unreadable or corrupt file starts the store empty rather than
    /// failing; the next write replaces it.
    pub async fn open(storage_path: impl Into<PathBuf>) -> Self {
        let storage_path = storage_path.into();
        let cache = match tokio::fs::read_to_string(&storage_path).await {
            Ok(data) => match serde_json::from_str::<HashMap<String, String>>(&data) {
                Ok(map) => map,
                Err(e) => {
                    tracing::warn!(path = ?storage_path, error = %e, "Failed to parse storage file");
                    HashMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => {
                tracing::warn!(path = ?storage_path, error = %e, "Failed to read storage file");
                HashMap::new()
            }
        };

        tracing::debug!(path = ?storage_path, keys = cache.len(), "File storage initialized");

        Self {
            storage_path,
            cache: RwLock::new(cache),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.storage_path
    }

    async fn persist(&self, key: &str) -> Result<(), DurableStoreError> {
        let _guard = self.write_lock.lock().await;

        let data = {
            let cache = self.cache.read().unwrap_or_else(PoisonError::into_inner);
            serde_json::to_string_pretty(&*cache)
                .map_err(|e| DurableStoreError::serialization(key, e))?
        };

        if let Some(parent) = self.storage_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| DurableStoreError::io(key, e))?;
            }
        }

        let tmp_path = self.storage_path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, data)
            .await
            .map_err(|e| DurableStoreError::io(key, e))?;
        tokio::fs::rename(&tmp_path, &self.storage_path)
            .await
            .map_err(|e| DurableStoreError::io(key, e))
    }
}

#[async_trait]
impl DurableStore for FileDurableStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, DurableStoreError> {
        let cache = self.cache.read().unwrap_or_else(PoisonError::into_inner);
        Ok(cache.get(key).map(|value| value.clone().into_bytes()))
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<(), DurableStoreError> {
        let value = std::str::from_utf8(value)
            .map_err(|e| DurableStoreError::serialization(key, e))?
            .to_string();
        {
            let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
            cache.insert(key.to_string(), value);
        }
        self.persist(key).await
    }
}

/// Process-local durable store, for tests and ephemeral sessions.
#[derive(Default)]
pub struct InMemoryDurableStore {
    entries: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemoryDurableStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, key: &str, value: impl Into<Vec<u8>>) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.into());
    }

    pub fn value(&self, key: &str) -> Option<Vec<u8>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }
}

#[async_trait]
impl DurableStore for InMemoryDurableStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, DurableStoreError> {
        Ok(self.value(key))
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<(), DurableStoreError> {
        self.insert(key, value);
        Ok(())
    }
}
