//! File-backed storage collaborator
//!
//! Persists the catalog document, the operational settings document and a
//! small constants map as JSON files under the configured data directory.
//! Writes are atomic (temp file + rename). The settings and constants
//! documents each have their own internal lock; the catalog document is
//! serialized one level up, by [`crate::catalog::CatalogStore`], because its
//! read-modify-write cycles span several calls.

use crate::toggles::Toggles;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::debug;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StorageError {
    /// Error during JSON serialization or deserialization
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// Standard I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// The persisted document has an unexpected shape
    #[error("malformed document {0}: {1}")]
    Malformed(String, String),
}

/// Narrow storage surface consumed by the session controller components
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Store: Send + Sync {
    /// Load a JSON document, `Value::Null` if the file does not exist yet
    async fn load(&self, path: &Path) -> Result<Value, StorageError>;
    /// Atomically overwrite a JSON document
    async fn update_file(&self, doc: &Value, path: &Path) -> Result<(), StorageError>;
    /// Read a document's raw bytes verbatim
    async fn read_raw(&self, path: &Path) -> Result<Vec<u8>, StorageError>;
    /// Read the persisted toggles without modifying them
    async fn read_settings(&self) -> Result<Toggles, StorageError>;
    /// Merge the full toggles object into the persisted settings document
    /// and return the canonical merged result
    async fn load_settings(&self, patch: Toggles) -> Result<Toggles, StorageError>;
    /// Read a small persisted scalar
    async fn get_const(&self, key: &str) -> Result<Option<Value>, StorageError>;
    /// Persist a small scalar
    async fn set_const(&self, key: &str, value: Value) -> Result<(), StorageError>;
}

/// JSON-file storage rooted at the configured data directory
pub struct FileStorage {
    settings_path: PathBuf,
    consts_path: PathBuf,
    // Independent single-writer guards: the settings document and the
    // constants document are distinct resources.
    settings_lock: Mutex<()>,
    consts_lock: Mutex<()>,
}

impl FileStorage {
    /// Create the storage and the directories it writes into
    ///
    /// # Errors
    ///
    /// Returns an error if the data directories cannot be created.
    pub async fn new(settings_path: PathBuf, consts_path: PathBuf) -> Result<Self, StorageError> {
        for path in [&settings_path, &consts_path] {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).await?;
            }
        }
        Ok(Self {
            settings_path,
            consts_path,
            settings_lock: Mutex::new(()),
            consts_lock: Mutex::new(()),
        })
    }

    async fn read_json(path: &Path) -> Result<Value, StorageError> {
        match fs::read_to_string(path).await {
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Value::Null),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StorageError> {
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, bytes).await?;
        fs::rename(&tmp, path).await?;
        debug!("persisted {}", path.display());
        Ok(())
    }

    async fn read_object(path: &Path) -> Result<Map<String, Value>, StorageError> {
        match Self::read_json(path).await? {
            Value::Null => Ok(Map::new()),
            Value::Object(map) => Ok(map),
            other => Err(StorageError::Malformed(
                path.display().to_string(),
                format!("expected object, got {other}"),
            )),
        }
    }
}

#[async_trait]
impl Store for FileStorage {
    async fn load(&self, path: &Path) -> Result<Value, StorageError> {
        Self::read_json(path).await
    }

    async fn update_file(&self, doc: &Value, path: &Path) -> Result<(), StorageError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Self::write_atomic(path, &serde_json::to_vec_pretty(doc)?).await
    }

    async fn read_raw(&self, path: &Path) -> Result<Vec<u8>, StorageError> {
        Ok(fs::read(path).await?)
    }

    async fn read_settings(&self) -> Result<Toggles, StorageError> {
        let map = Self::read_object(&self.settings_path).await?;
        Ok(serde_json::from_value(Value::Object(map))?)
    }

    async fn load_settings(&self, patch: Toggles) -> Result<Toggles, StorageError> {
        let _guard = self.settings_lock.lock().await;

        // Overlay only the six toggle keys; the settings document may carry
        // keys owned by other subsystems and those must survive the merge.
        let mut map = Self::read_object(&self.settings_path).await?;
        let patch_value = serde_json::to_value(patch)?;
        if let Value::Object(patch_map) = patch_value {
            for (key, value) in patch_map {
                map.insert(key, value);
            }
        }

        let merged = Value::Object(map);
        Self::write_atomic(&self.settings_path, &serde_json::to_vec_pretty(&merged)?).await?;
        Ok(serde_json::from_value(merged)?)
    }

    async fn get_const(&self, key: &str) -> Result<Option<Value>, StorageError> {
        let _guard = self.consts_lock.lock().await;
        let map = Self::read_object(&self.consts_path).await?;
        Ok(map.get(key).cloned())
    }

    async fn set_const(&self, key: &str, value: Value) -> Result<(), StorageError> {
        let _guard = self.consts_lock.lock().await;
        let mut map = Self::read_object(&self.consts_path).await?;
        map.insert(key.to_string(), value);
        Self::write_atomic(
            &self.consts_path,
            &serde_json::to_vec_pretty(&Value::Object(map))?,
        )
        .await
    }
}
