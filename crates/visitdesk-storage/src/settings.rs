//! Persistent key/value settings backed by a JSON file.
//!
//! Holds the cloud drive refresh token, connection metadata and backup
//! bookkeeping. Every mutation rewrites the whole file through a temporary
//! sibling and a rename, so a crash leaves either the old or the new file.

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use visitdesk_core::error::{AppError, ErrorKind};
use visitdesk_core::result::AppResult;

/// Well-known setting keys.
pub mod keys {
    /// OAuth refresh token for the cloud drive.
    pub const DRIVE_REFRESH_TOKEN: &str = "drive.refresh_token";
    /// When the drive was connected.
    pub const DRIVE_CONNECTED_AT: &str = "drive.connected_at";
    /// Pending OAuth consent request, checked on the callback.
    pub const DRIVE_OAUTH_STATE: &str = "drive.oauth_state";
    /// Summary of the last backup run.
    pub const LAST_BACKUP: &str = "backup.last";
}

/// JSON file settings store.
#[derive(Debug)]
pub struct SettingsStore {
    path: PathBuf,
    values: RwLock<Map<String, Value>>,
}

impl SettingsStore {
    /// Open the store at `path`. A missing file starts empty; an unreadable
    /// or corrupt file is an error.
    pub async fn open(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref().to_path_buf();
        let values = match fs::read(&path).await {
            Ok(raw) if raw.is_empty() => Map::new(),
            Ok(raw) => match serde_json::from_slice::<Value>(&raw)? {
                Value::Object(map) => map,
                _ => {
                    return Err(AppError::configuration(format!(
                        "Settings file {} is not a JSON object",
                        path.display()
                    )));
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Map::new(),
            Err(e) => {
                return Err(AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to read settings file {}", path.display()),
                    e,
                ));
            }
        };
        debug!(path = %path.display(), keys = values.len(), "Opened settings store");
        Ok(Self {
            path,
            values: RwLock::new(values),
        })
    }

    /// File backing this store.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and deserialize a value. A value of the wrong shape reads as `None`.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let values = self.values.read().await;
        let value = values.get(key)?.clone();
        match serde_json::from_value(value) {
            Ok(v) => Some(v),
            Err(e) => {
                warn!(key, error = %e, "Ignoring malformed setting");
                None
            }
        }
    }

    /// Whether `key` is set.
    pub async fn contains(&self, key: &str) -> bool {
        self.values.read().await.contains_key(key)
    }

    /// Store a value and persist.
    pub async fn set<T: Serialize>(&self, key: &str, value: &T) -> AppResult<()> {
        let value = serde_json::to_value(value)?;
        let mut values = self.values.write().await;
        values.insert(key.to_string(), value);
        self.persist(&values).await
    }

    /// Remove keys and persist. Returns whether anything was removed.
    pub async fn remove(&self, keys: &[&str]) -> AppResult<bool> {
        let mut values = self.values.write().await;
        let mut removed = false;
        for key in keys {
            removed |= values.remove(*key).is_some();
        }
        if removed {
            self.persist(&values).await?;
        }
        Ok(removed)
    }

    async fn persist(&self, values: &Map<String, Value>) -> AppResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        let body = serde_json::to_vec_pretty(values)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, &body).await.map_err(|e| {
            AppError::with_source(ErrorKind::Storage, "Failed to write settings file", e)
        })?;
        fs::rename(&tmp, &self.path).await.map_err(|e| {
            AppError::with_source(ErrorKind::Storage, "Failed to replace settings file", e)
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state/settings.json");

        let store = SettingsStore::open(&path).await.unwrap();
        assert!(store.get::<String>(keys::DRIVE_REFRESH_TOKEN).await.is_none());
        store
            .set(keys::DRIVE_REFRESH_TOKEN, &"rt-123".to_string())
            .await
            .unwrap();
        store.set("backup.count", &3u32).await.unwrap();

        let reopened = SettingsStore::open(&path).await.unwrap();
        assert_eq!(
            reopened.get::<String>(keys::DRIVE_REFRESH_TOKEN).await.as_deref(),
            Some("rt-123")
        );
        assert_eq!(reopened.get::<u32>("backup.count").await, Some(3));
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn remove_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let store = SettingsStore::open(&path).await.unwrap();
        store.set("a", &1).await.unwrap();
        store.set("b", &2).await.unwrap();

        assert!(store.remove(&["a", "missing"]).await.unwrap());
        assert!(!store.remove(&["missing"]).await.unwrap());

        let reopened = SettingsStore::open(&path).await.unwrap();
        assert!(!reopened.contains("a").await);
        assert_eq!(reopened.get::<i32>("b").await, Some(2));
    }

    #[tokio::test]
    async fn wrong_shape_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::open(dir.path().join("s.json")).await.unwrap();
        store.set("n", &"text").await.unwrap();
        assert_eq!(store.get::<u64>("n").await, None);
    }

    #[tokio::test]
    async fn non_object_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("s.json");
        std::fs::write(&path, "[1,2]").unwrap();
        let err = SettingsStore::open(&path).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Configuration);
    }
}
