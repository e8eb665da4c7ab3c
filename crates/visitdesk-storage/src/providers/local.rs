//! Local filesystem backup provider.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use tracing::debug;

use visitdesk_core::error::{AppError, ErrorKind};
use visitdesk_core::result::AppResult;
use visitdesk_core::traits::storage::{StorageObjectMeta, StorageProvider};

/// Writes backup artifacts under a root directory.
#[derive(Debug, Clone)]
pub struct LocalStorageProvider {
    /// Root directory for all stored files.
    root: PathBuf,
}

impl LocalStorageProvider {
    /// Create a provider rooted at `root`, creating the directory if needed.
    pub async fn new(root: impl AsRef<Path>) -> AppResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create backup directory: {}", root.display()),
                e,
            )
        })?;
        Ok(Self { root })
    }

    /// The root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a relative path inside the root. Parent segments are dropped.
    fn resolve(&self, path: &str) -> PathBuf {
        let clean: PathBuf = path
            .split('/')
            .filter(|seg| !seg.is_empty() && *seg != "." && *seg != "..")
            .collect();
        self.root.join(clean)
    }

    async fn ensure_parent(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to create parent directory: {}", parent.display()),
                    e,
                )
            })?;
        }
        Ok(())
    }
}

#[async_trait]
impl StorageProvider for LocalStorageProvider {
    fn provider_type(&self) -> &str {
        "local"
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(fs::metadata(&self.root)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false))
    }

    async fn read_bytes(&self, path: &str) -> AppResult<Bytes> {
        let full_path = self.resolve(path);
        let data = fs::read(&full_path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AppError::not_found(format!("Backup file not found: {path}"))
            } else {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to read backup file: {path}"),
                    e,
                )
            }
        })?;
        Ok(Bytes::from(data))
    }

    async fn write(&self, path: &str, data: Bytes, _mime_type: &str) -> AppResult<()> {
        let full_path = self.resolve(path);
        self.ensure_parent(&full_path).await?;

        // Write beside the target, then rename, so readers never see a partial file.
        let tmp_path = full_path.with_extension(format!("tmp-{}", uuid::Uuid::new_v4().simple()));
        fs::write(&tmp_path, &data).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to write backup file: {path}"),
                e,
            )
        })?;
        fs::rename(&tmp_path, &full_path).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to finalize backup file: {path}"),
                e,
            )
        })?;

        debug!(path, bytes = data.len(), "Wrote backup file");
        Ok(())
    }

    async fn delete(&self, path: &str) -> AppResult<()> {
        let full_path = self.resolve(path);
        match fs::remove_file(&full_path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to delete backup file: {path}"),
                e,
            )),
        }
    }

    async fn exists(&self, path: &str) -> AppResult<bool> {
        Ok(fs::try_exists(self.resolve(path)).await.unwrap_or(false))
    }

    async fn list(&self, path: &str) -> AppResult<Vec<StorageObjectMeta>> {
        let full_path = self.resolve(path);
        let mut dir = match fs::read_dir(&full_path).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to list directory: {path}"),
                    e,
                ));
            }
        };

        let mut entries = Vec::new();
        while let Some(entry) = dir.next_entry().await? {
            let meta = entry.metadata().await?;
            if !meta.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            let entry_path = if path.trim_matches('/').is_empty() {
                name
            } else {
                format!("{}/{}", path.trim_end_matches('/'), name)
            };
            entries.push(StorageObjectMeta {
                mime_type: mime_from_path(&entry_path),
                path: entry_path,
                size_bytes: meta.len(),
                last_modified: meta.modified().ok().map(chrono::DateTime::<chrono::Utc>::from),
            });
        }

        entries.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(entries)
    }
}

fn mime_from_path(path: &str) -> Option<String> {
    let ext = path.rsplit('.').next()?.to_lowercase();
    let mime = match ext.as_str() {
        "csv" => "text/csv",
        "json" => "application/json",
        "txt" => "text/plain",
        _ => return None,
    };
    Some(mime.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn write_read_delete() {
        let dir = tempfile::tempdir().unwrap();
        let provider = LocalStorageProvider::new(dir.path()).await.unwrap();

        let data = Bytes::from("id,name\n1,Ann\n");
        provider
            .write("2026/visitors.csv", data.clone(), "text/csv")
            .await
            .unwrap();
        assert!(provider.exists("2026/visitors.csv").await.unwrap());
        assert_eq!(provider.read_bytes("2026/visitors.csv").await.unwrap(), data);

        provider.delete("2026/visitors.csv").await.unwrap();
        assert!(!provider.exists("2026/visitors.csv").await.unwrap());
        provider.delete("2026/visitors.csv").await.unwrap();
    }

    #[tokio::test]
    async fn list_returns_sorted_files_only() {
        let dir = tempfile::tempdir().unwrap();
        let provider = LocalStorageProvider::new(dir.path()).await.unwrap();
        provider
            .write("b.json", Bytes::from("{}"), "application/json")
            .await
            .unwrap();
        provider
            .write("a.csv", Bytes::from("x"), "text/csv")
            .await
            .unwrap();
        provider
            .write("nested/c.csv", Bytes::from("y"), "text/csv")
            .await
            .unwrap();

        let listed = provider.list("").await.unwrap();
        let names: Vec<_> = listed.iter().map(|m| m.path.as_str()).collect();
        assert_eq!(names, vec!["a.csv", "b.json"]);
        assert_eq!(listed[0].mime_type.as_deref(), Some("text/csv"));
    }

    #[tokio::test]
    async fn parent_segments_stay_inside_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("backups");
        let provider = LocalStorageProvider::new(&root).await.unwrap();
        provider
            .write("../escape.txt", Bytes::from("x"), "text/plain")
            .await
            .unwrap();
        assert!(root.join("escape.txt").exists());
        assert!(!dir.path().join("escape.txt").exists());
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let provider = LocalStorageProvider::new(dir.path()).await.unwrap();
        let err = provider.read_bytes("nope.csv").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
        assert!(provider.list("missing").await.unwrap().is_empty());
    }
}
