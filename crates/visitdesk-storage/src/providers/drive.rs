//! Cloud drive backup provider.
//!
//! Files live flat inside one configured folder and are addressed by name.
//! New files go through the multipart upload endpoint (metadata and media
//! in a single `multipart/related` request); writing an existing name
//! replaces its content in place.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use serde::Deserialize;
use tracing::{debug, info};

use visitdesk_core::error::{AppError, ErrorKind};
use visitdesk_core::result::AppResult;
use visitdesk_core::traits::storage::{StorageObjectMeta, StorageProvider};

use crate::oauth::OAuthTokenManager;

const FILE_FIELDS: &str = "id,name,size,mimeType,modifiedTime";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveFile {
    id: String,
    name: String,
    #[serde(default)]
    size: Option<String>,
    #[serde(default)]
    mime_type: Option<String>,
    #[serde(default)]
    modified_time: Option<chrono::DateTime<chrono::Utc>>,
}

impl DriveFile {
    fn into_meta(self) -> StorageObjectMeta {
        StorageObjectMeta {
            path: self.name,
            size_bytes: self.size.and_then(|s| s.parse().ok()).unwrap_or(0),
            mime_type: self.mime_type,
            last_modified: self.modified_time,
        }
    }
}

#[derive(Debug, Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

/// Backup provider that uploads to a cloud drive folder.
#[derive(Debug, Clone)]
pub struct DriveStorageProvider {
    http: reqwest::Client,
    tokens: Arc<OAuthTokenManager>,
    api_base: String,
    upload_base: String,
    folder_id: Option<String>,
}

impl DriveStorageProvider {
    /// Create a provider using the endpoints and folder from the token
    /// manager's configuration.
    pub fn new(http: reqwest::Client, tokens: Arc<OAuthTokenManager>) -> Self {
        let config = tokens.config();
        let folder_id = Some(config.folder_id.trim().to_string()).filter(|f| !f.is_empty());
        Self {
            api_base: config.api_base_url.trim_end_matches('/').to_string(),
            upload_base: config.upload_base_url.trim_end_matches('/').to_string(),
            folder_id,
            http,
            tokens,
        }
    }

    /// Search query selecting non-trashed files in the target folder,
    /// optionally narrowed to an exact name.
    fn search_query(&self, name: Option<&str>) -> String {
        let mut q = String::from("trashed = false");
        if let Some(folder) = &self.folder_id {
            q.push_str(&format!(" and '{}' in parents", escape_query(folder)));
        }
        if let Some(name) = name {
            q.push_str(&format!(" and name = '{}'", escape_query(name)));
        }
        q
    }

    async fn find_file(&self, name: &str) -> AppResult<Option<DriveFile>> {
        let files = self.search(Some(name)).await?;
        Ok(files.into_iter().next())
    }

    async fn search(&self, name: Option<&str>) -> AppResult<Vec<DriveFile>> {
        let token = self.tokens.access_token().await?;
        let fields = format!("files({FILE_FIELDS})");
        let resp = self
            .http
            .get(format!("{}/files", self.api_base))
            .bearer_auth(token)
            .query(&[
                ("q", self.search_query(name).as_str()),
                ("fields", fields.as_str()),
                ("orderBy", "name"),
                ("pageSize", "1000"),
            ])
            .send()
            .await
            .map_err(transport_error)?;
        let resp = check_response(resp, "list files").await?;
        let list: FileList = resp.json().await.map_err(|e| {
            AppError::with_source(ErrorKind::ExternalService, "Malformed file list", e)
        })?;
        Ok(list.files)
    }

    async fn create(&self, name: &str, data: Bytes, mime_type: &str) -> AppResult<()> {
        let token = self.tokens.access_token().await?;
        let boundary = format!("visitdesk-{}", uuid::Uuid::new_v4().simple());
        let body = multipart_related_body(
            &boundary,
            &file_metadata(name, mime_type, self.folder_id.as_deref()),
            mime_type,
            &data,
        );

        let resp = self
            .http
            .post(format!("{}/files", self.upload_base))
            .bearer_auth(token)
            .query(&[("uploadType", "multipart"), ("fields", FILE_FIELDS)])
            .header(
                reqwest::header::CONTENT_TYPE,
                format!("multipart/related; boundary={boundary}"),
            )
            .body(body)
            .send()
            .await
            .map_err(transport_error)?;
        check_response(resp, "upload file").await?;
        info!(name, bytes = data.len(), "Uploaded backup to cloud drive");
        Ok(())
    }

    async fn replace(&self, file_id: &str, name: &str, data: Bytes, mime_type: &str) -> AppResult<()> {
        let token = self.tokens.access_token().await?;
        let len = data.len();
        let resp = self
            .http
            .patch(format!("{}/files/{file_id}", self.upload_base))
            .bearer_auth(token)
            .query(&[("uploadType", "media")])
            .header(reqwest::header::CONTENT_TYPE, mime_type)
            .body(data)
            .send()
            .await
            .map_err(transport_error)?;
        check_response(resp, "replace file").await?;
        info!(name, bytes = len, "Replaced backup on cloud drive");
        Ok(())
    }
}

#[async_trait]
impl StorageProvider for DriveStorageProvider {
    fn provider_type(&self) -> &str {
        "drive"
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(self.tokens.access_token().await.is_ok())
    }

    async fn read_bytes(&self, path: &str) -> AppResult<Bytes> {
        let file = self
            .find_file(path)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Drive file not found: {path}")))?;
        let token = self.tokens.access_token().await?;
        let resp = self
            .http
            .get(format!("{}/files/{}", self.api_base, file.id))
            .bearer_auth(token)
            .query(&[("alt", "media")])
            .send()
            .await
            .map_err(transport_error)?;
        let resp = check_response(resp, "download file").await?;
        resp.bytes().await.map_err(transport_error)
    }

    async fn write(&self, path: &str, data: Bytes, mime_type: &str) -> AppResult<()> {
        match self.find_file(path).await? {
            Some(existing) => self.replace(&existing.id, path, data, mime_type).await,
            None => self.create(path, data, mime_type).await,
        }
    }

    async fn delete(&self, path: &str) -> AppResult<()> {
        let Some(file) = self.find_file(path).await? else {
            return Ok(());
        };
        let token = self.tokens.access_token().await?;
        let resp = self
            .http
            .delete(format!("{}/files/{}", self.api_base, file.id))
            .bearer_auth(token)
            .send()
            .await
            .map_err(transport_error)?;
        check_response(resp, "delete file").await?;
        debug!(path, "Deleted drive file");
        Ok(())
    }

    async fn exists(&self, path: &str) -> AppResult<bool> {
        Ok(self.find_file(path).await?.is_some())
    }

    async fn list(&self, _path: &str) -> AppResult<Vec<StorageObjectMeta>> {
        Ok(self
            .search(None)
            .await?
            .into_iter()
            .map(DriveFile::into_meta)
            .collect())
    }
}

/// Map a non-success response to an external-service error.
pub(crate) async fn check_response(
    resp: reqwest::Response,
    what: &str,
) -> AppResult<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    let kind = if status == reqwest::StatusCode::UNAUTHORIZED {
        ErrorKind::Authentication
    } else {
        ErrorKind::ExternalService
    };
    Err(AppError::new(
        kind,
        format!("Cloud drive {what} failed: HTTP {status}: {}", truncate(&body, 300)),
    ))
}

fn transport_error(e: reqwest::Error) -> AppError {
    AppError::with_source(ErrorKind::ExternalService, "Cloud drive request failed", e)
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

fn escape_query(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

fn file_metadata(name: &str, mime_type: &str, folder: Option<&str>) -> serde_json::Value {
    let mut meta = serde_json::json!({ "name": name, "mimeType": mime_type });
    if let Some(folder) = folder {
        meta["parents"] = serde_json::json!([folder]);
    }
    meta
}

/// Build a `multipart/related` body: a JSON metadata part then the media part.
fn multipart_related_body(
    boundary: &str,
    metadata: &serde_json::Value,
    mime_type: &str,
    data: &[u8],
) -> Vec<u8> {
    let mut body = Vec::with_capacity(data.len() + 512);
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{metadata}\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("--{boundary}\r\nContent-Type: {mime_type}\r\n\r\n").as_bytes());
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::SettingsStore;
    use visitdesk_core::config::storage::DriveConfig;

    async fn provider(folder: &str) -> (DriveStorageProvider, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let settings = Arc::new(
            SettingsStore::open(dir.path().join("settings.json"))
                .await
                .unwrap(),
        );
        let config = DriveConfig {
            enabled: true,
            folder_id: folder.into(),
            api_base_url: "https://drive.test/v3/".into(),
            ..Default::default()
        };
        let http = reqwest::Client::new();
        let tokens = Arc::new(OAuthTokenManager::new(config, http.clone(), settings));
        (DriveStorageProvider::new(http, tokens), dir)
    }

    #[tokio::test]
    async fn search_query_scopes_to_folder_and_escapes() {
        let (p, _dir) = provider("folder-1").await;
        assert_eq!(p.api_base, "https://drive.test/v3");
        assert_eq!(
            p.search_query(Some("o'neil.csv")),
            "trashed = false and 'folder-1' in parents and name = 'o\\'neil.csv'"
        );

        let (root, _dir2) = provider("  ").await;
        assert_eq!(root.search_query(None), "trashed = false");
    }

    #[test]
    fn multipart_body_has_metadata_then_media() {
        let meta = file_metadata("b.csv", "text/csv", Some("f1"));
        assert_eq!(meta["parents"][0], "f1");

        let body = multipart_related_body("XYZ", &meta, "text/csv", b"a,b\n1,2");
        let text = String::from_utf8(body).unwrap();
        let meta_at = text.find("application/json").unwrap();
        let media_at = text.find("a,b\n1,2").unwrap();
        assert!(text.starts_with("--XYZ\r\n"));
        assert!(meta_at < media_at);
        assert!(text.ends_with("\r\n--XYZ--\r\n"));
    }

    #[test]
    fn drive_file_size_parses_from_string() {
        let file: DriveFile = serde_json::from_value(serde_json::json!({
            "id": "1",
            "name": "snap.json",
            "size": "2048",
            "mimeType": "application/json"
        }))
        .unwrap();
        let meta = file.into_meta();
        assert_eq!(meta.size_bytes, 2048);
        assert_eq!(meta.path, "snap.json");
    }

    #[tokio::test]
    async fn disconnected_drive_is_unhealthy() {
        let (p, _dir) = provider("f").await;
        assert!(!p.health_check().await.unwrap());
        assert_eq!(p.provider_type(), "drive");
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo", 2), "hé");
        assert_eq!(truncate("hi", 10), "hi");
    }
}
