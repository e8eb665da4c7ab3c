//! Backup storage and cloud drive configuration.

use serde::{Deserialize, Serialize};

/// Top-level storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory for all runtime data.
    #[serde(default = "default_data_root")]
    pub data_root: String,
    /// Directory (under `data_root` unless absolute) that receives local backups.
    #[serde(default = "default_backup_dir")]
    pub backup_dir: String,
    /// File holding persisted settings and OAuth tokens.
    #[serde(default = "default_settings_file")]
    pub settings_file: String,
    /// Cloud drive upload configuration.
    #[serde(default)]
    pub drive: DriveConfig,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_root: default_data_root(),
            backup_dir: default_backup_dir(),
            settings_file: default_settings_file(),
            drive: DriveConfig::default(),
        }
    }
}

impl StorageConfig {
    /// Absolute or `data_root`-relative path of the backup directory.
    pub fn backup_path(&self) -> std::path::PathBuf {
        resolve(&self.data_root, &self.backup_dir)
    }

    /// Absolute or `data_root`-relative path of the settings file.
    pub fn settings_path(&self) -> std::path::PathBuf {
        resolve(&self.data_root, &self.settings_file)
    }
}

fn resolve(root: &str, path: &str) -> std::path::PathBuf {
    let p = std::path::Path::new(path);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        std::path::Path::new(root).join(p)
    }
}

/// OAuth2 client and upload target for the cloud drive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriveConfig {
    /// Whether uploads to the cloud drive are enabled.
    #[serde(default)]
    pub enabled: bool,
    /// OAuth2 client ID.
    #[serde(default)]
    pub client_id: String,
    /// OAuth2 client secret.
    #[serde(default)]
    pub client_secret: String,
    /// Redirect URI registered for the client.
    #[serde(default = "default_redirect_uri")]
    pub redirect_uri: String,
    /// Folder that receives uploaded backups (empty = drive root).
    #[serde(default)]
    pub folder_id: String,
    /// Consent page URL.
    #[serde(default = "default_auth_url")]
    pub auth_url: String,
    /// Token endpoint URL.
    #[serde(default = "default_token_url")]
    pub token_url: String,
    /// Files API base URL.
    #[serde(default = "default_api_base")]
    pub api_base_url: String,
    /// Upload API base URL.
    #[serde(default = "default_upload_base")]
    pub upload_base_url: String,
    /// Requested OAuth scope.
    #[serde(default = "default_scope")]
    pub scope: String,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            client_id: String::new(),
            client_secret: String::new(),
            redirect_uri: default_redirect_uri(),
            folder_id: String::new(),
            auth_url: default_auth_url(),
            token_url: default_token_url(),
            api_base_url: default_api_base(),
            upload_base_url: default_upload_base(),
            scope: default_scope(),
        }
    }
}

fn default_data_root() -> String {
    "./data".to_string()
}

fn default_backup_dir() -> String {
    "backups".to_string()
}

fn default_settings_file() -> String {
    "settings.json".to_string()
}

fn default_redirect_uri() -> String {
    "http://localhost:8080/api/admin/backup/drive/callback".to_string()
}

fn default_auth_url() -> String {
    "https://accounts.google.com/o/oauth2/v2/auth".to_string()
}

fn default_token_url() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

fn default_api_base() -> String {
    "https://www.googleapis.com/drive/v3".to_string()
}

fn default_upload_base() -> String {
    "https://www.googleapis.com/upload/drive/v3".to_string()
}

fn default_scope() -> String {
    "https://www.googleapis.com/auth/drive.file".to_string()
}
