//! OAuth2 authorization-code flow for the cloud drive.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info};

use visitdesk_core::config::storage::DriveConfig;
use visitdesk_core::error::{AppError, ErrorKind};
use visitdesk_core::result::AppResult;

use crate::settings::{SettingsStore, keys};

/// Access tokens are refreshed this long before they expire.
const EXPIRY_SKEW_SECONDS: i64 = 60;

/// Token endpoint response.
#[derive(Debug, Clone, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    refresh_token: Option<String>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(EXPIRY_SKEW_SECONDS) < self.expires_at
    }
}

/// Drive connection state as reported to administrators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriveConnection {
    /// Whether uploads are enabled in configuration.
    pub enabled: bool,
    /// Whether a refresh token is stored.
    pub connected: bool,
    /// When the drive was connected.
    pub connected_at: Option<DateTime<Utc>>,
}

/// Exchanges authorization codes and keeps a valid access token at hand.
#[derive(Debug)]
pub struct OAuthTokenManager {
    config: DriveConfig,
    http: reqwest::Client,
    settings: Arc<SettingsStore>,
    cached: RwLock<Option<CachedToken>>,
}

impl OAuthTokenManager {
    /// Create a token manager that persists its refresh token in `settings`.
    pub fn new(config: DriveConfig, http: reqwest::Client, settings: Arc<SettingsStore>) -> Self {
        Self {
            config,
            http,
            settings,
            cached: RwLock::new(None),
        }
    }

    /// Drive configuration.
    pub fn config(&self) -> &DriveConfig {
        &self.config
    }

    /// Consent page URL for an administrator to grant access.
    pub fn authorization_url(&self, state: &str) -> AppResult<String> {
        self.ensure_configured()?;
        let url = reqwest::Url::parse_with_params(
            &self.config.auth_url,
            &[
                ("client_id", self.config.client_id.as_str()),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("response_type", "code"),
                ("scope", self.config.scope.as_str()),
                ("access_type", "offline"),
                ("prompt", "consent"),
                ("state", state),
            ],
        )
        .map_err(|e| {
            AppError::with_source(ErrorKind::Configuration, "Invalid drive auth_url", e)
        })?;
        Ok(url.into())
    }

    /// Exchange an authorization code and store the refresh token.
    pub async fn exchange_code(&self, code: &str) -> AppResult<()> {
        self.ensure_configured()?;
        if code.trim().is_empty() {
            return Err(AppError::validation("Authorization code is required"));
        }

        let token = self
            .request_token(&[
                ("grant_type", "authorization_code"),
                ("code", code.trim()),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("redirect_uri", self.config.redirect_uri.as_str()),
            ])
            .await?;

        let refresh = token.refresh_token.clone().ok_or_else(|| {
            AppError::external("Token endpoint did not return a refresh token; re-consent is required")
        })?;
        self.settings.set(keys::DRIVE_REFRESH_TOKEN, &refresh).await?;
        self.settings.set(keys::DRIVE_CONNECTED_AT, &Utc::now()).await?;
        self.cache(token).await;

        info!("Cloud drive connected");
        Ok(())
    }

    /// A valid access token, refreshed when the cached one is about to expire.
    pub async fn access_token(&self) -> AppResult<String> {
        if let Some(cached) = self.cached.read().await.as_ref() {
            if cached.is_fresh(Utc::now()) {
                return Ok(cached.access_token.clone());
            }
        }

        let refresh: String = self
            .settings
            .get(keys::DRIVE_REFRESH_TOKEN)
            .await
            .ok_or_else(|| AppError::configuration("Cloud drive is not connected"))?;

        let token = self
            .request_token(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh.as_str()),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
            ])
            .await?;

        // Some providers rotate the refresh token.
        if let Some(rotated) = &token.refresh_token {
            if *rotated != refresh {
                self.settings.set(keys::DRIVE_REFRESH_TOKEN, rotated).await?;
            }
        }

        let access = token.access_token.clone();
        self.cache(token).await;
        debug!("Refreshed cloud drive access token");
        Ok(access)
    }

    /// Whether a refresh token is stored.
    pub async fn is_connected(&self) -> bool {
        self.settings.contains(keys::DRIVE_REFRESH_TOKEN).await
    }

    /// Current connection state.
    pub async fn connection(&self) -> DriveConnection {
        DriveConnection {
            enabled: self.config.enabled,
            connected: self.is_connected().await,
            connected_at: self.settings.get(keys::DRIVE_CONNECTED_AT).await,
        }
    }

    /// Forget all tokens.
    pub async fn disconnect(&self) -> AppResult<()> {
        *self.cached.write().await = None;
        self.settings
            .remove(&[keys::DRIVE_REFRESH_TOKEN, keys::DRIVE_CONNECTED_AT])
            .await?;
        info!("Cloud drive disconnected");
        Ok(())
    }

    fn ensure_configured(&self) -> AppResult<()> {
        if !self.config.enabled {
            return Err(AppError::configuration("Cloud drive uploads are disabled"));
        }
        if self.config.client_id.is_empty() || self.config.client_secret.is_empty() {
            return Err(AppError::configuration(
                "Cloud drive client_id and client_secret must be configured",
            ));
        }
        Ok(())
    }

    async fn request_token(&self, form: &[(&str, &str)]) -> AppResult<TokenResponse> {
        let resp = self
            .http
            .post(&self.config.token_url)
            .form(form)
            .send()
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::ExternalService, "Token endpoint unreachable", e)
            })?;

        let resp = crate::providers::drive::check_response(resp, "token request").await?;
        resp.json::<TokenResponse>().await.map_err(|e| {
            AppError::with_source(ErrorKind::ExternalService, "Malformed token response", e)
        })
    }

    async fn cache(&self, token: TokenResponse) {
        let ttl = token.expires_in.unwrap_or(3600).max(0);
        *self.cached.write().await = Some(CachedToken {
            access_token: token.access_token,
            expires_at: Utc::now() + Duration::seconds(ttl),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drive_config() -> DriveConfig {
        DriveConfig {
            enabled: true,
            client_id: "client-1".into(),
            client_secret: "secret".into(),
            ..Default::default()
        }
    }

    async fn manager(config: DriveConfig) -> (OAuthTokenManager, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let settings = Arc::new(
            SettingsStore::open(dir.path().join("settings.json"))
                .await
                .unwrap(),
        );
        (
            OAuthTokenManager::new(config, reqwest::Client::new(), settings),
            dir,
        )
    }

    #[tokio::test]
    async fn authorization_url_carries_client_and_state() {
        let (mgr, _dir) = manager(drive_config()).await;
        let url = mgr.authorization_url("abc").unwrap();
        let parsed = reqwest::Url::parse(&url).unwrap();
        let params: std::collections::HashMap<_, _> = parsed.query_pairs().into_owned().collect();
        assert_eq!(params["client_id"], "client-1");
        assert_eq!(params["response_type"], "code");
        assert_eq!(params["access_type"], "offline");
        assert_eq!(params["state"], "abc");
        assert_eq!(params["redirect_uri"], mgr.config().redirect_uri);
    }

    #[tokio::test]
    async fn disabled_drive_refuses_authorization() {
        let (mgr, _dir) = manager(DriveConfig::default()).await;
        let err = mgr.authorization_url("abc").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Configuration);
    }

    #[tokio::test]
    async fn access_token_requires_connection() {
        let (mgr, _dir) = manager(drive_config()).await;
        assert!(!mgr.is_connected().await);
        let err = mgr.access_token().await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Configuration);
    }

    #[tokio::test]
    async fn cached_token_is_served_until_near_expiry() {
        let (mgr, _dir) = manager(drive_config()).await;
        mgr.cache(TokenResponse {
            access_token: "at-1".into(),
            expires_in: Some(3600),
            refresh_token: None,
        })
        .await;
        assert_eq!(mgr.access_token().await.unwrap(), "at-1");

        let stale = CachedToken {
            access_token: "x".into(),
            expires_at: Utc::now() + Duration::seconds(30),
        };
        assert!(!stale.is_fresh(Utc::now()));
    }

    #[tokio::test]
    async fn disconnect_clears_tokens() {
        let (mgr, _dir) = manager(drive_config()).await;
        mgr.settings
            .set(keys::DRIVE_REFRESH_TOKEN, &"rt")
            .await
            .unwrap();
        assert!(mgr.connection().await.connected);
        mgr.disconnect().await.unwrap();
        assert!(!mgr.is_connected().await);
    }
}
