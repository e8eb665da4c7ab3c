//! Snapshot backups to local storage and the cloud drive.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::Mutex;
use tracing::{error, info, warn};
use uuid::Uuid;

use visitdesk_auth::rbac::RbacEnforcer;
use visitdesk_auth::rbac::policies::SystemPermission;
use visitdesk_core::config::storage::StorageConfig;
use visitdesk_core::error::AppError;
use visitdesk_core::traits::storage::StorageProvider;
use visitdesk_database::{AuditStore, UserStore, VisitorStore};
use visitdesk_entity::audit::{AuditLogEntry, AuditSearch, action};
use visitdesk_entity::user::{User, UserRole};
use visitdesk_entity::visitor::Visitor;
use visitdesk_storage::manager::{DRIVE, LOCAL};
use visitdesk_storage::oauth::DriveConnection;
use visitdesk_storage::providers::{DriveStorageProvider, LocalStorageProvider};
use visitdesk_storage::settings::keys;
use visitdesk_storage::{OAuthTokenManager, SettingsStore, StorageManager, checksum_sha256};

use crate::audit::AuditService;
use crate::context::RequestContext;
use crate::export::encode::visitors_csv;

/// How long a drive consent request stays valid.
const OAUTH_STATE_TTL_MINUTES: i64 = 10;

/// What started a backup run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackupTrigger {
    /// Requested by a user.
    Manual,
    /// Fired by the scheduler.
    Scheduled,
}

impl fmt::Display for BackupTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Manual => "manual",
            Self::Scheduled => "scheduled",
        })
    }
}

/// One file produced by a backup run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupArtifact {
    /// File name at every destination.
    pub name: String,
    /// Size in bytes.
    pub bytes: usize,
    /// Lowercase hex SHA-256 of the content.
    pub sha256: String,
}

/// Result of writing all artifacts to one destination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DestinationResult {
    /// Registered destination name (`local`, `drive`).
    pub name: String,
    /// Provider type.
    pub provider: String,
    /// Whether every artifact was written.
    pub ok: bool,
    /// First error encountered.
    pub error: Option<String>,
}

/// Outcome of a backup run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupReport {
    /// Run identifier.
    pub id: Uuid,
    /// What started the run.
    pub trigger: BackupTrigger,
    /// Username of the requester (`system` for scheduled runs).
    pub requested_by: String,
    /// Start time.
    pub started_at: DateTime<Utc>,
    /// End time.
    pub completed_at: DateTime<Utc>,
    /// Files written.
    pub artifacts: Vec<BackupArtifact>,
    /// Per-destination results.
    pub destinations: Vec<DestinationResult>,
    /// True when every destination received every artifact.
    pub success: bool,
}

/// Backup configuration and health as shown to administrators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupStatus {
    /// Most recent run, if any.
    pub last_backup: Option<BackupReport>,
    /// Health of each registered destination.
    pub destinations: BTreeMap<String, bool>,
    /// Cloud drive connection, when uploads are enabled.
    pub drive: Option<DriveConnection>,
}

/// Full JSON snapshot written alongside the visitors CSV.
#[derive(Debug, Serialize)]
struct Snapshot<'a> {
    generated_at: DateTime<Utc>,
    counts: SnapshotCounts,
    visitors: &'a [Visitor],
    users: &'a [User],
    audit_log: &'a [AuditLogEntry],
}

#[derive(Debug, Serialize)]
struct SnapshotCounts {
    visitors: usize,
    users: usize,
    audit_log: usize,
}

#[derive(Debug, Serialize, Deserialize)]
struct PendingConsent {
    state: String,
    requested_by: Uuid,
    username: String,
    role: UserRole,
    requested_at: DateTime<Utc>,
}

/// Produces backups and manages their destinations.
#[derive(Debug, Clone)]
pub struct BackupService {
    visitors: Arc<dyn VisitorStore>,
    users: Arc<dyn UserStore>,
    audit_log: Arc<dyn AuditStore>,
    audit: AuditService,
    rbac: RbacEnforcer,
    settings: Arc<SettingsStore>,
    storage: StorageManager,
    drive: Option<Arc<OAuthTokenManager>>,
    http: reqwest::Client,
    running: Arc<Mutex<()>>,
}

impl BackupService {
    /// Creates the service and registers the local destination, plus the
    /// cloud drive when it is enabled and already connected.
    pub async fn new(
        config: &StorageConfig,
        visitors: Arc<dyn VisitorStore>,
        users: Arc<dyn UserStore>,
        audit_log: Arc<dyn AuditStore>,
        audit: AuditService,
        rbac: RbacEnforcer,
        settings: Arc<SettingsStore>,
    ) -> Result<Self, AppError> {
        let storage = StorageManager::new();
        let local = LocalStorageProvider::new(config.backup_path()).await?;
        storage.register(LOCAL, Arc::new(local)).await;

        let http = reqwest::Client::builder()
            .user_agent(concat!("visitdesk/", env!("CARGO_PKG_VERSION")))
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .map_err(|e| AppError::internal(format!("Failed to build HTTP client: {e}")))?;

        let drive = if config.drive.enabled {
            let tokens = Arc::new(OAuthTokenManager::new(
                config.drive.clone(),
                http.clone(),
                settings.clone(),
            ));
            if tokens.is_connected().await {
                let provider = DriveStorageProvider::new(http.clone(), tokens.clone());
                storage.register(DRIVE, Arc::new(provider)).await;
            }
            Some(tokens)
        } else {
            None
        };

        info!(
            backup_dir = %config.backup_path().display(),
            drive_enabled = config.drive.enabled,
            "Backup service initialized"
        );

        Ok(Self {
            visitors,
            users,
            audit_log,
            audit,
            rbac,
            settings,
            storage,
            drive,
            http,
            running: Arc::new(Mutex::new(())),
        })
    }

    /// Registered destinations.
    pub fn storage(&self) -> &StorageManager {
        &self.storage
    }

    /// Run a backup on behalf of `ctx`.
    pub async fn run(&self, ctx: &RequestContext) -> Result<BackupReport, AppError> {
        self.rbac
            .require_permission(&ctx.role, &SystemPermission::BackupRun)?;
        self.execute(ctx, BackupTrigger::Manual).await
    }

    /// Run a backup from the scheduler.
    pub async fn run_scheduled(&self) -> Result<BackupReport, AppError> {
        self.execute(&RequestContext::system(), BackupTrigger::Scheduled)
            .await
    }

    async fn execute(
        &self,
        ctx: &RequestContext,
        trigger: BackupTrigger,
    ) -> Result<BackupReport, AppError> {
        let _guard = self
            .running
            .try_lock()
            .map_err(|_| AppError::conflict("A backup is already running"))?;

        let started_at = Utc::now();
        let id = Uuid::new_v4();
        info!(backup_id = %id, %trigger, user = %ctx.username, "Backup started");

        let files = match self.build_artifacts(started_at).await {
            Ok(files) => files,
            Err(e) => {
                error!(backup_id = %id, error = %e, "Backup snapshot failed");
                self.audit
                    .record(
                        ctx,
                        action::BACKUP_FAILED,
                        action::target::BACKUP,
                        Some(&id.to_string()),
                        json!({ "trigger": trigger, "error": e.message.clone() }),
                    )
                    .await;
                return Err(e);
            }
        };

        let mut destinations = Vec::new();
        for (name, provider) in self.storage.all().await {
            destinations.push(write_all(&name, provider.as_ref(), &files).await);
        }

        let artifacts: Vec<BackupArtifact> = files
            .iter()
            .map(|(name, data)| BackupArtifact {
                name: name.clone(),
                bytes: data.len(),
                sha256: checksum_sha256(data),
            })
            .collect();
        let success = !destinations.is_empty() && destinations.iter().all(|d| d.ok);
        let report = BackupReport {
            id,
            trigger,
            requested_by: ctx.username.clone(),
            started_at,
            completed_at: Utc::now(),
            artifacts,
            destinations,
            success,
        };

        if let Err(e) = self.settings.set(keys::LAST_BACKUP, &report).await {
            warn!(backup_id = %id, error = %e, "Failed to record last backup");
        }

        let failed: Vec<&str> = report
            .destinations
            .iter()
            .filter(|d| !d.ok)
            .map(|d| d.name.as_str())
            .collect();
        self.audit
            .record(
                ctx,
                if success {
                    action::BACKUP_COMPLETED
                } else {
                    action::BACKUP_FAILED
                },
                action::target::BACKUP,
                Some(&id.to_string()),
                json!({
                    "trigger": trigger,
                    "artifacts": report.artifacts,
                    "failed_destinations": failed,
                }),
            )
            .await;

        if success {
            info!(backup_id = %id, files = report.artifacts.len(), "Backup completed");
        } else {
            warn!(backup_id = %id, ?failed, "Backup finished with failures");
        }
        Ok(report)
    }

    async fn build_artifacts(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<(String, Bytes)>, AppError> {
        let visitors = self.visitors.find_all().await?;
        let users = self.users.find_all().await?;
        let audit_log = self.audit_log.find_matching(&AuditSearch::default()).await?;

        let stamp = now.format("%Y%m%dT%H%M%SZ");
        let csv = visitors_csv(&visitors, now)?;
        let snapshot = serde_json::to_vec_pretty(&Snapshot {
            generated_at: now,
            counts: SnapshotCounts {
                visitors: visitors.len(),
                users: users.len(),
                audit_log: audit_log.len(),
            },
            visitors: &visitors,
            users: &users,
            audit_log: &audit_log,
        })?;

        Ok(vec![
            (format!("visitors_{stamp}.csv"), Bytes::from(csv)),
            (format!("snapshot_{stamp}.json"), Bytes::from(snapshot)),
        ])
    }

    /// Last run and destination health.
    pub async fn status(&self, ctx: &RequestContext) -> Result<BackupStatus, AppError> {
        self.rbac
            .require_permission(&ctx.role, &SystemPermission::BackupRun)?;

        let drive = match &self.drive {
            Some(tokens) => Some(tokens.connection().await),
            None => None,
        };
        Ok(BackupStatus {
            last_backup: self.settings.get(keys::LAST_BACKUP).await,
            destinations: self.storage.health_check_all().await,
            drive,
        })
    }

    /// Consent URL for connecting the cloud drive.
    pub async fn drive_authorize_url(&self, ctx: &RequestContext) -> Result<String, AppError> {
        self.rbac
            .require_permission(&ctx.role, &SystemPermission::BackupConfigure)?;
        let tokens = self.drive_tokens()?;

        let state = Uuid::new_v4().simple().to_string();
        let url = tokens.authorization_url(&state)?;
        self.settings
            .set(
                keys::DRIVE_OAUTH_STATE,
                &PendingConsent {
                    state,
                    requested_by: ctx.user_id,
                    username: ctx.username.clone(),
                    role: ctx.role,
                    requested_at: Utc::now(),
                },
            )
            .await?;
        Ok(url)
    }

    /// Complete the OAuth callback. The caller is identified by the
    /// `state` issued from [`BackupService::drive_authorize_url`].
    pub async fn connect_drive(&self, code: &str, state: &str) -> Result<DriveConnection, AppError> {
        let tokens = self.drive_tokens()?;

        let pending: PendingConsent = self
            .settings
            .get(keys::DRIVE_OAUTH_STATE)
            .await
            .ok_or_else(|| AppError::authorization("No cloud drive authorization is pending"))?;
        if pending.state != state {
            return Err(AppError::authorization("OAuth state mismatch"));
        }
        if Utc::now() - pending.requested_at > Duration::minutes(OAUTH_STATE_TTL_MINUTES) {
            self.settings.remove(&[keys::DRIVE_OAUTH_STATE]).await?;
            return Err(AppError::authorization(
                "Cloud drive authorization expired, start again",
            ));
        }

        tokens.exchange_code(code).await?;
        self.settings.remove(&[keys::DRIVE_OAUTH_STATE]).await?;
        let provider = DriveStorageProvider::new(self.http.clone(), tokens.clone());
        self.storage.register(DRIVE, Arc::new(provider)).await;

        let ctx = RequestContext::new(pending.requested_by, pending.username, pending.role, None);
        self.audit
            .record(
                &ctx,
                action::DRIVE_CONNECTED,
                action::target::BACKUP,
                Some(DRIVE),
                json!({ "folder_id": tokens.config().folder_id }),
            )
            .await;
        info!(user = %ctx.username, "Cloud drive connected");
        Ok(tokens.connection().await)
    }

    /// Forget drive tokens and stop uploading.
    pub async fn disconnect_drive(&self, ctx: &RequestContext) -> Result<(), AppError> {
        self.rbac
            .require_permission(&ctx.role, &SystemPermission::BackupConfigure)?;
        let tokens = self.drive_tokens()?;

        tokens.disconnect().await?;
        self.storage.unregister(DRIVE).await;
        self.audit
            .record(
                ctx,
                action::DRIVE_DISCONNECTED,
                action::target::BACKUP,
                Some(DRIVE),
                serde_json::Value::Null,
            )
            .await;
        Ok(())
    }

    fn drive_tokens(&self) -> Result<&Arc<OAuthTokenManager>, AppError> {
        self.drive
            .as_ref()
            .ok_or_else(|| AppError::configuration("Cloud drive backup is not enabled"))
    }
}

async fn write_all(
    name: &str,
    provider: &dyn StorageProvider,
    files: &[(String, Bytes)],
) -> DestinationResult {
    for (file, data) in files {
        let mime = if file.ends_with(".csv") {
            "text/csv"
        } else {
            "application/json"
        };
        if let Err(e) = provider.write(file, data.clone(), mime).await {
            error!(destination = name, file = %file, error = %e, "Backup write failed");
            return DestinationResult {
                name: name.to_string(),
                provider: provider.provider_type().to_string(),
                ok: false,
                error: Some(e.message),
            };
        }
    }
    DestinationResult {
        name: name.to_string(),
        provider: provider.provider_type().to_string(),
        ok: true,
        error: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use visitdesk_core::error::ErrorKind;
    use visitdesk_core::result::AppResult;
    use visitdesk_core::traits::storage::StorageObjectMeta;
    use visitdesk_database::memory::{MemoryAuditStore, MemoryUserStore, MemoryVisitorStore};
    use visitdesk_entity::user::CreateUser;
    use visitdesk_entity::visitor::NewVisitor;

    struct Fixture {
        service: BackupService,
        dir: tempfile::TempDir,
    }

    async fn fixture(drive_enabled: bool) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let mut config = StorageConfig {
            data_root: dir.path().to_string_lossy().into_owned(),
            ..Default::default()
        };
        config.drive.enabled = drive_enabled;
        config.drive.client_id = "client".into();
        config.drive.client_secret = "secret".into();

        let visitors = Arc::new(MemoryVisitorStore::new());
        visitors
            .insert(&Visitor::check_in(
                NewVisitor {
                    first_name: "Ada".into(),
                    last_name: "Lim".into(),
                    purpose: "Visit".into(),
                    ..Default::default()
                },
                None,
                Utc::now(),
            ))
            .await
            .unwrap();
        let users = Arc::new(MemoryUserStore::new());
        users
            .create(CreateUser {
                username: "admin".into(),
                email: None,
                password_hash: "$argon2id$secret-hash".into(),
                display_name: None,
                job_title: None,
                role: UserRole::Admin,
                created_by: None,
            })
            .await
            .unwrap();
        let audit_log: Arc<dyn AuditStore> = Arc::new(MemoryAuditStore::new());
        let settings = Arc::new(
            SettingsStore::open(config.settings_path())
                .await
                .unwrap(),
        );

        let service = BackupService::new(
            &config,
            visitors,
            users,
            audit_log.clone(),
            AuditService::new(audit_log, RbacEnforcer::new()),
            RbacEnforcer::new(),
            settings,
        )
        .await
        .unwrap();
        Fixture { service, dir }
    }

    fn ctx(role: UserRole) -> RequestContext {
        RequestContext::new(Uuid::new_v4(), "lead".into(), role, None)
    }

    #[tokio::test]
    async fn manual_backup_writes_checksummed_artifacts() {
        let f = fixture(false).await;
        let report = f.service.run(&ctx(UserRole::Manager)).await.unwrap();

        assert!(report.success);
        assert_eq!(report.trigger, BackupTrigger::Manual);
        assert_eq!(report.artifacts.len(), 2);
        assert_eq!(report.destinations.len(), 1);
        assert_eq!(report.destinations[0].name, LOCAL);

        let backup_dir = f.dir.path().join("backups");
        for artifact in &report.artifacts {
            let data = std::fs::read(backup_dir.join(&artifact.name)).unwrap();
            assert_eq!(data.len(), artifact.bytes);
            assert_eq!(checksum_sha256(&data), artifact.sha256);
        }

        let snapshot_name = &report
            .artifacts
            .iter()
            .find(|a| a.name.starts_with("snapshot_"))
            .unwrap()
            .name;
        let snapshot = std::fs::read_to_string(backup_dir.join(snapshot_name)).unwrap();
        assert!(snapshot.contains("\"Ada\""));
        assert!(!snapshot.contains("secret-hash"));
    }

    #[tokio::test]
    async fn status_reports_last_backup() {
        let f = fixture(false).await;
        let admin = ctx(UserRole::Admin);
        assert!(f.service.status(&admin).await.unwrap().last_backup.is_none());

        let report = f.service.run_scheduled().await.unwrap();
        assert_eq!(report.requested_by, "system");

        let status = f.service.status(&admin).await.unwrap();
        assert_eq!(status.last_backup.unwrap().id, report.id);
        assert_eq!(status.destinations.get(LOCAL), Some(&true));
        assert!(status.drive.is_none());
    }

    #[tokio::test]
    async fn staff_cannot_run_backups() {
        let f = fixture(false).await;
        let err = f.service.run(&ctx(UserRole::Staff)).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authorization);
    }

    #[derive(Debug)]
    struct BrokenProvider;

    #[async_trait]
    impl StorageProvider for BrokenProvider {
        fn provider_type(&self) -> &str {
            "broken"
        }
        async fn health_check(&self) -> AppResult<bool> {
            Ok(false)
        }
        async fn read_bytes(&self, _path: &str) -> AppResult<Bytes> {
            Err(AppError::storage("offline"))
        }
        async fn write(&self, _path: &str, _data: Bytes, _mime: &str) -> AppResult<()> {
            Err(AppError::storage("offline"))
        }
        async fn delete(&self, _path: &str) -> AppResult<()> {
            Err(AppError::storage("offline"))
        }
        async fn exists(&self, _path: &str) -> AppResult<bool> {
            Ok(false)
        }
        async fn list(&self, _path: &str) -> AppResult<Vec<StorageObjectMeta>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn failing_destination_does_not_block_others() {
        let f = fixture(false).await;
        f.service
            .storage()
            .register("offsite", Arc::new(BrokenProvider))
            .await;

        let report = f.service.run(&ctx(UserRole::Admin)).await.unwrap();
        assert!(!report.success);
        let local = report.destinations.iter().find(|d| d.name == LOCAL).unwrap();
        assert!(local.ok);
        let offsite = report
            .destinations
            .iter()
            .find(|d| d.name == "offsite")
            .unwrap();
        assert_eq!(offsite.error.as_deref(), Some("offline"));
    }

    #[tokio::test]
    async fn drive_operations_require_drive_enabled() {
        let f = fixture(false).await;
        let err = f
            .service
            .drive_authorize_url(&ctx(UserRole::Admin))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Configuration);
    }

    #[tokio::test]
    async fn drive_callback_checks_state() {
        let f = fixture(true).await;
        let err = f.service.connect_drive("code", "nope").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authorization);

        let url = f
            .service
            .drive_authorize_url(&ctx(UserRole::Admin))
            .await
            .unwrap();
        assert!(url.contains("state="));
        let err = f.service.connect_drive("code", "wrong").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authorization);

        let manager = ctx(UserRole::Manager);
        let err = f.service.drive_authorize_url(&manager).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authorization);

        let status = f.service.status(&manager).await.unwrap();
        let drive = status.drive.unwrap();
        assert!(drive.enabled);
        assert!(!drive.connected);
    }
}
