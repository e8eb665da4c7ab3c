//! Application state shared across all handlers and middleware.

use std::sync::Arc;
use std::time::Instant;

use visitdesk_auth::{
    Authenticator, Navigation, PasswordHasher, PasswordValidator, RbacEnforcer,
};
use visitdesk_core::config::AppConfig;
use visitdesk_core::error::AppError;
use visitdesk_database::Stores;
use visitdesk_service::{
    AdminUserService, AuditService, BackupService, EvacuationService, ExportService,
    ReportService, UserService, VisitorService,
};
use visitdesk_storage::SettingsStore;

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`. Every field is
/// cheap to clone.
#[derive(Debug, Clone)]
pub struct AppState {
    // ── Configuration ────────────────────────────────────────
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Process start, for uptime reporting
    pub started_at: Instant,

    // ── Infrastructure ───────────────────────────────────────
    /// Visitor, user, and audit stores
    pub stores: Stores,

    // ── Auth ─────────────────────────────────────────────────
    /// Credential verification and token issuance
    pub authenticator: Authenticator,
    /// Role-based view routing
    pub navigation: Navigation,

    // ── Services ─────────────────────────────────────────────
    /// Check-in, check-out, and visitor history
    pub visitor_service: VisitorService,
    /// Evacuation roster and bulk evacuation
    pub evacuation_service: EvacuationService,
    /// Staff account administration
    pub admin_user_service: AdminUserService,
    /// Own profile and password
    pub user_service: UserService,
    /// Audit trail
    pub audit_service: AuditService,
    /// Dashboard and summaries
    pub report_service: ReportService,
    /// CSV/JSON exports
    pub export_service: ExportService,
    /// Local and cloud drive backups
    pub backup_service: BackupService,
}

impl AppState {
    /// Wire every service over `stores`.
    pub async fn build(
        config: AppConfig,
        stores: Stores,
        settings: Arc<SettingsStore>,
    ) -> Result<Self, AppError> {
        let rbac = RbacEnforcer::new();
        let navigation = Navigation::new(rbac.clone());
        let hasher = PasswordHasher::new();
        let validator = PasswordValidator::new(&config.auth);

        let audit_service = AuditService::new(stores.audit.clone(), rbac.clone());
        let authenticator =
            Authenticator::new(stores.users.clone(), &config.auth, navigation.clone());

        let visitor_service = VisitorService::new(
            stores.visitors.clone(),
            audit_service.clone(),
            rbac.clone(),
            config.facility.clone(),
        );
        let evacuation_service = EvacuationService::new(
            stores.visitors.clone(),
            audit_service.clone(),
            rbac.clone(),
            config.facility.clone(),
        );
        let admin_user_service = AdminUserService::new(
            stores.users.clone(),
            hasher.clone(),
            validator.clone(),
            rbac.clone(),
            audit_service.clone(),
        );
        let user_service = UserService::new(
            stores.users.clone(),
            hasher,
            validator,
            audit_service.clone(),
        );
        let report_service =
            ReportService::new(stores.visitors.clone(), rbac.clone(), config.facility.clone());
        let export_service =
            ExportService::new(stores.visitors.clone(), audit_service.clone(), rbac.clone());
        let backup_service = BackupService::new(
            &config.storage,
            stores.visitors.clone(),
            stores.users.clone(),
            stores.audit.clone(),
            audit_service.clone(),
            rbac,
            settings,
        )
        .await?;

        Ok(Self {
            config: Arc::new(config),
            started_at: Instant::now(),
            stores,
            authenticator,
            navigation,
            visitor_service,
            evacuation_service,
            admin_user_service,
            user_service,
            audit_service,
            report_service,
            export_service,
            backup_service,
        })
    }
}
