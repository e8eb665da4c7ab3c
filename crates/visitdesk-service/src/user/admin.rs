//! Admin user management: CRUD, role changes, status changes, password resets.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use validator::ValidateEmail;
use uuid::Uuid;

use visitdesk_auth::password::{PasswordHasher, PasswordValidator};
use visitdesk_auth::rbac::RbacEnforcer;
use visitdesk_auth::rbac::policies::SystemPermission;
use visitdesk_core::error::AppError;
use visitdesk_core::types::pagination::{PageRequest, PageResponse};
use visitdesk_database::UserStore;
use visitdesk_entity::audit::action;
use visitdesk_entity::user::{CreateUser, UpdateUser, User, UserRole, UserStatus};

use crate::audit::AuditService;
use crate::context::RequestContext;

/// Handles administrative user management operations.
#[derive(Debug, Clone)]
pub struct AdminUserService {
    users: Arc<dyn UserStore>,
    hasher: PasswordHasher,
    validator: PasswordValidator,
    rbac: RbacEnforcer,
    audit: AuditService,
}

/// Request to create a new staff account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserRequest {
    /// Username (unique, case-insensitive).
    pub username: String,
    /// Email (unique, optional).
    pub email: Option<String>,
    /// Initial password.
    pub password: String,
    /// Display name.
    pub display_name: Option<String>,
    /// Job title.
    pub job_title: Option<String>,
    /// Role assignment.
    pub role: UserRole,
}

impl AdminUserService {
    /// Creates a new admin user service.
    pub fn new(
        users: Arc<dyn UserStore>,
        hasher: PasswordHasher,
        validator: PasswordValidator,
        rbac: RbacEnforcer,
        audit: AuditService,
    ) -> Self {
        Self {
            users,
            hasher,
            validator,
            rbac,
            audit,
        }
    }

    /// Lists users with pagination.
    pub async fn list_users(
        &self,
        ctx: &RequestContext,
        page: &PageRequest,
    ) -> Result<PageResponse<User>, AppError> {
        self.rbac
            .require_permission(&ctx.role, &SystemPermission::UserRead)?;
        self.users.list(page).await
    }

    /// Gets a single user by ID.
    pub async fn get_user(&self, ctx: &RequestContext, user_id: Uuid) -> Result<User, AppError> {
        self.rbac
            .require_permission(&ctx.role, &SystemPermission::UserRead)?;
        self.load(user_id).await
    }

    /// Creates a new user.
    pub async fn create_user(
        &self,
        ctx: &RequestContext,
        req: CreateUserRequest,
    ) -> Result<User, AppError> {
        self.rbac
            .require_permission(&ctx.role, &SystemPermission::UserCreate)?;
        let user = self.create(ctx, req).await?;
        info!(
            admin_id = %ctx.user_id,
            new_user_id = %user.id,
            username = %user.username,
            role = %user.role,
            "User created by admin"
        );
        Ok(user)
    }

    /// Create the first administrator. Used by the CLI; bypasses RBAC.
    pub async fn bootstrap_admin(&self, mut req: CreateUserRequest) -> Result<User, AppError> {
        req.role = UserRole::Admin;
        let user = self.create(&RequestContext::system(), req).await?;
        info!(user_id = %user.id, username = %user.username, "Administrator account created");
        Ok(user)
    }

    async fn create(&self, ctx: &RequestContext, req: CreateUserRequest) -> Result<User, AppError> {
        let username = req.username.trim().to_string();
        validate_username(&username)?;
        let email = normalize_email(req.email)?;

        if self.users.find_by_username(&username).await?.is_some() {
            return Err(AppError::conflict("Username is already taken"));
        }
        if let Some(email) = &email {
            if self.users.find_by_email(email).await?.is_some() {
                return Err(AppError::conflict("Email is already in use"));
            }
        }

        self.validator.validate(&req.password, &username)?;
        let password_hash = self.hasher.hash_password(&req.password)?;

        let user = self
            .users
            .create(CreateUser {
                username,
                email,
                password_hash,
                display_name: req.display_name,
                job_title: req.job_title,
                role: req.role,
                created_by: ctx.actor_id(),
            })
            .await?;

        self.audit
            .record(
                ctx,
                action::USER_CREATE,
                action::target::USER,
                Some(&user.id.to_string()),
                json!({ "username": user.username, "role": user.role }),
            )
            .await;
        Ok(user)
    }

    /// Updates a user's profile fields.
    pub async fn update_user(
        &self,
        ctx: &RequestContext,
        user_id: Uuid,
        mut req: UpdateUser,
    ) -> Result<User, AppError> {
        self.rbac
            .require_permission(&ctx.role, &SystemPermission::UserUpdate)?;
        self.load(user_id).await?;

        req.email = normalize_email(req.email)?;
        if let Some(email) = &req.email {
            if let Some(existing) = self.users.find_by_email(email).await? {
                if existing.id != user_id {
                    return Err(AppError::conflict("Email is already in use"));
                }
            }
        }

        let user = self.users.update_profile(user_id, &req).await?;
        self.audit
            .record(
                ctx,
                action::USER_UPDATE,
                action::target::USER,
                Some(&user_id.to_string()),
                json!({ "username": user.username }),
            )
            .await;
        info!(admin_id = %ctx.user_id, target_id = %user_id, "User updated by admin");
        Ok(user)
    }

    /// Changes a user's role.
    pub async fn change_role(
        &self,
        ctx: &RequestContext,
        user_id: Uuid,
        new_role: UserRole,
    ) -> Result<User, AppError> {
        self.rbac
            .require_permission(&ctx.role, &SystemPermission::UserChangeRole)?;
        if user_id == ctx.user_id {
            return Err(AppError::authorization("Cannot change your own role"));
        }

        let user = self.load(user_id).await?;
        if user.role == new_role {
            return Ok(user);
        }
        if user.is_admin() && !new_role.is_admin() {
            self.ensure_other_admin_exists(&user).await?;
        }

        let old_role = user.role;
        let user = self.users.update_role(user_id, new_role).await?;
        self.audit
            .record(
                ctx,
                action::USER_ROLE_CHANGE,
                action::target::USER,
                Some(&user_id.to_string()),
                json!({ "username": user.username, "from": old_role, "to": new_role }),
            )
            .await;
        info!(
            admin_id = %ctx.user_id,
            target_id = %user_id,
            old_role = %old_role,
            new_role = %new_role,
            "User role changed"
        );
        Ok(user)
    }

    /// Changes a user's status. Reactivation clears any lockout.
    pub async fn change_status(
        &self,
        ctx: &RequestContext,
        user_id: Uuid,
        new_status: UserStatus,
    ) -> Result<User, AppError> {
        self.rbac
            .require_permission(&ctx.role, &SystemPermission::UserUpdate)?;
        if user_id == ctx.user_id {
            return Err(AppError::authorization("Cannot change your own status"));
        }

        let user = self.load(user_id).await?;
        if user.is_admin() && new_status != UserStatus::Active {
            self.ensure_other_admin_exists(&user).await?;
        }

        let user = self.users.update_status(user_id, new_status).await?;
        self.audit
            .record(
                ctx,
                action::USER_STATUS_CHANGE,
                action::target::USER,
                Some(&user_id.to_string()),
                json!({ "username": user.username, "status": new_status }),
            )
            .await;
        info!(
            admin_id = %ctx.user_id,
            target_id = %user_id,
            new_status = ?new_status,
            "User status changed"
        );
        Ok(user)
    }

    /// Resets a user's password.
    pub async fn reset_password(
        &self,
        ctx: &RequestContext,
        user_id: Uuid,
        new_password: &str,
    ) -> Result<(), AppError> {
        self.rbac
            .require_permission(&ctx.role, &SystemPermission::UserResetPassword)?;

        let user = self.load(user_id).await?;
        self.validator.validate(new_password, &user.username)?;
        let hash = self.hasher.hash_password(new_password)?;
        self.users.update_password(user_id, &hash).await?;

        self.audit
            .record(
                ctx,
                action::USER_PASSWORD_RESET,
                action::target::USER,
                Some(&user_id.to_string()),
                json!({ "username": user.username }),
            )
            .await;
        info!(admin_id = %ctx.user_id, target_id = %user_id, "Password reset by admin");
        Ok(())
    }

    /// Deletes a user.
    pub async fn delete_user(&self, ctx: &RequestContext, user_id: Uuid) -> Result<(), AppError> {
        self.rbac
            .require_permission(&ctx.role, &SystemPermission::UserDelete)?;
        if user_id == ctx.user_id {
            return Err(AppError::authorization("Cannot delete your own account"));
        }

        let user = self.load(user_id).await?;
        if user.is_admin() {
            self.ensure_other_admin_exists(&user).await?;
        }
        self.users.delete(user_id).await?;

        self.audit
            .record(
                ctx,
                action::USER_DELETE,
                action::target::USER,
                Some(&user_id.to_string()),
                json!({ "username": user.username }),
            )
            .await;
        info!(admin_id = %ctx.user_id, target_id = %user_id, "User deleted");
        Ok(())
    }

    async fn load(&self, user_id: Uuid) -> Result<User, AppError> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))
    }

    /// The facility must keep at least one active administrator.
    async fn ensure_other_admin_exists(&self, admin: &User) -> Result<(), AppError> {
        let active_admins = self.users.count_active_by_role(UserRole::Admin).await?;
        let this_one_counts = u64::from(admin.status == UserStatus::Active);
        if active_admins.saturating_sub(this_one_counts) == 0 {
            return Err(AppError::conflict(
                "At least one active administrator must remain",
            ));
        }
        Ok(())
    }
}

fn validate_username(username: &str) -> Result<(), AppError> {
    let len = username.chars().count();
    if !(3..=64).contains(&len) {
        return Err(AppError::validation(
            "Username must be between 3 and 64 characters",
        ));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
    {
        return Err(AppError::validation(
            "Username may contain only letters, digits, '.', '_' and '-'",
        ));
    }
    Ok(())
}

/// Trim, drop empty, and validate an email address.
pub(crate) fn normalize_email(email: Option<String>) -> Result<Option<String>, AppError> {
    let Some(email) = email.map(|e| e.trim().to_string()).filter(|e| !e.is_empty()) else {
        return Ok(None);
    };
    if !email.validate_email() {
        return Err(AppError::validation("Invalid email format"));
    }
    Ok(Some(email))
}

#[cfg(test)]
mod tests {
    use super::*;
    use visitdesk_core::config::auth::AuthConfig;
    use visitdesk_core::error::ErrorKind;
    use visitdesk_database::memory::{MemoryAuditStore, MemoryUserStore};

    const PASSWORD: &str = "Visit0r!Desk#2026xq";

    fn service() -> AdminUserService {
        let rbac = RbacEnforcer::new();
        AdminUserService::new(
            Arc::new(MemoryUserStore::new()),
            PasswordHasher::new(),
            PasswordValidator::new(&AuthConfig::default()),
            rbac.clone(),
            AuditService::new(Arc::new(MemoryAuditStore::new()), rbac),
        )
    }

    fn request(username: &str, role: UserRole) -> CreateUserRequest {
        CreateUserRequest {
            username: username.into(),
            email: Some(format!("{username}@care.example")),
            password: PASSWORD.into(),
            display_name: None,
            job_title: None,
            role,
        }
    }

    async fn admin_ctx(svc: &AdminUserService) -> RequestContext {
        let admin = svc.bootstrap_admin(request("root", UserRole::Staff)).await.unwrap();
        assert_eq!(admin.role, UserRole::Admin);
        RequestContext::new(admin.id, admin.username, admin.role, None)
    }

    #[tokio::test]
    async fn create_and_list() {
        let svc = service();
        let ctx = admin_ctx(&svc).await;
        let user = svc
            .create_user(&ctx, request("desk.one", UserRole::Staff))
            .await
            .unwrap();
        assert_eq!(user.created_by, Some(ctx.user_id));
        assert_ne!(user.password_hash, PASSWORD);

        let page = svc.list_users(&ctx, &PageRequest::default()).await.unwrap();
        assert_eq!(page.total_items, 2);

        let dup = svc
            .create_user(&ctx, request("DESK.ONE", UserRole::Staff))
            .await
            .unwrap_err();
        assert_eq!(dup.kind, ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn rejects_bad_usernames_and_weak_passwords() {
        let svc = service();
        let ctx = admin_ctx(&svc).await;
        let err = svc
            .create_user(&ctx, request("a b", UserRole::Staff))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);

        let mut weak = request("desk2", UserRole::Staff);
        weak.password = "password".into();
        assert!(svc.create_user(&ctx, weak).await.is_err());
    }

    #[tokio::test]
    async fn no_self_demotion_or_self_deletion() {
        let svc = service();
        let ctx = admin_ctx(&svc).await;
        let err = svc
            .change_role(&ctx, ctx.user_id, UserRole::Staff)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authorization);
        let err = svc.delete_user(&ctx, ctx.user_id).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authorization);
    }

    #[tokio::test]
    async fn last_active_admin_is_protected() {
        let svc = service();
        let ctx = admin_ctx(&svc).await;
        let second = svc
            .create_user(&ctx, request("second", UserRole::Admin))
            .await
            .unwrap();
        let second_ctx = RequestContext::new(second.id, second.username.clone(), UserRole::Admin, None);

        // Two admins: demoting the first is allowed.
        svc.change_role(&second_ctx, ctx.user_id, UserRole::Manager)
            .await
            .unwrap();
        // `second` is now the only active admin; a stale admin token still
        // cannot deactivate them.
        let err = svc
            .change_status(&ctx, second.id, UserStatus::Inactive)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);
        let err = svc.delete_user(&ctx, second.id).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn status_role_and_password_changes() {
        let svc = service();
        let ctx = admin_ctx(&svc).await;
        let user = svc
            .create_user(&ctx, request("nurse", UserRole::Staff))
            .await
            .unwrap();

        let user = svc
            .change_role(&ctx, user.id, UserRole::Manager)
            .await
            .unwrap();
        assert_eq!(user.role, UserRole::Manager);

        let user = svc
            .change_status(&ctx, user.id, UserStatus::Inactive)
            .await
            .unwrap();
        assert_eq!(user.status, UserStatus::Inactive);

        svc.reset_password(&ctx, user.id, "An0ther!Strong#Pass")
            .await
            .unwrap();
        svc.delete_user(&ctx, user.id).await.unwrap();
        assert_eq!(
            svc.get_user(&ctx, user.id).await.unwrap_err().kind,
            ErrorKind::NotFound
        );
    }

    #[test]
    fn email_normalization() {
        assert_eq!(normalize_email(Some("  ".into())).unwrap(), None);
        assert_eq!(
            normalize_email(Some(" a@b.co ".into())).unwrap().as_deref(),
            Some("a@b.co")
        );
        for bad in ["nope", "a@b@c.d", "a@.", "x y@z.q"] {
            assert!(normalize_email(Some(bad.into())).is_err(), "{bad}");
        }
    }
}
