//! User self-service: profile and password changes.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use visitdesk_auth::password::{PasswordHasher, PasswordValidator};
use visitdesk_core::error::AppError;
use visitdesk_database::UserStore;
use visitdesk_entity::audit::action;
use visitdesk_entity::user::{UpdateUser, User};

use crate::audit::AuditService;
use crate::context::RequestContext;
use crate::user::admin::normalize_email;

/// Handles user self-service operations.
#[derive(Debug, Clone)]
pub struct UserService {
    users: Arc<dyn UserStore>,
    hasher: PasswordHasher,
    validator: PasswordValidator,
    audit: AuditService,
}

/// Data for updating one's own profile.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProfileRequest {
    /// New display name.
    pub display_name: Option<String>,
    /// New email.
    pub email: Option<String>,
}

impl UserService {
    /// Creates a new user service.
    pub fn new(
        users: Arc<dyn UserStore>,
        hasher: PasswordHasher,
        validator: PasswordValidator,
        audit: AuditService,
    ) -> Self {
        Self {
            users,
            hasher,
            validator,
            audit,
        }
    }

    /// The caller's own account.
    pub async fn get_profile(&self, ctx: &RequestContext) -> Result<User, AppError> {
        self.users
            .find_by_id(ctx.user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))
    }

    /// Update display name and email.
    pub async fn update_profile(
        &self,
        ctx: &RequestContext,
        req: UpdateProfileRequest,
    ) -> Result<User, AppError> {
        self.get_profile(ctx).await?;

        if req
            .display_name
            .as_deref()
            .is_some_and(|n| n.trim().is_empty())
        {
            return Err(AppError::validation("Display name cannot be empty"));
        }
        let email = normalize_email(req.email)?;
        if let Some(email) = &email {
            if let Some(existing) = self.users.find_by_email(email).await? {
                if existing.id != ctx.user_id {
                    return Err(AppError::conflict("Email is already in use"));
                }
            }
        }

        let user = self
            .users
            .update_profile(
                ctx.user_id,
                &UpdateUser {
                    email,
                    display_name: req.display_name.map(|n| n.trim().to_string()),
                    job_title: None,
                },
            )
            .await?;
        info!(user_id = %ctx.user_id, "Profile updated");
        Ok(user)
    }

    /// Change the caller's password after verifying the current one.
    pub async fn change_password(
        &self,
        ctx: &RequestContext,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AppError> {
        let user = self.get_profile(ctx).await?;

        if !self
            .hasher
            .verify_password(current_password, &user.password_hash)?
        {
            return Err(AppError::authentication("Current password is incorrect"));
        }
        self.validator.validate(new_password, &user.username)?;
        self.validator
            .validate_not_same(current_password, new_password)?;

        let new_hash = self.hasher.hash_password(new_password)?;
        self.users.update_password(ctx.user_id, &new_hash).await?;

        self.audit
            .record(
                ctx,
                action::USER_PASSWORD_CHANGE,
                action::target::USER,
                Some(&ctx.user_id.to_string()),
                json!({ "username": user.username }),
            )
            .await;
        info!(user_id = %ctx.user_id, "Password changed");
        Ok(())
    }
}
