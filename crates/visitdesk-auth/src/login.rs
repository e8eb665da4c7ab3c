//! Credential verification, lockout, and token refresh.

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::Serialize;
use tracing::{info, warn};

use visitdesk_core::config::auth::AuthConfig;
use visitdesk_core::error::AppError;
use visitdesk_database::UserStore;
use visitdesk_entity::user::{User, UserStatus};

use crate::jwt::{JwtDecoder, JwtEncoder, TokenPair};
use crate::navigation::{Navigation, View};
use crate::password::PasswordHasher;

/// Successful login: tokens plus what the client needs to route the user.
#[derive(Debug, Clone, Serialize)]
pub struct LoginOutcome {
    /// Issued tokens.
    pub tokens: TokenPair,
    /// The signed-in user.
    pub user: User,
    /// Where the client should land.
    pub landing_view: View,
}

/// Verifies credentials against the user store and issues tokens.
#[derive(Debug, Clone)]
pub struct Authenticator {
    users: Arc<dyn UserStore>,
    hasher: PasswordHasher,
    encoder: JwtEncoder,
    decoder: JwtDecoder,
    navigation: Navigation,
    max_failed_attempts: i32,
    lockout: Duration,
}

impl Authenticator {
    /// Build an authenticator from configuration.
    pub fn new(users: Arc<dyn UserStore>, config: &AuthConfig, navigation: Navigation) -> Self {
        Self {
            users,
            hasher: PasswordHasher::new(),
            encoder: JwtEncoder::new(config),
            decoder: JwtDecoder::new(config),
            navigation,
            max_failed_attempts: config.max_failed_attempts.max(1),
            lockout: Duration::minutes(config.lockout_duration_minutes as i64),
        }
    }

    /// Access to the token decoder for request authentication.
    pub fn decoder(&self) -> &JwtDecoder {
        &self.decoder
    }

    /// Verify `username`/`password` and issue tokens.
    ///
    /// Unknown users and wrong passwords produce the same error. Each wrong
    /// password increments the failure counter; reaching the configured
    /// maximum locks the account for the lockout window.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginOutcome, AppError> {
        // Step 1: Find user
        let user = self
            .users
            .find_by_username(username.trim())
            .await?
            .ok_or_else(|| AppError::authentication("Invalid username or password"))?;

        // Step 2: Check account status
        check_can_login(&user)?;

        // Step 3: Verify password
        if !self.hasher.verify_password(password, &user.password_hash)? {
            self.handle_failed_login(&user).await?;
            return Err(AppError::authentication("Invalid username or password"));
        }

        // Step 4: Reset counters and issue tokens
        self.users.record_login(user.id).await?;
        let tokens = self
            .encoder
            .generate_token_pair(user.id, user.role, &user.username)?;
        let landing_view = self.navigation.default_view(&user.role);

        info!(user_id = %user.id, username = %user.username, role = %user.role, "Login successful");
        Ok(LoginOutcome {
            tokens,
            user,
            landing_view,
        })
    }

    /// Exchange a refresh token for a new access token.
    ///
    /// The role is re-read from the store so role changes take effect on
    /// the next refresh.
    pub async fn refresh(
        &self,
        refresh_token: &str,
    ) -> Result<(String, chrono::DateTime<Utc>), AppError> {
        let claims = self.decoder.decode_refresh_token(refresh_token)?;
        let user = self
            .users
            .find_by_id(claims.sub)
            .await?
            .ok_or_else(|| AppError::authentication("Account no longer exists"))?;
        check_can_login(&user)?;
        self.encoder
            .generate_access_token(user.id, user.role, &user.username)
    }

    async fn handle_failed_login(&self, user: &User) -> Result<(), AppError> {
        let attempts = self.users.record_failed_login(user.id).await?;
        warn!(user_id = %user.id, attempts, "Failed login attempt");
        if attempts >= self.max_failed_attempts {
            let until = Utc::now() + self.lockout;
            self.users.lock_until(user.id, until).await?;
            warn!(user_id = %user.id, until = %until, "Account locked after repeated failures");
        }
        Ok(())
    }
}

fn check_can_login(user: &User) -> Result<(), AppError> {
    match user.status {
        UserStatus::Inactive => {
            return Err(AppError::authentication("Account is deactivated"));
        }
        UserStatus::Locked => {
            return Err(AppError::authentication("Account is locked"));
        }
        UserStatus::Active => {}
    }
    if user.is_locked() {
        return Err(AppError::authentication(
            "Account is temporarily locked; try again later",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use visitdesk_core::error::ErrorKind;
    use visitdesk_database::memory::MemoryUserStore;
    use visitdesk_entity::user::{CreateUser, UserRole};

    const PASSWORD: &str = "Visit0r!Desk#2026xq";

    async fn setup(max_failed: i32) -> (Authenticator, Arc<dyn UserStore>) {
        let users: Arc<dyn UserStore> = Arc::new(MemoryUserStore::new());
        users
            .create(CreateUser {
                username: "desk".into(),
                email: None,
                password_hash: PasswordHasher::new().hash_password(PASSWORD).unwrap(),
                display_name: None,
                job_title: None,
                role: UserRole::Staff,
                created_by: None,
            })
            .await
            .unwrap();
        let config = AuthConfig {
            max_failed_attempts: max_failed,
            ..Default::default()
        };
        (
            Authenticator::new(users.clone(), &config, Navigation::default()),
            users,
        )
    }

    #[tokio::test]
    async fn login_issues_tokens_and_landing_view() {
        let (auth, _) = setup(5).await;
        let outcome = auth.login("DESK", PASSWORD).await.unwrap();
        assert_eq!(outcome.landing_view, View::CheckIn);
        let claims = auth
            .decoder()
            .decode_access_token(&outcome.tokens.access_token)
            .unwrap();
        assert_eq!(claims.sub, outcome.user.id);
    }

    #[tokio::test]
    async fn repeated_failures_lock_the_account() {
        let (auth, users) = setup(2).await;
        for _ in 0..2 {
            let err = auth.login("desk", "wrong").await.unwrap_err();
            assert_eq!(err.kind, ErrorKind::Authentication);
        }
        let err = auth.login("desk", PASSWORD).await.unwrap_err();
        assert!(err.message.contains("locked"));
        let user = users.find_by_username("desk").await.unwrap().unwrap();
        assert!(user.locked_until.is_some());
    }

    #[tokio::test]
    async fn unknown_user_looks_like_bad_password() {
        let (auth, _) = setup(5).await;
        let err = auth.login("nobody", PASSWORD).await.unwrap_err();
        assert_eq!(err.message, "Invalid username or password");
    }

    #[tokio::test]
    async fn refresh_uses_current_role() {
        let (auth, users) = setup(5).await;
        let outcome = auth.login("desk", PASSWORD).await.unwrap();
        users
            .update_role(outcome.user.id, UserRole::Manager)
            .await
            .unwrap();
        let (token, _) = auth.refresh(&outcome.tokens.refresh_token).await.unwrap();
        let claims = auth.decoder().decode_access_token(&token).unwrap();
        assert_eq!(claims.role, UserRole::Manager);
    }
}
