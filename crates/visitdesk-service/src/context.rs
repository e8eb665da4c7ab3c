//! Request context carrying the authenticated caller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use visitdesk_entity::user::UserRole;

/// Who is acting, passed into every service method.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    /// The authenticated user's ID (nil for system jobs).
    pub user_id: Uuid,
    /// The username from the access token.
    pub username: String,
    /// The role from the access token.
    pub role: UserRole,
    /// IP address of the request origin.
    pub ip_address: Option<String>,
    /// When the request was received.
    pub request_time: DateTime<Utc>,
}

impl RequestContext {
    /// Creates a context for an authenticated user.
    pub fn new(user_id: Uuid, username: String, role: UserRole, ip_address: Option<String>) -> Self {
        Self {
            user_id,
            username,
            role,
            ip_address,
            request_time: Utc::now(),
        }
    }

    /// Context for scheduled jobs and CLI maintenance. Holds the admin role.
    pub fn system() -> Self {
        Self::new(Uuid::nil(), "system".to_string(), UserRole::Admin, None)
    }

    /// Whether this is the system context.
    pub fn is_system(&self) -> bool {
        self.user_id.is_nil()
    }

    /// Actor ID for audit entries; `None` for the system.
    pub fn actor_id(&self) -> Option<Uuid> {
        Some(self.user_id).filter(|id| !id.is_nil())
    }

    /// Returns whether the current user is an admin.
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_context_has_no_actor() {
        let ctx = RequestContext::system();
        assert!(ctx.is_system());
        assert_eq!(ctx.actor_id(), None);
        assert!(ctx.is_admin());

        let user = RequestContext::new(Uuid::new_v4(), "desk".into(), UserRole::Staff, None);
        assert!(user.actor_id().is_some());
    }
}
