//! RBAC enforcement: checks whether a role holds a required permission.

use visitdesk_core::error::AppError;
use visitdesk_entity::user::UserRole;

use super::policies::{RbacPolicies, SystemPermission};

/// Enforces role-based access control for every service operation.
#[derive(Debug, Clone, Default)]
pub struct RbacEnforcer {
    policies: RbacPolicies,
}

impl RbacEnforcer {
    /// Creates a new enforcer with the default policy set.
    pub fn new() -> Self {
        Self::default()
    }

    /// `Ok(())` when `role` holds `permission`, an authorization error otherwise.
    pub fn require_permission(
        &self,
        role: &UserRole,
        permission: &SystemPermission,
    ) -> Result<(), AppError> {
        if self.policies.has_permission(role, permission) {
            Ok(())
        } else {
            Err(AppError::authorization(format!(
                "Role '{role}' does not have permission '{permission:?}'"
            )))
        }
    }

    /// Checks whether the role has the required permission (returns bool).
    pub fn has_permission(&self, role: &UserRole, permission: &SystemPermission) -> bool {
        self.policies.has_permission(role, permission)
    }

    /// Require at least `minimum` in the Admin > Manager > Staff > Security order.
    pub fn require_minimum_role(
        &self,
        actual: &UserRole,
        minimum: &UserRole,
    ) -> Result<(), AppError> {
        if actual.has_at_least(minimum) {
            Ok(())
        } else {
            Err(AppError::authorization(format!(
                "Role '{actual}' is insufficient; minimum required: '{minimum}'"
            )))
        }
    }

    /// Returns a reference to the underlying policies.
    pub fn policies(&self) -> &RbacPolicies {
        &self.policies
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use visitdesk_core::error::ErrorKind;

    #[test]
    fn denial_is_authorization_error() {
        let err = RbacEnforcer::new()
            .require_permission(&UserRole::Staff, &SystemPermission::UserDelete)
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authorization);
    }

    #[test]
    fn minimum_role_follows_hierarchy() {
        let rbac = RbacEnforcer::new();
        assert!(rbac.require_minimum_role(&UserRole::Manager, &UserRole::Staff).is_ok());
        assert!(rbac.require_minimum_role(&UserRole::Security, &UserRole::Staff).is_err());
    }
}
