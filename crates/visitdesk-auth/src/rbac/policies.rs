//! Role-to-permission mapping definitions.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use visitdesk_entity::user::UserRole;

/// An operation a signed-in staff member may be allowed to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemPermission {
    // Front desk
    /// Register a visitor.
    VisitorCheckIn,
    /// Sign a visitor out.
    VisitorCheckOut,
    /// See who is on site.
    VisitorView,
    /// Search the full visitor log.
    VisitorHistory,
    /// Correct a visitor's details.
    VisitorUpdate,
    /// Remove a visitor record.
    VisitorDelete,

    // Emergency
    /// See the evacuation roster.
    EvacuationView,
    /// Mark visitors evacuated.
    EvacuationTrigger,

    // Reporting
    /// Dashboard and summaries.
    ReportView,
    /// Download CSV/JSON exports.
    ExportData,

    // Backup
    /// Run a backup now and see backup status.
    BackupRun,
    /// Connect or disconnect the cloud drive.
    BackupConfigure,

    // User management
    /// List and read staff accounts.
    UserRead,
    /// Create staff accounts.
    UserCreate,
    /// Edit staff profiles and status.
    UserUpdate,
    /// Delete staff accounts.
    UserDelete,
    /// Change a staff member's role.
    UserChangeRole,
    /// Reset another staff member's password.
    UserResetPassword,

    // Audit / system
    /// Search the audit log.
    AuditView,
    /// Detailed health information.
    SystemHealth,
}

impl SystemPermission {
    /// Every permission.
    pub fn all() -> Vec<SystemPermission> {
        use SystemPermission::*;
        vec![
            VisitorCheckIn,
            VisitorCheckOut,
            VisitorView,
            VisitorHistory,
            VisitorUpdate,
            VisitorDelete,
            EvacuationView,
            EvacuationTrigger,
            ReportView,
            ExportData,
            BackupRun,
            BackupConfigure,
            UserRead,
            UserCreate,
            UserUpdate,
            UserDelete,
            UserChangeRole,
            UserResetPassword,
            AuditView,
            SystemHealth,
        ]
    }
}

/// Role → allowed permissions.
#[derive(Debug, Clone)]
pub struct RbacPolicies {
    policies: HashMap<UserRole, HashSet<SystemPermission>>,
}

impl RbacPolicies {
    /// Creates the default policy set.
    pub fn new() -> Self {
        use SystemPermission::*;
        let mut policies = HashMap::new();

        // Security: roster and evacuation only
        policies.insert(
            UserRole::Security,
            [VisitorView, EvacuationView, EvacuationTrigger]
                .into_iter()
                .collect(),
        );

        // Staff: front desk work plus evacuation
        policies.insert(
            UserRole::Staff,
            [
                VisitorCheckIn,
                VisitorCheckOut,
                VisitorView,
                VisitorHistory,
                VisitorUpdate,
                EvacuationView,
                EvacuationTrigger,
            ]
            .into_iter()
            .collect(),
        );

        // Manager: staff + reports, exports, backups, user reads, audit
        policies.insert(
            UserRole::Manager,
            [
                VisitorCheckIn,
                VisitorCheckOut,
                VisitorView,
                VisitorHistory,
                VisitorUpdate,
                EvacuationView,
                EvacuationTrigger,
                ReportView,
                ExportData,
                BackupRun,
                UserRead,
                AuditView,
                SystemHealth,
            ]
            .into_iter()
            .collect(),
        );

        // Admin: everything
        policies.insert(UserRole::Admin, SystemPermission::all().into_iter().collect());

        Self { policies }
    }

    /// Checks whether the given role has the specified permission.
    pub fn has_permission(&self, role: &UserRole, permission: &SystemPermission) -> bool {
        self.policies
            .get(role)
            .is_some_and(|perms| perms.contains(permission))
    }
}

impl Default for RbacPolicies {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_has_every_permission() {
        let p = RbacPolicies::new();
        for perm in SystemPermission::all() {
            assert!(p.has_permission(&UserRole::Admin, &perm), "{perm:?}");
        }
    }

    #[test]
    fn security_cannot_check_in() {
        let p = RbacPolicies::new();
        assert!(!p.has_permission(&UserRole::Security, &SystemPermission::VisitorCheckIn));
        assert!(p.has_permission(&UserRole::Security, &SystemPermission::EvacuationTrigger));
    }

    #[test]
    fn staff_cannot_export_or_delete() {
        let p = RbacPolicies::new();
        assert!(!p.has_permission(&UserRole::Staff, &SystemPermission::ExportData));
        assert!(!p.has_permission(&UserRole::Staff, &SystemPermission::VisitorDelete));
        assert!(p.has_permission(&UserRole::Manager, &SystemPermission::ExportData));
    }
}
