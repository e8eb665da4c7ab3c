//! Role-based view routing.
//!
//! Every client view is gated by one permission. The table below decides
//! which views a role may open, which one it lands on after login, and
//! where a guarded route redirects when access is denied.

use serde::{Deserialize, Serialize};

use visitdesk_entity::user::UserRole;

use crate::rbac::{RbacEnforcer, SystemPermission};

/// A client-side view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    Dashboard,
    CheckIn,
    CheckOut,
    ActiveVisitors,
    VisitorLog,
    Evacuation,
    Reports,
    Users,
    AuditLog,
    Settings,
}

/// One entry in a role's navigation menu.
#[derive(Debug, Clone, Serialize)]
pub struct NavItem {
    pub view: View,
    pub label: &'static str,
    pub path: &'static str,
}

/// Result of guarding a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "view", rename_all = "snake_case")]
pub enum RouteDecision {
    /// Render the requested view.
    Allow(View),
    /// Send the user to this view instead.
    Redirect(View),
}

impl View {
    /// Menu order.
    pub const ALL: [View; 10] = [
        View::Dashboard,
        View::CheckIn,
        View::CheckOut,
        View::ActiveVisitors,
        View::VisitorLog,
        View::Evacuation,
        View::Reports,
        View::Users,
        View::AuditLog,
        View::Settings,
    ];

    /// Permission needed to open the view.
    pub fn required_permission(&self) -> SystemPermission {
        match self {
            View::Dashboard => SystemPermission::ReportView,
            View::CheckIn => SystemPermission::VisitorCheckIn,
            View::CheckOut => SystemPermission::VisitorCheckOut,
            View::ActiveVisitors => SystemPermission::VisitorView,
            View::VisitorLog => SystemPermission::VisitorHistory,
            View::Evacuation => SystemPermission::EvacuationView,
            View::Reports => SystemPermission::ExportData,
            View::Users => SystemPermission::UserRead,
            View::AuditLog => SystemPermission::AuditView,
            View::Settings => SystemPermission::BackupConfigure,
        }
    }

    /// Menu label.
    pub fn label(&self) -> &'static str {
        match self {
            View::Dashboard => "Dashboard",
            View::CheckIn => "Check In",
            View::CheckOut => "Check Out",
            View::ActiveVisitors => "On Site",
            View::VisitorLog => "Visitor Log",
            View::Evacuation => "Evacuation",
            View::Reports => "Reports",
            View::Users => "Users",
            View::AuditLog => "Audit Log",
            View::Settings => "Settings",
        }
    }

    /// Client route path.
    pub fn path(&self) -> &'static str {
        match self {
            View::Dashboard => "/dashboard",
            View::CheckIn => "/check-in",
            View::CheckOut => "/check-out",
            View::ActiveVisitors => "/visitors/active",
            View::VisitorLog => "/visitors",
            View::Evacuation => "/evacuation",
            View::Reports => "/reports",
            View::Users => "/admin/users",
            View::AuditLog => "/admin/audit",
            View::Settings => "/admin/settings",
        }
    }

    /// Look a view up by its route path.
    pub fn from_path(path: &str) -> Option<View> {
        let path = path.trim_end_matches('/');
        Self::ALL.into_iter().find(|v| v.path() == path)
    }
}

/// Navigation table backed by the RBAC policies.
#[derive(Debug, Clone, Default)]
pub struct Navigation {
    rbac: RbacEnforcer,
}

impl Navigation {
    /// Navigation over the given enforcer.
    pub fn new(rbac: RbacEnforcer) -> Self {
        Self { rbac }
    }

    /// Whether `role` may open `view`.
    pub fn can_access(&self, role: &UserRole, view: View) -> bool {
        self.rbac.has_permission(role, &view.required_permission())
    }

    /// Views reachable by `role`, in menu order.
    pub fn views_for(&self, role: &UserRole) -> Vec<View> {
        View::ALL
            .into_iter()
            .filter(|v| self.can_access(role, *v))
            .collect()
    }

    /// Menu entries for `role`.
    pub fn menu_for(&self, role: &UserRole) -> Vec<NavItem> {
        self.views_for(role)
            .into_iter()
            .map(|view| NavItem {
                view,
                label: view.label(),
                path: view.path(),
            })
            .collect()
    }

    /// Landing view after login.
    pub fn default_view(&self, role: &UserRole) -> View {
        let preferred = match role {
            UserRole::Admin | UserRole::Manager => View::Dashboard,
            UserRole::Staff => View::CheckIn,
            UserRole::Security => View::Evacuation,
        };
        if self.can_access(role, preferred) {
            preferred
        } else {
            self.views_for(role)
                .first()
                .copied()
                .unwrap_or(View::ActiveVisitors)
        }
    }

    /// Guard a requested view, redirecting to the landing view when denied.
    pub fn guard(&self, role: &UserRole, requested: View) -> RouteDecision {
        if self.can_access(role, requested) {
            RouteDecision::Allow(requested)
        } else {
            RouteDecision::Redirect(self.default_view(role))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_sees_every_view() {
        let nav = Navigation::default();
        assert_eq!(nav.views_for(&UserRole::Admin).len(), View::ALL.len());
    }

    #[test]
    fn security_lands_on_evacuation() {
        let nav = Navigation::default();
        assert_eq!(nav.default_view(&UserRole::Security), View::Evacuation);
        assert_eq!(
            nav.views_for(&UserRole::Security),
            vec![View::ActiveVisitors, View::Evacuation]
        );
    }

    #[test]
    fn staff_is_redirected_from_users() {
        let nav = Navigation::default();
        assert_eq!(
            nav.guard(&UserRole::Staff, View::Users),
            RouteDecision::Redirect(View::CheckIn)
        );
        assert_eq!(
            nav.guard(&UserRole::Staff, View::CheckOut),
            RouteDecision::Allow(View::CheckOut)
        );
    }

    #[test]
    fn paths_resolve_back_to_views() {
        for view in View::ALL {
            assert_eq!(View::from_path(view.path()), Some(view));
        }
        assert_eq!(View::from_path("/visitors/"), Some(View::VisitorLog));
        assert_eq!(View::from_path("/nowhere"), None);
    }
}
