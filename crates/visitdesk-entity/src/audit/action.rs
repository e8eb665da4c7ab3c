//! Audit action and target-type names.
//!
//! Actions are dotted strings so the log stays readable in exports and
//! can be filtered by prefix (`visitor.`, `evacuation.`).

pub const VISITOR_CHECK_IN: &str = "visitor.check_in";
pub const VISITOR_CHECK_OUT: &str = "visitor.check_out";
pub const VISITOR_UPDATE: &str = "visitor.update";
pub const VISITOR_DELETE: &str = "visitor.delete";
pub const VISITOR_SCREENING_FAILED: &str = "visitor.screening_failed";

pub const EVACUATION_START: &str = "evacuation.start";
pub const EVACUATION_VISITOR: &str = "evacuation.visitor";
pub const EVACUATION_COMPLETE: &str = "evacuation.complete";

pub const AUTH_LOGIN: &str = "auth.login";
pub const AUTH_LOGIN_FAILED: &str = "auth.login_failed";
pub const AUTH_LOCKED: &str = "auth.locked";

pub const USER_CREATE: &str = "user.create";
pub const USER_UPDATE: &str = "user.update";
pub const USER_ROLE_CHANGE: &str = "user.role_change";
pub const USER_STATUS_CHANGE: &str = "user.status_change";
pub const USER_PASSWORD_RESET: &str = "user.password_reset";
pub const USER_PASSWORD_CHANGE: &str = "user.password_change";
pub const USER_DELETE: &str = "user.delete";

pub const EXPORT_VISITORS: &str = "export.visitors";
pub const EXPORT_AUDIT: &str = "export.audit";

pub const BACKUP_COMPLETED: &str = "backup.completed";
pub const BACKUP_FAILED: &str = "backup.failed";
pub const DRIVE_CONNECTED: &str = "backup.drive_connected";
pub const DRIVE_DISCONNECTED: &str = "backup.drive_disconnected";

/// Target types.
pub mod target {
    pub const VISITOR: &str = "visitor";
    pub const USER: &str = "user";
    pub const EVACUATION: &str = "evacuation";
    pub const EXPORT: &str = "export";
    pub const BACKUP: &str = "backup";
    pub const SESSION: &str = "session";
}
