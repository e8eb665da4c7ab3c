//! Request DTOs with validation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use visitdesk_core::error::AppError;
use visitdesk_core::types::DateRange;
use visitdesk_core::types::pagination::PageRequest;
use visitdesk_entity::audit::AuditSearch;
use visitdesk_entity::user::{UserRole, UserStatus};
use visitdesk_entity::visitor::{
    HealthScreening, NewVisitor, VisitorFilter, VisitorStatus, VisitorType,
};
use visitdesk_service::ExportFormat;

/// Login request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    /// Username.
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
    /// Password.
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Token refresh request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshRequest {
    /// Refresh token.
    pub refresh_token: String,
}

/// Password change request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    /// Current password.
    #[validate(length(min = 1, message = "Current password is required"))]
    pub current_password: String,
    /// New password.
    #[validate(length(min = 1, message = "New password is required"))]
    pub new_password: String,
}

/// Update profile request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateProfileRequest {
    /// Display name.
    pub display_name: Option<String>,
    /// Email.
    pub email: Option<String>,
}

/// Front-desk check-in form.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CheckInRequest {
    #[validate(length(min = 1, max = 100, message = "First name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100, message = "Last name is required"))]
    pub last_name: String,
    #[validate(length(max = 32))]
    pub phone: Option<String>,
    #[validate(email(message = "Email address is invalid"))]
    pub email: Option<String>,
    #[serde(default)]
    pub visitor_type: VisitorType,
    pub resident_name: Option<String>,
    pub resident_room: Option<String>,
    pub relationship: Option<String>,
    #[validate(length(min = 1, max = 500, message = "Purpose of visit is required"))]
    pub purpose: String,
    pub company: Option<String>,
    pub vehicle_registration: Option<String>,
    #[serde(default)]
    pub health_screening: HealthScreening,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

impl From<CheckInRequest> for NewVisitor {
    fn from(req: CheckInRequest) -> Self {
        Self {
            first_name: req.first_name,
            last_name: req.last_name,
            phone: req.phone,
            email: req.email,
            visitor_type: req.visitor_type,
            resident_name: req.resident_name,
            resident_room: req.resident_room,
            relationship: req.relationship,
            purpose: req.purpose,
            company: req.company,
            vehicle_registration: req.vehicle_registration,
            health_screening: req.health_screening,
            notes: req.notes,
        }
    }
}

/// Check-out by scanned QR payload or badge number.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ScanCheckoutRequest {
    /// Raw scanner output.
    #[validate(length(min = 1, message = "Scan code is required"))]
    pub code: String,
}

/// Inclusive `from`/`to` date bounds.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RangeQuery {
    /// First day (inclusive).
    pub from: Option<NaiveDate>,
    /// Last day (inclusive).
    pub to: Option<NaiveDate>,
}

impl RangeQuery {
    /// Resolve into a range, defaulting missing bounds.
    pub fn range(&self) -> Result<DateRange, AppError> {
        DateRange::from_optional(self.from, self.to)
    }
}

/// Visitor history query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisitorQuery {
    /// Only this status.
    pub status: Option<VisitorStatus>,
    /// First check-in day (inclusive).
    pub from: Option<NaiveDate>,
    /// Last check-in day (inclusive).
    pub to: Option<NaiveDate>,
    /// Free-text search.
    pub q: Option<String>,
    /// Page number (1-based).
    #[serde(default = "default_page")]
    pub page: u64,
    /// Items per page.
    #[serde(default = "default_per_page")]
    pub per_page: u64,
}

impl VisitorQuery {
    /// Store filter. No date bounds means the whole log.
    pub fn filter(&self) -> Result<VisitorFilter, AppError> {
        Ok(VisitorFilter {
            status: self.status,
            range: optional_range(self.from, self.to)?,
            search: self.q.clone(),
        })
    }

    /// Requested page.
    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page, self.per_page)
    }
}

/// Export query: format plus date bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportQuery {
    /// `csv` (default) or `json`.
    #[serde(default)]
    pub format: ExportFormat,
    /// First day (inclusive).
    pub from: Option<NaiveDate>,
    /// Last day (inclusive).
    pub to: Option<NaiveDate>,
}

/// Audit log search query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditQuery {
    /// Action or action prefix.
    pub action: Option<String>,
    /// Acting user.
    pub actor_id: Option<Uuid>,
    /// Target type.
    pub target_type: Option<String>,
    /// Target id.
    pub target_id: Option<String>,
    /// First day (inclusive).
    pub from: Option<NaiveDate>,
    /// Last day (inclusive).
    pub to: Option<NaiveDate>,
    /// Page number (1-based).
    #[serde(default = "default_page")]
    pub page: u64,
    /// Items per page.
    #[serde(default = "default_per_page")]
    pub per_page: u64,
}

impl AuditQuery {
    /// Search criteria. No date bounds means all time.
    pub fn search(&self) -> Result<AuditSearch, AppError> {
        Ok(AuditSearch {
            action: self.action.clone().filter(|a| !a.is_empty()),
            actor_id: self.actor_id,
            target_type: self.target_type.clone().filter(|t| !t.is_empty()),
            target_id: self.target_id.clone().filter(|t| !t.is_empty()),
            range: optional_range(self.from, self.to)?,
        })
    }

    /// Requested page.
    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page, self.per_page)
    }
}

/// Create user request (admin).
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateUserRequest {
    /// Username.
    #[validate(length(min = 3, max = 64))]
    pub username: String,
    /// Email.
    #[validate(email)]
    pub email: Option<String>,
    /// Password.
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
    /// Display name.
    pub display_name: Option<String>,
    /// Job title.
    pub job_title: Option<String>,
    /// Role.
    pub role: UserRole,
}

/// Change role request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeRoleRequest {
    /// New role.
    pub role: UserRole,
}

/// Change status request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeStatusRequest {
    /// New status.
    pub status: UserStatus,
}

/// Admin password reset.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    /// New password.
    #[validate(length(min = 1, message = "New password is required"))]
    pub new_password: String,
}

/// Client route to check against the caller's navigation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteQuery {
    pub path: String,
}

/// Query string of the OAuth consent redirect.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriveCallbackQuery {
    /// Authorization code.
    pub code: Option<String>,
    /// State issued with the consent URL.
    pub state: Option<String>,
    /// Error reported by the provider.
    pub error: Option<String>,
}

/// `None` when neither bound is given.
fn optional_range(
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Result<Option<DateRange>, AppError> {
    if from.is_none() && to.is_none() {
        return Ok(None);
    }
    DateRange::from_optional(from, to).map(Some)
}

fn default_page() -> u64 {
    1
}

fn default_per_page() -> u64 {
    25
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visitor_query_without_dates_has_no_range() {
        let query: VisitorQuery = serde_json::from_value(serde_json::json!({
            "status": "checked_out",
            "q": "smith"
        }))
        .unwrap();
        let filter = query.filter().unwrap();
        assert_eq!(filter.status, Some(VisitorStatus::CheckedOut));
        assert!(filter.range.is_none());
        assert_eq!(query.page_request().page_size, 25);
    }

    #[test]
    fn reversed_bounds_are_rejected() {
        let query = AuditQuery {
            action: None,
            actor_id: None,
            target_type: None,
            target_id: None,
            from: NaiveDate::from_ymd_opt(2026, 3, 10),
            to: NaiveDate::from_ymd_opt(2026, 3, 1),
            page: 1,
            per_page: 25,
        };
        assert!(query.search().is_err());
    }

    #[test]
    fn check_in_requires_names_and_purpose() {
        let req: CheckInRequest = serde_json::from_value(serde_json::json!({
            "first_name": "",
            "last_name": "Smith",
            "purpose": ""
        }))
        .unwrap();
        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("first_name"));
        assert!(fields.contains_key("purpose"));
        assert!(!fields.contains_key("last_name"));
    }
}
