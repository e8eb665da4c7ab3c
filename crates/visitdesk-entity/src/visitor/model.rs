//! Visitor entity model.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use visitdesk_core::{AppError, AppResult};

use super::identifiers;
use super::kind::VisitorType;
use super::screening::HealthScreening;
use super::status::VisitorStatus;

/// A single visit: one person signing in at the front desk.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Visitor {
    /// Generated visitor identifier (`VIS-...`).
    pub id: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Contact phone number.
    pub phone: Option<String>,
    /// Contact email.
    pub email: Option<String>,
    /// Visitor category.
    pub visitor_type: VisitorType,
    /// Resident being visited.
    pub resident_name: Option<String>,
    /// Room of the resident being visited.
    pub resident_room: Option<String>,
    /// Relationship to the resident.
    pub relationship: Option<String>,
    /// Purpose of the visit.
    pub purpose: String,
    /// Employer, for contractors and clinicians.
    pub company: Option<String>,
    /// Vehicle registration for the car park list.
    pub vehicle_registration: Option<String>,
    /// Lifecycle status.
    pub status: VisitorStatus,
    /// When the visitor signed in.
    pub check_in_time: DateTime<Utc>,
    /// When the visitor signed out.
    pub check_out_time: Option<DateTime<Utc>>,
    /// Entry health questionnaire.
    #[sqlx(json)]
    pub health_screening: HealthScreening,
    /// Payload printed as the badge QR code.
    pub qr_code: String,
    /// Printed badge number.
    pub badge_number: String,
    /// Free-text notes.
    pub notes: Option<String>,
    /// Staff member who checked the visitor in.
    pub checked_in_by: Option<Uuid>,
    /// Staff member who checked the visitor out.
    pub checked_out_by: Option<Uuid>,
    /// When the visitor was marked evacuated.
    pub evacuated_at: Option<DateTime<Utc>>,
    /// Who marked the visitor evacuated.
    pub evacuated_by: Option<Uuid>,
    /// Row creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

/// Fields captured by the check-in form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewVisitor {
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    #[serde(default)]
    pub visitor_type: VisitorType,
    pub resident_name: Option<String>,
    pub resident_room: Option<String>,
    pub relationship: Option<String>,
    pub purpose: String,
    pub company: Option<String>,
    pub vehicle_registration: Option<String>,
    #[serde(default)]
    pub health_screening: HealthScreening,
    pub notes: Option<String>,
}

/// Editable details of an existing visit. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VisitorUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub visitor_type: Option<VisitorType>,
    pub resident_name: Option<String>,
    pub resident_room: Option<String>,
    pub relationship: Option<String>,
    pub purpose: Option<String>,
    pub company: Option<String>,
    pub vehicle_registration: Option<String>,
    pub notes: Option<String>,
}

impl Visitor {
    /// Create a checked-in visitor with freshly generated identifiers.
    pub fn check_in(data: NewVisitor, actor: Option<Uuid>, now: DateTime<Utc>) -> Self {
        let id = identifiers::generate_visitor_id(now);
        let qr_code = identifiers::qr_payload(&id, now);
        Self {
            qr_code,
            badge_number: identifiers::generate_badge_number(now),
            id,
            first_name: data.first_name.trim().to_string(),
            last_name: data.last_name.trim().to_string(),
            phone: data.phone,
            email: data.email,
            visitor_type: data.visitor_type,
            resident_name: data.resident_name,
            resident_room: data.resident_room,
            relationship: data.relationship,
            purpose: data.purpose.trim().to_string(),
            company: data.company,
            vehicle_registration: data.vehicle_registration,
            status: VisitorStatus::CheckedIn,
            check_in_time: now,
            check_out_time: None,
            health_screening: data.health_screening,
            notes: data.notes,
            checked_in_by: actor,
            checked_out_by: None,
            evacuated_at: None,
            evacuated_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// "First Last".
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Whether the visitor is still on the premises.
    pub fn is_on_site(&self) -> bool {
        self.status.is_on_site()
    }

    /// When the visit ended, by check-out or evacuation.
    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.check_out_time.or(self.evacuated_at)
    }

    /// Time on site, up to `now` for visitors still checked in.
    pub fn visit_duration(&self, now: DateTime<Utc>) -> Duration {
        let end = self.ended_at().unwrap_or(now);
        (end - self.check_in_time).max(Duration::zero())
    }

    /// Whether an on-site visitor has stayed longer than `max_hours`.
    pub fn is_overdue(&self, now: DateTime<Utc>, max_hours: i64) -> bool {
        self.is_on_site() && self.visit_duration(now) > Duration::hours(max_hours)
    }

    /// Case-insensitive match against name, phone, resident, badge, and ID.
    pub fn matches_search(&self, query: &str) -> bool {
        let q = query.trim().to_lowercase();
        if q.is_empty() {
            return true;
        }
        let hit = |field: &str| field.to_lowercase().contains(&q);
        hit(&self.full_name())
            || hit(&self.id)
            || hit(&self.badge_number)
            || self.phone.as_deref().is_some_and(hit)
            || self.resident_name.as_deref().is_some_and(hit)
            || self.company.as_deref().is_some_and(hit)
    }

    fn transition(&mut self, next: VisitorStatus) -> AppResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(AppError::conflict(format!(
                "Visitor {} is {} and cannot become {}",
                self.id, self.status, next
            )));
        }
        self.status = next;
        Ok(())
    }

    /// Sign the visitor out.
    pub fn mark_checked_out(&mut self, actor: Option<Uuid>, at: DateTime<Utc>) -> AppResult<()> {
        self.transition(VisitorStatus::CheckedOut)?;
        self.check_out_time = Some(at);
        self.checked_out_by = actor;
        self.updated_at = at;
        Ok(())
    }

    /// Record the visitor as evacuated.
    pub fn mark_evacuated(&mut self, actor: Option<Uuid>, at: DateTime<Utc>) -> AppResult<()> {
        self.transition(VisitorStatus::Evacuated)?;
        self.evacuated_at = Some(at);
        self.evacuated_by = actor;
        self.updated_at = at;
        Ok(())
    }

    /// Apply an edit of the visit details.
    pub fn apply_update(&mut self, update: VisitorUpdate, at: DateTime<Utc>) {
        if let Some(v) = update.first_name {
            self.first_name = v.trim().to_string();
        }
        if let Some(v) = update.last_name {
            self.last_name = v.trim().to_string();
        }
        if let Some(v) = update.purpose {
            self.purpose = v.trim().to_string();
        }
        if let Some(v) = update.visitor_type {
            self.visitor_type = v;
        }
        if update.phone.is_some() {
            self.phone = update.phone;
        }
        if update.email.is_some() {
            self.email = update.email;
        }
        if update.resident_name.is_some() {
            self.resident_name = update.resident_name;
        }
        if update.resident_room.is_some() {
            self.resident_room = update.resident_room;
        }
        if update.relationship.is_some() {
            self.relationship = update.relationship;
        }
        if update.company.is_some() {
            self.company = update.company;
        }
        if update.vehicle_registration.is_some() {
            self.vehicle_registration = update.vehicle_registration;
        }
        if update.notes.is_some() {
            self.notes = update.notes;
        }
        self.updated_at = at;
    }
}
