//! Front-desk visitor operations.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::{info, warn};
use validator::ValidateEmail;

use visitdesk_auth::rbac::RbacEnforcer;
use visitdesk_auth::rbac::policies::SystemPermission;
use visitdesk_core::config::facility::FacilityConfig;
use visitdesk_core::error::AppError;
use visitdesk_core::types::pagination::{PageRequest, PageResponse};
use visitdesk_database::VisitorStore;
use visitdesk_entity::audit::action;
use visitdesk_entity::visitor::{
    NewVisitor, Visitor, VisitorFilter, VisitorStatus, VisitorUpdate,
};

use crate::audit::AuditService;
use crate::context::RequestContext;
use crate::visitor::query::query_with_fallback;

/// Check-in, check-out, lookup, and history.
#[derive(Debug, Clone)]
pub struct VisitorService {
    visitors: Arc<dyn VisitorStore>,
    audit: AuditService,
    rbac: RbacEnforcer,
    facility: FacilityConfig,
}

impl VisitorService {
    /// Creates a new visitor service.
    pub fn new(
        visitors: Arc<dyn VisitorStore>,
        audit: AuditService,
        rbac: RbacEnforcer,
        facility: FacilityConfig,
    ) -> Self {
        Self {
            visitors,
            audit,
            rbac,
            facility,
        }
    }

    /// Register a visitor at the front desk.
    pub async fn check_in(
        &self,
        ctx: &RequestContext,
        mut data: NewVisitor,
    ) -> Result<Visitor, AppError> {
        self.rbac
            .require_permission(&ctx.role, &SystemPermission::VisitorCheckIn)?;
        validate_new_visitor(&data)?;

        let now = Utc::now();

        // Step 1: Health screening
        if self.facility.require_health_screening
            && data.health_screening.temperature_celsius.is_none()
        {
            return Err(AppError::validation("Health screening is required"));
        }
        let threshold = self.facility.temperature_threshold_celsius;
        if !data.health_screening.evaluate(threshold, now) {
            let reasons = data.health_screening.failure_reasons(threshold);
            let name = format!("{} {}", data.first_name.trim(), data.last_name.trim());
            self.audit
                .record(
                    ctx,
                    action::VISITOR_SCREENING_FAILED,
                    action::target::VISITOR,
                    None,
                    json!({ "name": name, "reasons": reasons }),
                )
                .await;
            if self.facility.block_failed_screening {
                warn!(visitor = %name, ?reasons, "Check-in refused after failed screening");
                return Err(AppError::validation(format!(
                    "Health screening failed: {}",
                    reasons.join("; ")
                )));
            }
        }

        // Step 2: Create the record
        let visitor = Visitor::check_in(data, ctx.actor_id(), now);
        self.visitors.insert(&visitor).await?;

        // Step 3: Audit
        self.audit
            .record(
                ctx,
                action::VISITOR_CHECK_IN,
                action::target::VISITOR,
                Some(&visitor.id),
                json!({
                    "name": visitor.full_name(),
                    "visitor_type": visitor.visitor_type,
                    "badge_number": visitor.badge_number,
                    "resident_name": visitor.resident_name,
                    "screening_passed": visitor.health_screening.passed,
                }),
            )
            .await;

        info!(
            visitor_id = %visitor.id,
            badge = %visitor.badge_number,
            by = %ctx.username,
            "Visitor checked in"
        );
        Ok(visitor)
    }

    /// Sign a visitor out by ID.
    pub async fn check_out(&self, ctx: &RequestContext, id: &str) -> Result<Visitor, AppError> {
        self.rbac
            .require_permission(&ctx.role, &SystemPermission::VisitorCheckOut)?;
        let visitor = self.load(id).await?;
        self.finish_check_out(ctx, visitor, "manual").await
    }

    /// Sign a visitor out by scanned QR payload or badge number.
    pub async fn check_out_by_code(
        &self,
        ctx: &RequestContext,
        code: &str,
    ) -> Result<Visitor, AppError> {
        self.rbac
            .require_permission(&ctx.role, &SystemPermission::VisitorCheckOut)?;
        if code.trim().is_empty() {
            return Err(AppError::validation("Scanned code is empty"));
        }
        let visitor = self
            .visitors
            .find_by_code(code)
            .await?
            .ok_or_else(|| AppError::not_found("No visitor matches the scanned code"))?;
        self.finish_check_out(ctx, visitor, "scan").await
    }

    async fn finish_check_out(
        &self,
        ctx: &RequestContext,
        mut visitor: Visitor,
        method: &str,
    ) -> Result<Visitor, AppError> {
        let now = Utc::now();
        let expected = visitor.status;
        visitor.mark_checked_out(ctx.actor_id(), now)?;
        self.write_back(&visitor, expected).await?;

        let minutes = visitor.visit_duration(now).num_minutes();
        self.audit
            .record(
                ctx,
                action::VISITOR_CHECK_OUT,
                action::target::VISITOR,
                Some(&visitor.id),
                json!({ "name": visitor.full_name(), "method": method, "duration_minutes": minutes }),
            )
            .await;

        info!(visitor_id = %visitor.id, method, minutes, "Visitor checked out");
        Ok(visitor)
    }

    /// Everyone currently on site, newest check-in first.
    pub async fn active_visitors(&self, ctx: &RequestContext) -> Result<Vec<Visitor>, AppError> {
        self.rbac
            .require_permission(&ctx.role, &SystemPermission::VisitorView)?;
        query_with_fallback(self.visitors.as_ref(), &VisitorFilter::on_site()).await
    }

    /// Search the visitor log, newest check-in first.
    pub async fn search(
        &self,
        ctx: &RequestContext,
        filter: &VisitorFilter,
        page: &PageRequest,
    ) -> Result<PageResponse<Visitor>, AppError> {
        self.rbac
            .require_permission(&ctx.role, &SystemPermission::VisitorHistory)?;
        let all = query_with_fallback(self.visitors.as_ref(), filter).await?;
        Ok(PageResponse::from_vec(all, page))
    }

    /// Fetch one visitor.
    pub async fn get(&self, ctx: &RequestContext, id: &str) -> Result<Visitor, AppError> {
        self.rbac
            .require_permission(&ctx.role, &SystemPermission::VisitorView)?;
        self.load(id).await
    }

    /// Edit visit details. Status and timestamps are not editable here.
    pub async fn update_details(
        &self,
        ctx: &RequestContext,
        id: &str,
        update: VisitorUpdate,
    ) -> Result<Visitor, AppError> {
        self.rbac
            .require_permission(&ctx.role, &SystemPermission::VisitorUpdate)?;
        for (field, value) in [
            ("first_name", &update.first_name),
            ("last_name", &update.last_name),
            ("purpose", &update.purpose),
        ] {
            if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
                return Err(AppError::validation(format!("{field} cannot be empty")));
            }
        }
        if let Some(email) = &update.email {
            validate_email(email)?;
        }

        let mut visitor = self.load(id).await?;
        let expected = visitor.status;
        let changed = changed_fields(&update);
        visitor.apply_update(update, Utc::now());
        self.write_back(&visitor, expected).await?;

        self.audit
            .record(
                ctx,
                action::VISITOR_UPDATE,
                action::target::VISITOR,
                Some(id),
                json!({ "fields": changed }),
            )
            .await;
        Ok(visitor)
    }

    /// Remove a visitor record.
    pub async fn delete(&self, ctx: &RequestContext, id: &str) -> Result<(), AppError> {
        self.rbac
            .require_permission(&ctx.role, &SystemPermission::VisitorDelete)?;
        let visitor = self.load(id).await?;
        if !self.visitors.delete(id).await? {
            return Err(AppError::not_found(format!("Visitor {id} not found")));
        }
        self.audit
            .record(
                ctx,
                action::VISITOR_DELETE,
                action::target::VISITOR,
                Some(id),
                json!({ "name": visitor.full_name(), "status": visitor.status }),
            )
            .await;
        info!(visitor_id = %id, by = %ctx.username, "Visitor record deleted");
        Ok(())
    }

    /// Store `visitor` unless its status changed after `expected` was read.
    async fn write_back(&self, visitor: &Visitor, expected: VisitorStatus) -> Result<(), AppError> {
        if self.visitors.update(visitor, expected).await? {
            return Ok(());
        }
        match self.visitors.find_by_id(&visitor.id).await? {
            Some(current) => Err(AppError::conflict(format!(
                "Visitor {} is already {}",
                visitor.id, current.status
            ))),
            None => Err(AppError::not_found(format!("Visitor {} not found", visitor.id))),
        }
    }

    async fn load(&self, id: &str) -> Result<Visitor, AppError> {
        self.visitors
            .find_by_id(id.trim())
            .await?
            .ok_or_else(|| AppError::not_found(format!("Visitor {id} not found")))
    }
}

fn validate_new_visitor(data: &NewVisitor) -> Result<(), AppError> {
    if data.first_name.trim().is_empty() {
        return Err(AppError::validation("First name is required"));
    }
    if data.last_name.trim().is_empty() {
        return Err(AppError::validation("Last name is required"));
    }
    if data.purpose.trim().is_empty() {
        return Err(AppError::validation("Purpose of visit is required"));
    }
    if data.visitor_type.visits_resident()
        && data
            .resident_name
            .as_deref()
            .is_none_or(|r| r.trim().is_empty())
    {
        return Err(AppError::validation(format!(
            "Resident name is required for {} visitors",
            data.visitor_type
        )));
    }
    if let Some(email) = &data.email {
        validate_email(email)?;
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<(), AppError> {
    let email = email.trim();
    if email.is_empty() || email.validate_email() {
        Ok(())
    } else {
        Err(AppError::validation("Invalid email format"))
    }
}

fn changed_fields(update: &VisitorUpdate) -> Vec<&'static str> {
    let mut fields = Vec::new();
    let mut note = |set: bool, name: &'static str| {
        if set {
            fields.push(name);
        }
    };
    note(update.first_name.is_some(), "first_name");
    note(update.last_name.is_some(), "last_name");
    note(update.phone.is_some(), "phone");
    note(update.email.is_some(), "email");
    note(update.visitor_type.is_some(), "visitor_type");
    note(update.resident_name.is_some(), "resident_name");
    note(update.resident_room.is_some(), "resident_room");
    note(update.relationship.is_some(), "relationship");
    note(update.purpose.is_some(), "purpose");
    note(update.company.is_some(), "company");
    note(update.vehicle_registration.is_some(), "vehicle_registration");
    note(update.notes.is_some(), "notes");
    fields
}
