//! Audit log entry entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use visitdesk_core::types::DateRange;

/// An immutable audit log entry recording an action at the front desk.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AuditLogEntry {
    /// Unique audit entry identifier.
    pub id: Uuid,
    /// The user who performed the action (`None` for system jobs).
    pub actor_id: Option<Uuid>,
    /// Username of the actor at the time of the action.
    pub actor_name: Option<String>,
    /// The action that was performed (e.g., `"visitor.check_in"`).
    pub action: String,
    /// The type of target resource (e.g., `"visitor"`, `"user"`).
    pub target_type: String,
    /// The target resource ID (if applicable).
    pub target_id: Option<String>,
    /// Free-form details map.
    pub details: serde_json::Value,
    /// IP address of the actor.
    pub ip_address: Option<String>,
    /// When the action occurred.
    pub created_at: DateTime<Utc>,
}

impl AuditLogEntry {
    /// Materialize a new entry stamped with `now`.
    pub fn from_create(data: CreateAuditLogEntry, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            actor_id: data.actor_id,
            actor_name: data.actor_name,
            action: data.action,
            target_type: data.target_type,
            target_id: data.target_id,
            details: data.details,
            ip_address: data.ip_address,
            created_at: now,
        }
    }
}

/// Data required to create a new audit log entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAuditLogEntry {
    /// The user who performed the action.
    pub actor_id: Option<Uuid>,
    /// The actor's username.
    pub actor_name: Option<String>,
    /// The action performed.
    pub action: String,
    /// Target resource type.
    pub target_type: String,
    /// Target resource ID.
    pub target_id: Option<String>,
    /// Additional details.
    pub details: serde_json::Value,
    /// Actor's IP address.
    pub ip_address: Option<String>,
}

/// Criteria for searching the audit log. Empty fields match everything.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditSearch {
    /// Exact action or a prefix ending in `.` (e.g. `"evacuation."`).
    pub action: Option<String>,
    /// Restrict to one actor.
    pub actor_id: Option<Uuid>,
    /// Restrict to one target type.
    pub target_type: Option<String>,
    /// Restrict to one target.
    pub target_id: Option<String>,
    /// Inclusive day range.
    pub range: Option<DateRange>,
}

impl AuditSearch {
    /// Whether an entry satisfies every set criterion.
    pub fn matches(&self, entry: &AuditLogEntry) -> bool {
        if let Some(action) = &self.action {
            let ok = if action.ends_with('.') {
                entry.action.starts_with(action.as_str())
            } else {
                entry.action == *action
            };
            if !ok {
                return false;
            }
        }
        if self.actor_id.is_some() && entry.actor_id != self.actor_id {
            return false;
        }
        if let Some(t) = &self.target_type {
            if entry.target_type != *t {
                return false;
            }
        }
        if self.target_id.is_some() && entry.target_id != self.target_id {
            return false;
        }
        if let Some(range) = &self.range {
            if !range.contains(entry.created_at) {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::action;

    fn entry(action: &str) -> AuditLogEntry {
        AuditLogEntry::from_create(
            CreateAuditLogEntry {
                actor_id: None,
                actor_name: Some("system".into()),
                action: action.into(),
                target_type: action::target::VISITOR.into(),
                target_id: Some("VIS-1".into()),
                details: serde_json::json!({}),
                ip_address: None,
            },
            Utc::now(),
        )
    }

    #[test]
    fn action_prefix_matches_family() {
        let search = AuditSearch {
            action: Some("evacuation.".into()),
            ..Default::default()
        };
        assert!(search.matches(&entry(action::EVACUATION_VISITOR)));
        assert!(!search.matches(&entry(action::VISITOR_CHECK_IN)));
    }

    #[test]
    fn exact_action_and_target() {
        let search = AuditSearch {
            action: Some(action::VISITOR_CHECK_IN.into()),
            target_id: Some("VIS-1".into()),
            ..Default::default()
        };
        assert!(search.matches(&entry(action::VISITOR_CHECK_IN)));
        assert!(!search.matches(&entry(action::VISITOR_CHECK_OUT)));
    }
}
