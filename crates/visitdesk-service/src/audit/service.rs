//! Audit log service.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error};

use visitdesk_auth::rbac::RbacEnforcer;
use visitdesk_auth::rbac::policies::SystemPermission;
use visitdesk_core::error::AppError;
use visitdesk_core::types::pagination::{PageRequest, PageResponse};
use visitdesk_database::AuditStore;
use visitdesk_entity::audit::{AuditLogEntry, AuditSearch, CreateAuditLogEntry};

use crate::context::RequestContext;

/// Records and searches audit entries.
#[derive(Debug, Clone)]
pub struct AuditService {
    store: Arc<dyn AuditStore>,
    rbac: RbacEnforcer,
}

impl AuditService {
    /// Creates a new audit service.
    pub fn new(store: Arc<dyn AuditStore>, rbac: RbacEnforcer) -> Self {
        Self { store, rbac }
    }

    /// Append an entry for `ctx`.
    ///
    /// Failures are logged and swallowed: the audited operation has already
    /// happened and must not be reported as failed.
    pub async fn record(
        &self,
        ctx: &RequestContext,
        action: &str,
        target_type: &str,
        target_id: Option<&str>,
        details: Value,
    ) {
        let entry = CreateAuditLogEntry {
            actor_id: ctx.actor_id(),
            actor_name: Some(ctx.username.clone()),
            action: action.to_string(),
            target_type: target_type.to_string(),
            target_id: target_id.map(str::to_string),
            details,
            ip_address: ctx.ip_address.clone(),
        };
        match self.store.append(entry).await {
            Ok(saved) => debug!(action, entry_id = %saved.id, "Audit entry recorded"),
            Err(e) => error!(action, target_type, error = %e, "Failed to record audit entry"),
        }
    }

    /// Search the audit log, newest first.
    pub async fn search(
        &self,
        ctx: &RequestContext,
        search: &AuditSearch,
        page: &PageRequest,
    ) -> Result<PageResponse<AuditLogEntry>, AppError> {
        self.rbac
            .require_permission(&ctx.role, &SystemPermission::AuditView)?;
        self.store.search(search, page).await
    }

    /// Every matching entry, newest first.
    pub async fn find_matching(
        &self,
        ctx: &RequestContext,
        search: &AuditSearch,
    ) -> Result<Vec<AuditLogEntry>, AppError> {
        self.rbac
            .require_permission(&ctx.role, &SystemPermission::AuditView)?;
        self.store.find_matching(search).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;
    use visitdesk_core::error::ErrorKind;
    use visitdesk_database::memory::MemoryAuditStore;
    use visitdesk_entity::audit::action;
    use visitdesk_entity::user::UserRole;

    fn service() -> AuditService {
        AuditService::new(Arc::new(MemoryAuditStore::new()), RbacEnforcer::new())
    }

    #[tokio::test]
    async fn recorded_entries_are_searchable_by_prefix() {
        let audit = service();
        let ctx = RequestContext::new(Uuid::new_v4(), "lead".into(), UserRole::Manager, None);
        audit
            .record(&ctx, action::EVACUATION_START, action::target::EVACUATION, None, Value::Null)
            .await;
        audit
            .record(
                &ctx,
                action::VISITOR_CHECK_IN,
                action::target::VISITOR,
                Some("VIS-1"),
                serde_json::json!({ "badge": "B-1" }),
            )
            .await;

        let search = AuditSearch {
            action: Some("evacuation.".into()),
            ..Default::default()
        };
        let page = audit.search(&ctx, &search, &PageRequest::default()).await.unwrap();
        assert_eq!(page.total_items, 1);
        assert_eq!(page.items[0].actor_name.as_deref(), Some("lead"));
        assert_eq!(page.items[0].actor_id, ctx.actor_id());
    }

    #[tokio::test]
    async fn staff_cannot_read_the_log() {
        let audit = service();
        let ctx = RequestContext::new(Uuid::new_v4(), "desk".into(), UserRole::Staff, None);
        let err = audit
            .search(&ctx, &AuditSearch::default(), &PageRequest::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authorization);
    }
}
