//! Evacuation service.
//!
//! An evacuation marks every targeted on-site visitor as evacuated. The
//! writes are independent: they are issued together, one failure does not
//! undo the others, and every visitor gets its own outcome in the report.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info, warn};
use uuid::Uuid;

use visitdesk_auth::rbac::RbacEnforcer;
use visitdesk_auth::rbac::policies::SystemPermission;
use visitdesk_core::config::facility::FacilityConfig;
use visitdesk_core::error::AppError;
use visitdesk_database::VisitorStore;
use visitdesk_entity::audit::action;
use visitdesk_entity::visitor::{Visitor, VisitorFilter};

use crate::audit::AuditService;
use crate::context::RequestContext;
use crate::visitor::query::query_with_fallback;

/// Which visitors an evacuation covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scope", content = "visitor_ids", rename_all = "snake_case")]
pub enum EvacuationScope {
    /// Everyone on site.
    All,
    /// Only the listed visitor IDs.
    Visitors(Vec<String>),
}

/// One on-site visitor on the roster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterEntry {
    /// The visitor.
    pub visitor: Visitor,
    /// Minutes since check-in.
    pub minutes_on_site: i64,
    /// Whether the visit exceeds the facility's maximum.
    pub overdue: bool,
}

/// Everyone to account for during an evacuation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvacuationRoster {
    /// When the roster was produced.
    pub generated_at: DateTime<Utc>,
    /// Number of visitors on site.
    pub total_on_site: usize,
    /// Number of overdue visitors.
    pub overdue_count: usize,
    /// On-site visitors, newest check-in first.
    pub entries: Vec<RosterEntry>,
}

/// Result for a single visitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    /// Marked evacuated.
    Evacuated,
    /// Not on site or not found; nothing written.
    Skipped,
    /// The write failed.
    Failed,
}

/// Per-visitor evacuation outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvacuationOutcome {
    /// Visitor ID.
    pub visitor_id: String,
    /// Visitor name, when the record was found.
    pub name: Option<String>,
    /// What happened.
    pub status: OutcomeStatus,
    /// Reason for a skip or failure.
    pub reason: Option<String>,
}

/// Summary of an evacuation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvacuationReport {
    /// Identifier tying the audit entries of this run together.
    pub evacuation_id: Uuid,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// When the last write finished.
    pub completed_at: DateTime<Utc>,
    /// Number of visitors marked evacuated.
    pub evacuated: usize,
    /// Number skipped.
    pub skipped: usize,
    /// Number of failed writes.
    pub failed: usize,
    /// Per-visitor outcomes.
    pub outcomes: Vec<EvacuationOutcome>,
}

/// Roster and bulk evacuation.
#[derive(Debug, Clone)]
pub struct EvacuationService {
    visitors: Arc<dyn VisitorStore>,
    audit: AuditService,
    rbac: RbacEnforcer,
    facility: FacilityConfig,
}

impl EvacuationService {
    /// Creates a new evacuation service.
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

    /// Everyone currently on site with overdue flags.
    pub async fn roster(&self, ctx: &RequestContext) -> Result<EvacuationRoster, AppError> {
        self.rbac
            .require_permission(&ctx.role, &SystemPermission::EvacuationView)?;

        let now = Utc::now();
        let on_site = query_with_fallback(self.visitors.as_ref(), &VisitorFilter::on_site()).await?;
        let entries: Vec<RosterEntry> = on_site
            .into_iter()
            .map(|visitor| RosterEntry {
                minutes_on_site: visitor.visit_duration(now).num_minutes(),
                overdue: visitor.is_overdue(now, self.facility.max_visit_hours),
                visitor,
            })
            .collect();

        Ok(EvacuationRoster {
            generated_at: now,
            total_on_site: entries.len(),
            overdue_count: entries.iter().filter(|e| e.overdue).count(),
            entries,
        })
    }

    /// Mark the targeted visitors evacuated.
    pub async fn evacuate(
        &self,
        ctx: &RequestContext,
        scope: EvacuationScope,
    ) -> Result<EvacuationReport, AppError> {
        self.rbac
            .require_permission(&ctx.role, &SystemPermission::EvacuationTrigger)?;

        let evacuation_id = Uuid::new_v4();
        let started_at = Utc::now();
        let mut outcomes = Vec::new();

        // Step 1: Resolve targets
        let targets = match &scope {
            EvacuationScope::All => {
                query_with_fallback(self.visitors.as_ref(), &VisitorFilter::on_site()).await?
            }
            EvacuationScope::Visitors(ids) => {
                if ids.is_empty() {
                    return Err(AppError::validation("No visitors selected for evacuation"));
                }
                let mut seen = HashSet::new();
                let ids: Vec<&String> = ids.iter().filter(|id| seen.insert(id.trim())).collect();
                let found = join_all(ids.iter().map(|id| self.visitors.find_by_id(id.trim()))).await;

                let mut targets = Vec::new();
                for (id, result) in ids.into_iter().zip(found) {
                    match result {
                        Ok(Some(v)) if v.is_on_site() => targets.push(v),
                        Ok(Some(v)) => outcomes.push(EvacuationOutcome {
                            visitor_id: v.id.clone(),
                            name: Some(v.full_name()),
                            status: OutcomeStatus::Skipped,
                            reason: Some(format!("visitor is {}", v.status)),
                        }),
                        Ok(None) => outcomes.push(EvacuationOutcome {
                            visitor_id: id.trim().to_string(),
                            name: None,
                            status: OutcomeStatus::Skipped,
                            reason: Some("visitor not found".to_string()),
                        }),
                        Err(e) => {
                            warn!(%evacuation_id, visitor_id = %id.trim(), error = %e, "Evacuation lookup failed");
                            outcomes.push(EvacuationOutcome {
                                visitor_id: id.trim().to_string(),
                                name: None,
                                status: OutcomeStatus::Failed,
                                reason: Some(e.to_string()),
                            });
                        }
                    }
                }
                targets
            }
        };

        self.audit
            .record(
                ctx,
                action::EVACUATION_START,
                action::target::EVACUATION,
                Some(&evacuation_id.to_string()),
                json!({
                    "scope": if scope == EvacuationScope::All { "all" } else { "selected" },
                    "targets": targets.len(),
                }),
            )
            .await;
        warn!(%evacuation_id, targets = targets.len(), by = %ctx.username, "Evacuation started");

        // Step 2: Independent writes, issued together
        let writes = targets
            .into_iter()
            .map(|visitor| self.evacuate_one(ctx, evacuation_id, visitor));
        outcomes.extend(join_all(writes).await);

        // Step 3: Summarize
        let count = |s: OutcomeStatus| outcomes.iter().filter(|o| o.status == s).count();
        let report = EvacuationReport {
            evacuation_id,
            started_at,
            completed_at: Utc::now(),
            evacuated: count(OutcomeStatus::Evacuated),
            skipped: count(OutcomeStatus::Skipped),
            failed: count(OutcomeStatus::Failed),
            outcomes,
        };

        self.audit
            .record(
                ctx,
                action::EVACUATION_COMPLETE,
                action::target::EVACUATION,
                Some(&evacuation_id.to_string()),
                json!({
                    "evacuated": report.evacuated,
                    "skipped": report.skipped,
                    "failed": report.failed,
                }),
            )
            .await;

        if report.failed > 0 {
            error!(%evacuation_id, failed = report.failed, "Evacuation finished with failed writes");
        } else {
            info!(%evacuation_id, evacuated = report.evacuated, "Evacuation finished");
        }
        Ok(report)
    }

    async fn evacuate_one(
        &self,
        ctx: &RequestContext,
        evacuation_id: Uuid,
        mut visitor: Visitor,
    ) -> EvacuationOutcome {
        let name = visitor.full_name();
        let expected = visitor.status;
        let (status, reason) = match visitor.mark_evacuated(ctx.actor_id(), Utc::now()) {
            Ok(()) => match self.visitors.update(&visitor, expected).await {
                Ok(true) => (OutcomeStatus::Evacuated, None),
                Ok(false) => {
                    info!(%evacuation_id, visitor_id = %visitor.id, "Visitor left before evacuation write");
                    (
                        OutcomeStatus::Skipped,
                        Some("visitor status changed before evacuation".to_string()),
                    )
                }
                Err(e) => {
                    warn!(%evacuation_id, visitor_id = %visitor.id, error = %e, "Evacuation write failed");
                    (OutcomeStatus::Failed, Some(e.to_string()))
                }
            },
            Err(e) => (OutcomeStatus::Skipped, Some(e.message)),
        };

        self.audit
            .record(
                ctx,
                action::EVACUATION_VISITOR,
                action::target::VISITOR,
                Some(&visitor.id),
                json!({
                    "evacuation_id": evacuation_id,
                    "name": name,
                    "status": status,
                    "reason": reason,
                }),
            )
            .await;

        EvacuationOutcome {
            visitor_id: visitor.id,
            name: Some(name),
            status,
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use async_trait::async_trait;
    use chrono::Duration;
    use visitdesk_core::error::ErrorKind;
    use visitdesk_core::result::AppResult;
    use visitdesk_core::types::DateRange;
    use visitdesk_database::AuditStore;
    use visitdesk_database::memory::{MemoryAuditStore, MemoryVisitorStore};
    use visitdesk_entity::audit::AuditSearch;
    use visitdesk_entity::user::UserRole;
    use visitdesk_entity::visitor::{NewVisitor, VisitorStatus};

    /// Delegating store with injectable faults.
    #[derive(Debug, Default)]
    struct FaultyStore {
        inner: MemoryVisitorStore,
        /// Updates for this ID fail.
        fail_update: Option<String>,
        /// Lookups for this ID fail.
        fail_lookup: Option<String>,
        /// Check this visitor out right after a roster query returns.
        check_out_after_query: Option<String>,
    }

    #[async_trait]
    impl VisitorStore for FaultyStore {
        async fn insert(&self, v: &Visitor) -> AppResult<()> {
            self.inner.insert(v).await
        }
        async fn find_by_id(&self, id: &str) -> AppResult<Option<Visitor>> {
            if self.fail_lookup.as_deref() == Some(id) {
                return Err(AppError::database("statement timeout"));
            }
            self.inner.find_by_id(id).await
        }
        async fn find_by_code(&self, code: &str) -> AppResult<Option<Visitor>> {
            self.inner.find_by_code(code).await
        }
        async fn update(&self, v: &Visitor, expected: VisitorStatus) -> AppResult<bool> {
            if self.fail_update.as_deref() == Some(v.id.as_str()) {
                return Err(AppError::database("connection reset"));
            }
            self.inner.update(v, expected).await
        }
        async fn delete(&self, id: &str) -> AppResult<bool> {
            self.inner.delete(id).await
        }
        async fn find_by_status(&self, s: VisitorStatus) -> AppResult<Vec<Visitor>> {
            self.inner.find_by_status(s).await
        }
        async fn find_checked_in_between(&self, r: &DateRange) -> AppResult<Vec<Visitor>> {
            self.inner.find_checked_in_between(r).await
        }
        async fn find_all(&self) -> AppResult<Vec<Visitor>> {
            self.inner.find_all().await
        }
        async fn query(&self, f: &VisitorFilter) -> AppResult<Vec<Visitor>> {
            let result = self.inner.query(f).await?;
            if let Some(id) = &self.check_out_after_query {
                if let Some(mut v) = self.inner.find_by_id(id).await? {
                    v.mark_checked_out(None, Utc::now())?;
                    self.inner.update(&v, VisitorStatus::CheckedIn).await?;
                }
            }
            Ok(result)
        }
        async fn count_by_status(&self) -> AppResult<HashMap<VisitorStatus, u64>> {
            self.inner.count_by_status().await
        }
    }

    fn visitor(id: &str, hours_ago: i64) -> Visitor {
        let mut v = Visitor::check_in(
            NewVisitor {
                first_name: id.into(),
                last_name: "Guest".into(),
                purpose: "Visit".into(),
                ..Default::default()
            },
            None,
            Utc::now() - Duration::hours(hours_ago),
        );
        v.id = id.to_string();
        v
    }

    async fn setup(
        store: Arc<dyn VisitorStore>,
    ) -> (EvacuationService, Arc<MemoryAuditStore>, RequestContext) {
        let audit = Arc::new(MemoryAuditStore::new());
        let service = EvacuationService::new(
            store,
            AuditService::new(audit.clone(), RbacEnforcer::new()),
            RbacEnforcer::new(),
            FacilityConfig::default(),
        );
        let ctx = RequestContext::new(Uuid::new_v4(), "gate".into(), UserRole::Security, None);
        (service, audit, ctx)
    }

    #[tokio::test]
    async fn roster_flags_overdue_visitors() {
        let store = Arc::new(MemoryVisitorStore::new());
        store.insert(&visitor("A", 1)).await.unwrap();
        store.insert(&visitor("B", 6)).await.unwrap();
        let mut gone = visitor("C", 2);
        gone.mark_checked_out(None, Utc::now()).unwrap();
        store.insert(&gone).await.unwrap();

        let (service, _, ctx) = setup(store).await;
        let roster = service.roster(&ctx).await.unwrap();
        assert_eq!(roster.total_on_site, 2);
        assert_eq!(roster.overdue_count, 1);
        assert_eq!(roster.entries[0].visitor.id, "A");
        assert!(roster.entries[1].overdue);
    }

    #[tokio::test]
    async fn evacuate_all_marks_everyone_on_site() {
        let store = Arc::new(MemoryVisitorStore::new());
        for id in ["A", "B", "C"] {
            store.insert(&visitor(id, 1)).await.unwrap();
        }
        let (service, audit, ctx) = setup(store.clone()).await;

        let report = service.evacuate(&ctx, EvacuationScope::All).await.unwrap();
        assert_eq!(report.evacuated, 3);
        assert_eq!(report.failed, 0);
        assert!(
            store
                .find_by_status(VisitorStatus::CheckedIn)
                .await
                .unwrap()
                .is_empty()
        );

        let entries = audit
            .find_matching(&AuditSearch {
                action: Some("evacuation.".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        // start + one per visitor + complete
        assert_eq!(entries.len(), 5);
    }

    #[tokio::test]
    async fn one_failed_write_does_not_undo_the_others() {
        let inner = MemoryVisitorStore::new();
        for id in ["A", "B", "C"] {
            inner.insert(&visitor(id, 1)).await.unwrap();
        }
        let store = Arc::new(FaultyStore {
            inner,
            fail_update: Some("B".into()),
            ..Default::default()
        });
        let (service, _, ctx) = setup(store.clone()).await;

        let report = service.evacuate(&ctx, EvacuationScope::All).await.unwrap();
        assert_eq!(report.evacuated, 2);
        assert_eq!(report.failed, 1);
        let failed = report
            .outcomes
            .iter()
            .find(|o| o.status == OutcomeStatus::Failed)
            .unwrap();
        assert_eq!(failed.visitor_id, "B");
        assert!(failed.reason.as_deref().unwrap().contains("connection reset"));

        let a = store.find_by_id("A").await.unwrap().unwrap();
        let b = store.find_by_id("B").await.unwrap().unwrap();
        assert_eq!(a.status, VisitorStatus::Evacuated);
        assert_eq!(b.status, VisitorStatus::CheckedIn);
    }

    #[tokio::test]
    async fn check_out_during_evacuation_is_kept() {
        let inner = MemoryVisitorStore::new();
        for id in ["A", "B"] {
            inner.insert(&visitor(id, 1)).await.unwrap();
        }
        let store = Arc::new(FaultyStore {
            inner,
            check_out_after_query: Some("B".into()),
            ..Default::default()
        });
        let (service, _, ctx) = setup(store.clone()).await;

        let report = service.evacuate(&ctx, EvacuationScope::All).await.unwrap();
        assert_eq!(report.evacuated, 1);
        assert_eq!(report.skipped, 1);
        let b = report.outcomes.iter().find(|o| o.visitor_id == "B").unwrap();
        assert_eq!(b.status, OutcomeStatus::Skipped);

        let stored = store.find_by_id("B").await.unwrap().unwrap();
        assert_eq!(stored.status, VisitorStatus::CheckedOut);
        assert!(stored.check_out_time.is_some());
        assert!(stored.evacuated_at.is_none());
    }

    #[tokio::test]
    async fn failed_lookup_is_reported_and_others_still_evacuate() {
        let inner = MemoryVisitorStore::new();
        inner.insert(&visitor("A", 1)).await.unwrap();
        let store = Arc::new(FaultyStore {
            inner,
            fail_lookup: Some("VIS-BAD".into()),
            ..Default::default()
        });
        let (service, _, ctx) = setup(store.clone()).await;

        let report = service
            .evacuate(
                &ctx,
                EvacuationScope::Visitors(vec!["A".into(), "VIS-BAD".into()]),
            )
            .await
            .unwrap();
        assert_eq!(report.evacuated, 1);
        assert_eq!(report.failed, 1);
        let bad = report
            .outcomes
            .iter()
            .find(|o| o.visitor_id == "VIS-BAD")
            .unwrap();
        assert_eq!(bad.status, OutcomeStatus::Failed);
        assert!(bad.reason.as_deref().unwrap().contains("statement timeout"));

        let a = store.inner.find_by_id("A").await.unwrap().unwrap();
        assert_eq!(a.status, VisitorStatus::Evacuated);
    }

    #[tokio::test]
    async fn selected_scope_skips_unknown_and_departed() {
        let store = Arc::new(MemoryVisitorStore::new());
        store.insert(&visitor("A", 1)).await.unwrap();
        let mut gone = visitor("B", 1);
        gone.mark_checked_out(None, Utc::now()).unwrap();
        store.insert(&gone).await.unwrap();
        let (service, _, ctx) = setup(store).await;

        let report = service
            .evacuate(
                &ctx,
                EvacuationScope::Visitors(vec!["A".into(), "A".into(), "B".into(), "Z".into()]),
            )
            .await
            .unwrap();
        assert_eq!(report.evacuated, 1);
        assert_eq!(report.skipped, 2);
        assert_eq!(report.outcomes.len(), 3);
    }

    #[tokio::test]
    async fn empty_selection_is_rejected() {
        let (service, _, ctx) = setup(Arc::new(MemoryVisitorStore::new())).await;
        let err = service
            .evacuate(&ctx, EvacuationScope::Visitors(vec![]))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[test]
    fn scope_serializes_with_tag() {
        let json = serde_json::to_value(EvacuationScope::Visitors(vec!["V1".into()])).unwrap();
        assert_eq!(json["scope"], "visitors");
        assert_eq!(json["visitor_ids"][0], "V1");
        let all: EvacuationScope = serde_json::from_str(r#"{"scope":"all"}"#).unwrap();
        assert_eq!(all, EvacuationScope::All);
    }
}
