//! Dashboard statistics and visit summaries.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use visitdesk_auth::rbac::RbacEnforcer;
use visitdesk_auth::rbac::policies::SystemPermission;
use visitdesk_core::config::facility::FacilityConfig;
use visitdesk_core::error::AppError;
use visitdesk_core::types::DateRange;
use visitdesk_database::VisitorStore;
use visitdesk_entity::visitor::{Visitor, VisitorFilter, VisitorStatus};

use crate::context::RequestContext;
use crate::visitor::query::query_with_fallback;

/// Front-desk dashboard figures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardStats {
    /// When the figures were computed.
    pub generated_at: DateTime<Utc>,
    /// Visitors currently on site.
    pub on_site_now: usize,
    /// Check-ins today.
    pub checked_in_today: usize,
    /// Check-outs today.
    pub checked_out_today: usize,
    /// Visitors evacuated today.
    pub evacuated_today: usize,
    /// On-site visitors past the maximum visit length.
    pub overdue_now: usize,
    /// Mean length of visits completed today, in minutes.
    pub average_visit_minutes: Option<f64>,
    /// Today's check-ins by visitor type.
    pub by_type: BTreeMap<String, usize>,
}

/// Aggregates over a date range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisitSummary {
    /// The inclusive range covered.
    pub range: DateRange,
    /// Number of visits that started in the range.
    pub total_visits: usize,
    /// Distinct people, by name and phone.
    pub unique_visitors: usize,
    /// Visits by type.
    pub by_type: BTreeMap<String, usize>,
    /// Visits by current status.
    pub by_status: BTreeMap<String, usize>,
    /// Visits per day, every day of the range included.
    pub by_day: BTreeMap<NaiveDate, usize>,
    /// Mean length of completed visits, in minutes.
    pub average_visit_minutes: Option<f64>,
    /// Visits admitted with a failed screening.
    pub screening_failures: usize,
}

/// Computes dashboard and summary reports.
#[derive(Debug, Clone)]
pub struct ReportService {
    visitors: Arc<dyn VisitorStore>,
    rbac: RbacEnforcer,
    facility: FacilityConfig,
}

impl ReportService {
    /// Creates a new report service.
    pub fn new(visitors: Arc<dyn VisitorStore>, rbac: RbacEnforcer, facility: FacilityConfig) -> Self {
        Self {
            visitors,
            rbac,
            facility,
        }
    }

    /// Today's dashboard.
    pub async fn dashboard(&self, ctx: &RequestContext) -> Result<DashboardStats, AppError> {
        self.rbac
            .require_permission(&ctx.role, &SystemPermission::ReportView)?;

        let now = Utc::now();
        let today = DateRange::single_day(now.date_naive());
        let store = self.visitors.as_ref();

        let on_site = query_with_fallback(store, &VisitorFilter::on_site()).await?;
        let arrived_today = query_with_fallback(store, &VisitorFilter::in_range(today)).await?;
        let left_today: Vec<Visitor> = store
            .find_by_status(VisitorStatus::CheckedOut)
            .await?
            .into_iter()
            .filter(|v| v.check_out_time.is_some_and(|t| today.contains(t)))
            .collect();
        let evacuated_today = store
            .find_by_status(VisitorStatus::Evacuated)
            .await?
            .iter()
            .filter(|v| v.evacuated_at.is_some_and(|t| today.contains(t)))
            .count();

        Ok(DashboardStats {
            generated_at: now,
            on_site_now: on_site.len(),
            checked_in_today: arrived_today.len(),
            checked_out_today: left_today.len(),
            evacuated_today,
            overdue_now: on_site
                .iter()
                .filter(|v| v.is_overdue(now, self.facility.max_visit_hours))
                .count(),
            average_visit_minutes: average_minutes(&left_today, now),
            by_type: count_by(&arrived_today, |v| v.visitor_type.to_string()),
        })
    }

    /// Aggregates for visits that started within `range`.
    pub async fn summary(
        &self,
        ctx: &RequestContext,
        range: DateRange,
    ) -> Result<VisitSummary, AppError> {
        self.rbac
            .require_permission(&ctx.role, &SystemPermission::ReportView)?;
        if range.days() > self.facility.max_report_days {
            return Err(AppError::validation(format!(
                "Report range {range} spans {} days; the limit is {}",
                range.days(),
                self.facility.max_report_days
            )));
        }

        let now = Utc::now();
        let visits =
            query_with_fallback(self.visitors.as_ref(), &VisitorFilter::in_range(range)).await?;

        let mut by_day: BTreeMap<NaiveDate, usize> = range
            .start
            .iter_days()
            .take_while(|d| *d <= range.end)
            .map(|d| (d, 0))
            .collect();
        for v in &visits {
            *by_day.entry(v.check_in_time.date_naive()).or_insert(0) += 1;
        }

        let unique_visitors = visits
            .iter()
            .map(|v| {
                (
                    v.full_name().to_lowercase(),
                    v.phone.as_deref().unwrap_or_default().replace([' ', '-'], ""),
                )
            })
            .collect::<HashSet<_>>()
            .len();
        let completed: Vec<Visitor> = visits.iter().filter(|v| !v.is_on_site()).cloned().collect();

        Ok(VisitSummary {
            range,
            total_visits: visits.len(),
            unique_visitors,
            by_type: count_by(&visits, |v| v.visitor_type.to_string()),
            by_status: count_by(&visits, |v| v.status.to_string()),
            by_day,
            average_visit_minutes: average_minutes(&completed, now),
            screening_failures: visits
                .iter()
                .filter(|v| v.health_screening.is_screened() && !v.health_screening.passed)
                .count(),
        })
    }
}

fn count_by(visitors: &[Visitor], key: impl Fn(&Visitor) -> String) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for v in visitors {
        *counts.entry(key(v)).or_insert(0) += 1;
    }
    counts
}

fn average_minutes(visitors: &[Visitor], now: DateTime<Utc>) -> Option<f64> {
    if visitors.is_empty() {
        return None;
    }
    let total: i64 = visitors
        .iter()
        .map(|v| v.visit_duration(now).num_minutes())
        .sum();
    let avg = total as f64 / visitors.len() as f64;
    Some((avg * 10.0).round() / 10.0)
}
