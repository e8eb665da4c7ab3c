//! Visitor and audit exports.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use visitdesk_auth::rbac::RbacEnforcer;
use visitdesk_auth::rbac::policies::SystemPermission;
use visitdesk_core::error::AppError;
use visitdesk_core::types::DateRange;
use visitdesk_database::VisitorStore;
use visitdesk_entity::audit::{AuditSearch, action};
use visitdesk_entity::visitor::VisitorFilter;

use crate::audit::AuditService;
use crate::context::RequestContext;
use crate::export::encode::{audit_csv, visitors_csv};
use crate::visitor::query::query_with_fallback;

/// Output encoding of an export.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Comma-separated values with a header row.
    #[default]
    Csv,
    /// Pretty-printed JSON array.
    Json,
}

impl ExportFormat {
    /// File extension without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }

    /// HTTP content type.
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Csv => "text/csv; charset=utf-8",
            Self::Json => "application/json",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            other => Err(AppError::validation(format!(
                "Unsupported export format '{other}' (expected csv or json)"
            ))),
        }
    }
}

/// A generated export, ready to download or write to disk.
#[derive(Debug, Clone)]
pub struct ExportFile {
    /// Suggested file name.
    pub file_name: String,
    /// MIME type of `body`.
    pub content_type: &'static str,
    /// Encoded content.
    pub body: Bytes,
    /// Number of data rows.
    pub rows: usize,
}

/// Builds CSV and JSON exports of visitor history and the audit log.
#[derive(Debug, Clone)]
pub struct ExportService {
    visitors: Arc<dyn VisitorStore>,
    audit: AuditService,
    rbac: RbacEnforcer,
}

impl ExportService {
    /// Creates a new export service.
    pub fn new(visitors: Arc<dyn VisitorStore>, audit: AuditService, rbac: RbacEnforcer) -> Self {
        Self {
            visitors,
            audit,
            rbac,
        }
    }

    /// Visitors who checked in within `range`, newest first.
    pub async fn export_visitors(
        &self,
        ctx: &RequestContext,
        range: DateRange,
        format: ExportFormat,
    ) -> Result<ExportFile, AppError> {
        self.rbac
            .require_permission(&ctx.role, &SystemPermission::ExportData)?;

        let visitors =
            query_with_fallback(self.visitors.as_ref(), &VisitorFilter::in_range(range)).await?;
        let body = match format {
            ExportFormat::Csv => visitors_csv(&visitors, Utc::now())?,
            ExportFormat::Json => serde_json::to_vec_pretty(&visitors)?,
        };
        let file = ExportFile {
            file_name: file_name("visitors", range, format),
            content_type: format.content_type(),
            body: Bytes::from(body),
            rows: visitors.len(),
        };

        self.audit
            .record(
                ctx,
                action::EXPORT_VISITORS,
                action::target::EXPORT,
                None,
                json!({
                    "start": range.start,
                    "end": range.end,
                    "format": format,
                    "rows": file.rows,
                }),
            )
            .await;
        info!(user = %ctx.username, rows = file.rows, %format, "Visitor export generated");
        Ok(file)
    }

    /// Audit entries recorded within `range`, newest first.
    pub async fn export_audit(
        &self,
        ctx: &RequestContext,
        range: DateRange,
        format: ExportFormat,
    ) -> Result<ExportFile, AppError> {
        let search = AuditSearch {
            range: Some(range),
            ..Default::default()
        };
        let entries = self.audit.find_matching(ctx, &search).await?;
        let body = match format {
            ExportFormat::Csv => audit_csv(&entries)?,
            ExportFormat::Json => serde_json::to_vec_pretty(&entries)?,
        };
        let file = ExportFile {
            file_name: file_name("audit", range, format),
            content_type: format.content_type(),
            body: Bytes::from(body),
            rows: entries.len(),
        };

        self.audit
            .record(
                ctx,
                action::EXPORT_AUDIT,
                action::target::EXPORT,
                None,
                json!({
                    "start": range.start,
                    "end": range.end,
                    "format": format,
                    "rows": file.rows,
                }),
            )
            .await;
        info!(user = %ctx.username, rows = file.rows, %format, "Audit export generated");
        Ok(file)
    }
}

fn file_name(prefix: &str, range: DateRange, format: ExportFormat) -> String {
    format!(
        "{prefix}_{}_{}.{}",
        range.start.format("%Y-%m-%d"),
        range.end.format("%Y-%m-%d"),
        format.extension()
    )
}
