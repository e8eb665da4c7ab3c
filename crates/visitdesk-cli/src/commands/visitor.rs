//! Front-desk visitor commands.

use chrono::{NaiveDate, Utc};
use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use visitdesk_core::config::AppConfig;
use visitdesk_core::error::{AppError, ErrorKind};
use visitdesk_core::types::{DateRange, PageRequest};
use visitdesk_entity::visitor::{Visitor, VisitorFilter, VisitorStatus};
use visitdesk_service::RequestContext;

use crate::output::{self, OutputFormat};

/// Arguments for visitor commands
#[derive(Debug, Args)]
pub struct VisitorArgs {
    /// Visitor subcommand
    #[command(subcommand)]
    pub command: VisitorCommand,
}

/// Visitor subcommands
#[derive(Debug, Subcommand)]
pub enum VisitorCommand {
    /// Everyone currently on site
    Active,
    /// Check a visitor out by ID, badge number, or QR payload
    Checkout {
        /// Visitor ID or scanned code
        code: String,
    },
    /// Search the visitor log
    History {
        /// First check-in day (YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Last check-in day (YYYY-MM-DD)
        #[arg(long)]
        to: Option<NaiveDate>,
        /// checked_in, checked_out or evacuated
        #[arg(short, long)]
        status: Option<String>,
        /// Free-text search
        #[arg(short = 'q', long)]
        search: Option<String>,
        /// Maximum rows to show
        #[arg(short, long, default_value = "50")]
        limit: u64,
    },
}

#[derive(Debug, Serialize, Tabled)]
struct VisitorRow {
    id: String,
    name: String,
    badge: String,
    resident: String,
    status: String,
    checked_in: String,
    checked_out: String,
}

impl From<&Visitor> for VisitorRow {
    fn from(v: &Visitor) -> Self {
        Self {
            id: v.id.clone(),
            name: v.full_name(),
            badge: v.badge_number.clone(),
            resident: output::or_dash(v.resident_name.as_deref()),
            status: v.status.to_string(),
            checked_in: v.check_in_time.format("%Y-%m-%d %H:%M").to_string(),
            checked_out: v
                .ended_at()
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "-".to_string()),
        }
    }
}

/// Execute visitor commands
pub async fn execute(
    args: &VisitorArgs,
    config: AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let max_hours = config.facility.max_visit_hours;
    let state = super::open_state(config).await?;
    let ctx = RequestContext::system();

    match &args.command {
        VisitorCommand::Active => {
            let visitors = state.visitor_service.active_visitors(&ctx).await?;
            let now = Utc::now();
            let overdue = visitors
                .iter()
                .filter(|v| v.is_overdue(now, max_hours))
                .count();
            let rows: Vec<VisitorRow> = visitors.iter().map(VisitorRow::from).collect();
            output::print_list(&rows, format);
            if overdue > 0 && format == OutputFormat::Table {
                output::print_warning(&format!(
                    "{} visitor(s) on site longer than {} hours",
                    overdue, max_hours
                ));
            }
        }
        VisitorCommand::Checkout { code } => {
            let visitor = match state.visitor_service.check_out(&ctx, code).await {
                Err(e) if e.kind == ErrorKind::NotFound => {
                    state.visitor_service.check_out_by_code(&ctx, code).await?
                }
                other => other?,
            };
            output::print_success(&format!(
                "{} ({}) checked out",
                visitor.full_name(),
                visitor.id
            ));
        }
        VisitorCommand::History {
            from,
            to,
            status,
            search,
            limit,
        } => {
            let range = match (from, to) {
                (None, None) => None,
                (f, t) => Some(DateRange::from_optional(*f, *t)?),
            };
            let filter = VisitorFilter {
                status: status
                    .as_deref()
                    .map(str::parse::<VisitorStatus>)
                    .transpose()?,
                range,
                search: search.clone(),
            };
            let page = state
                .visitor_service
                .search(&ctx, &filter, &PageRequest::new(1, *limit))
                .await?;
            let rows: Vec<VisitorRow> = page.items.iter().map(VisitorRow::from).collect();
            output::print_list(&rows, format);
            if format == OutputFormat::Table && page.total_items > page.items.len() as u64 {
                println!("Showing {} of {} visitors", page.items.len(), page.total_items);
            }
        }
    }

    Ok(())
}
