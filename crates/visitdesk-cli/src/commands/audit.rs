//! Audit log CLI commands.

use chrono::NaiveDate;
use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;
use uuid::Uuid;

use visitdesk_core::config::AppConfig;
use visitdesk_core::error::AppError;
use visitdesk_core::types::{DateRange, PageRequest};
use visitdesk_entity::audit::AuditSearch;
use visitdesk_service::RequestContext;

use crate::output::{self, OutputFormat};

/// Arguments for audit commands
#[derive(Debug, Args)]
pub struct AuditArgs {
    /// Audit subcommand
    #[command(subcommand)]
    pub command: AuditCommand,
}

/// Audit subcommands
#[derive(Debug, Subcommand)]
pub enum AuditCommand {
    /// Search the audit log
    Search {
        /// Filter by action (prefix match, e.g. "visitor.")
        #[arg(short, long)]
        action: Option<String>,
        /// Filter by actor (user ID)
        #[arg(long)]
        actor: Option<String>,
        /// First day included (YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Last day included (YYYY-MM-DD)
        #[arg(long)]
        to: Option<NaiveDate>,
        /// Number of results
        #[arg(short, long, default_value = "50")]
        limit: u64,
    },
}

#[derive(Debug, Serialize, Tabled)]
struct AuditRow {
    time: String,
    actor: String,
    action: String,
    target: String,
    ip: String,
}

/// Execute audit commands
pub async fn execute(
    args: &AuditArgs,
    config: AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let state = super::open_state(config).await?;

    match &args.command {
        AuditCommand::Search {
            action,
            actor,
            from,
            to,
            limit,
        } => {
            let actor_id = actor
                .as_deref()
                .map(|a| {
                    Uuid::parse_str(a)
                        .map_err(|_| AppError::validation(format!("Invalid actor ID '{}'", a)))
                })
                .transpose()?;
            let range = match (from, to) {
                (None, None) => None,
                (f, t) => Some(DateRange::from_optional(*f, *t)?),
            };
            let search = AuditSearch {
                action: action.clone(),
                actor_id,
                range,
                ..Default::default()
            };

            let page = state
                .audit_service
                .search(&RequestContext::system(), &search, &PageRequest::new(1, *limit))
                .await?;

            let rows: Vec<AuditRow> = page
                .items
                .iter()
                .map(|e| AuditRow {
                    time: e.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
                    actor: output::or_dash(e.actor_name.as_deref()),
                    action: e.action.clone(),
                    target: match &e.target_id {
                        Some(id) => format!("{}:{}", e.target_type, id),
                        None => e.target_type.clone(),
                    },
                    ip: output::or_dash(e.ip_address.as_deref()),
                })
                .collect();

            output::print_list(&rows, format);
        }
    }

    Ok(())
}
