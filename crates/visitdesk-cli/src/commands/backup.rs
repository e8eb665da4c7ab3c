//! Backup commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use visitdesk_core::config::AppConfig;
use visitdesk_core::error::AppError;
use visitdesk_service::{BackupReport, RequestContext};

use crate::output::{self, OutputFormat};

/// Arguments for backup commands
#[derive(Debug, Args)]
pub struct BackupArgs {
    /// Backup subcommand
    #[command(subcommand)]
    pub command: BackupCommand,
}

/// Backup subcommands
#[derive(Debug, Subcommand)]
pub enum BackupCommand {
    /// Run a backup now
    Run,
    /// Show the last backup and destination health
    Status,
}

#[derive(Debug, Serialize, Tabled)]
struct DestinationRow {
    destination: String,
    provider: String,
    ok: bool,
    error: String,
}

/// Execute backup commands
pub async fn execute(
    args: &BackupArgs,
    config: AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let state = super::open_state(config).await?;
    let ctx = RequestContext::system();

    match &args.command {
        BackupCommand::Run => {
            let report = state.backup_service.run(&ctx).await?;
            print_report(&report, format);
            if !report.success {
                return Err(AppError::storage("One or more backup destinations failed"));
            }
        }
        BackupCommand::Status => {
            let status = state.backup_service.status(&ctx).await?;
            if format == OutputFormat::Json {
                output::print_item(&status, format);
                return Ok(());
            }
            match &status.last_backup {
                Some(report) => print_report(report, format),
                None => output::print_warning("No backup has run yet."),
            }
            for (name, healthy) in &status.destinations {
                output::print_kv(name, if *healthy { "healthy" } else { "failing" });
            }
            if let Some(drive) = &status.drive {
                output::print_kv(
                    "drive connected",
                    if drive.connected { "yes" } else { "no" },
                );
            }
        }
    }

    Ok(())
}

fn print_report(report: &BackupReport, format: OutputFormat) {
    if format == OutputFormat::Json {
        output::print_item(report, format);
        return;
    }
    output::print_kv("backup", &report.id.to_string());
    output::print_kv("trigger", &report.trigger.to_string());
    output::print_kv(
        "completed",
        &report.completed_at.format("%Y-%m-%d %H:%M:%S").to_string(),
    );
    for artifact in &report.artifacts {
        output::print_kv(&artifact.name, &format!("{} bytes", artifact.bytes));
    }
    let rows: Vec<DestinationRow> = report
        .destinations
        .iter()
        .map(|d| DestinationRow {
            destination: d.name.clone(),
            provider: d.provider.clone(),
            ok: d.ok,
            error: output::or_dash(d.error.as_deref()),
        })
        .collect();
    output::print_list(&rows, format);
}
