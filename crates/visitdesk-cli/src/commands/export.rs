//! Export commands writing CSV or JSON files to disk.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Subcommand};

use visitdesk_core::config::AppConfig;
use visitdesk_core::error::AppError;
use visitdesk_core::types::DateRange;
use visitdesk_service::{ExportFormat, RequestContext};

use crate::output;

/// Arguments for export commands
#[derive(Debug, Args)]
pub struct ExportArgs {
    /// What to export
    #[command(subcommand)]
    pub command: ExportCommand,

    /// First day included (YYYY-MM-DD, defaults to today)
    #[arg(long, global = true)]
    pub from: Option<NaiveDate>,

    /// Last day included (YYYY-MM-DD)
    #[arg(long, global = true)]
    pub to: Option<NaiveDate>,

    /// csv or json
    #[arg(long, global = true, default_value = "csv")]
    pub format: String,

    /// Output file or directory (defaults to the current directory)
    #[arg(short, long, global = true)]
    pub output: Option<PathBuf>,
}

/// Export subcommands
#[derive(Debug, Subcommand)]
pub enum ExportCommand {
    /// Visitor log
    Visitors,
    /// Audit log
    Audit,
}

/// Execute export commands
pub async fn execute(args: &ExportArgs, config: AppConfig) -> Result<(), AppError> {
    let range = DateRange::from_optional(args.from, args.to)?;
    let format: ExportFormat = args.format.parse()?;
    let state = super::open_state(config).await?;
    let ctx = RequestContext::system();

    let file = match args.command {
        ExportCommand::Visitors => {
            state
                .export_service
                .export_visitors(&ctx, range, format)
                .await?
        }
        ExportCommand::Audit => state.export_service.export_audit(&ctx, range, format).await?,
    };

    let path = match &args.output {
        Some(p) if p.is_dir() => p.join(&file.file_name),
        Some(p) => p.clone(),
        None => PathBuf::from(&file.file_name),
    };
    tokio::fs::write(&path, &file.body).await?;

    output::print_success(&format!(
        "Wrote {} row(s) to {}",
        file.rows,
        path.display()
    ));
    Ok(())
}
