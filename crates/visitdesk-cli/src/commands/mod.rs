//! CLI command definitions and dispatch.

pub mod admin;
pub mod audit;
pub mod backup;
pub mod export;
pub mod migrate;
pub mod serve;
pub mod user;
pub mod visitor;

use std::sync::Arc;

use clap::{Parser, Subcommand};

use visitdesk_api::AppState;
use visitdesk_core::config::AppConfig;
use visitdesk_core::config::database::DatabaseBackend;
use visitdesk_core::error::AppError;
use visitdesk_database::Stores;
use visitdesk_storage::SettingsStore;

use crate::output::{self, OutputFormat};

/// VisitDesk: visitor check-in and evacuation for care facilities
#[derive(Debug, Parser)]
#[command(name = "visitdesk", version, about, long_about = None)]
pub struct Cli {
    /// Directory holding default.toml and environment overlays
    #[arg(short, long, default_value = "config")]
    pub config: String,

    /// Environment overlay to apply (e.g. `production`)
    #[arg(short, long, default_value = "development")]
    pub env: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Start the HTTP server and backup scheduler
    Serve(serve::ServeArgs),
    /// Database migration management
    Migrate(migrate::MigrateArgs),
    /// Administrator accounts
    Admin(admin::AdminArgs),
    /// Staff accounts
    User(user::UserArgs),
    /// Visitors on site and visit history
    Visitor(visitor::VisitorArgs),
    /// CSV/JSON exports
    Export(export::ExportArgs),
    /// Backups
    Backup(backup::BackupArgs),
    /// Audit log
    Audit(audit::AuditArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> Result<(), AppError> {
        let config = AppConfig::load_from(&self.config, &self.env)?;
        match &self.command {
            Commands::Serve(args) => serve::execute(args, config).await,
            Commands::Migrate(args) => migrate::execute(args, &config).await,
            Commands::Admin(args) => admin::execute(args, config, self.format).await,
            Commands::User(args) => user::execute(args, config, self.format).await,
            Commands::Visitor(args) => visitor::execute(args, config, self.format).await,
            Commands::Export(args) => export::execute(args, config).await,
            Commands::Backup(args) => backup::execute(args, config, self.format).await,
            Commands::Audit(args) => audit::execute(args, config, self.format).await,
        }
    }
}

/// Open the configured stores and wire every service.
pub async fn open_state(config: AppConfig) -> Result<AppState, AppError> {
    if config.database.backend == DatabaseBackend::Memory {
        output::print_warning("Database backend is 'memory'; nothing is persisted");
    }
    let stores = Stores::connect(&config.database).await?;
    let settings = Arc::new(SettingsStore::open(config.storage.settings_path()).await?);
    AppState::build(config, stores, settings).await
}

/// Wrap a dialoguer failure.
pub fn input_error(e: dialoguer::Error) -> AppError {
    AppError::internal(format!("Input error: {}", e))
}
