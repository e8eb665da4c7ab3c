//! Database migration commands.

use clap::{Args, Subcommand};

use visitdesk_core::config::AppConfig;
use visitdesk_core::config::database::DatabaseBackend;
use visitdesk_core::error::AppError;
use visitdesk_database::DatabasePool;

use crate::output;

/// Arguments for the migrate command
#[derive(Debug, Args)]
pub struct MigrateArgs {
    /// Migration subcommand
    #[command(subcommand)]
    pub command: MigrateCommand,
}

/// Migration subcommands
#[derive(Debug, Subcommand)]
pub enum MigrateCommand {
    /// Apply all pending migrations
    Run,
}

/// Execute migration commands
pub async fn execute(args: &MigrateArgs, config: &AppConfig) -> Result<(), AppError> {
    match &args.command {
        MigrateCommand::Run => {
            if config.database.backend == DatabaseBackend::Memory {
                output::print_warning("Database backend is 'memory'; nothing to migrate.");
                return Ok(());
            }

            let mut db_config = config.database.clone();
            db_config.run_migrations = false;
            let db = DatabasePool::connect(&db_config).await?;

            println!("Running database migrations...");
            visitdesk_database::migration::run_migrations(db.pool()).await?;
            db.close().await;
            output::print_success("All migrations applied successfully.");
        }
    }
    Ok(())
}
