//! Start the VisitDesk server.

use std::time::Duration;

use clap::Args;

use visitdesk_core::config::AppConfig;
use visitdesk_core::error::AppError;
use visitdesk_worker::BackupScheduler;

use crate::output;

/// Arguments for the serve command
#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Override the server port
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Override the server host
    #[arg(long)]
    pub host: Option<String>,

    /// Do not start the backup scheduler
    #[arg(long)]
    pub no_worker: bool,
}

/// Execute the serve command
pub async fn execute(args: &ServeArgs, mut config: AppConfig) -> Result<(), AppError> {
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(ref host) = args.host {
        config.server.host = host.clone();
    }
    if args.no_worker {
        config.worker.enabled = false;
    }

    println!("Starting VisitDesk server...");
    println!("  Host: {}", config.server.host);
    println!("  Port: {}", config.server.port);

    let worker = config.worker.clone();
    let grace = Duration::from_secs(config.server.shutdown_grace_seconds);
    let state = super::open_state(config).await?;

    let mut scheduler = if worker.enabled {
        let scheduler = BackupScheduler::new(&worker, state.backup_service.clone()).await?;
        scheduler.start().await?;
        println!("  Backups: {}", scheduler.cron());
        Some(scheduler)
    } else {
        None
    };

    let result = visitdesk_api::run_server(state, visitdesk_api::shutdown_signal()).await;

    if let Some(scheduler) = scheduler.as_mut() {
        match tokio::time::timeout(grace, scheduler.shutdown()).await {
            Ok(stopped) => stopped?,
            Err(_) => output::print_warning("Backup scheduler did not stop in time"),
        }
    }
    result
}
