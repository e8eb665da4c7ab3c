//! VisitDesk Server: visitor check-in and evacuation for care facilities.
//!
//! Main entry point that wires all crates together and starts the server.

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{EnvFilter, fmt};

use visitdesk_api::AppState;
use visitdesk_core::config::AppConfig;
use visitdesk_core::error::AppError;
use visitdesk_database::Stores;
use visitdesk_storage::SettingsStore;
use visitdesk_worker::BackupScheduler;

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Load `config/default.toml`, the `VISITDESK_ENV` overlay, and environment overrides.
fn load_configuration() -> Result<AppConfig, AppError> {
    let dir = std::env::var("VISITDESK_CONFIG_DIR").unwrap_or_else(|_| "config".to_string());
    let env = std::env::var("VISITDESK_ENV").unwrap_or_else(|_| "development".to_string());
    AppConfig::load_from(&dir, &env)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!(
        "Starting VisitDesk v{} for {}",
        env!("CARGO_PKG_VERSION"),
        config.facility.name
    );

    // ── Step 1: Data directories ─────────────────────────────────
    let backup_dir = config.storage.backup_path();
    tokio::fs::create_dir_all(&backup_dir).await.map_err(|e| {
        AppError::storage(format!(
            "Failed to create dir '{}': {}",
            backup_dir.display(),
            e
        ))
    })?;

    // ── Step 2: Stores (migrations run on connect when enabled) ──
    tracing::info!(backend = ?config.database.backend, "Opening stores...");
    let stores = Stores::connect(&config.database).await?;

    // ── Step 3: Settings ─────────────────────────────────────────
    let settings = Arc::new(SettingsStore::open(config.storage.settings_path()).await?);

    // ── Step 4: Services ─────────────────────────────────────────
    let worker_config = config.worker.clone();
    let grace = Duration::from_secs(config.server.shutdown_grace_seconds);
    let state = AppState::build(config, stores, settings).await?;

    // ── Step 5: Backup scheduler ─────────────────────────────────
    let mut scheduler = if worker_config.enabled {
        let scheduler =
            BackupScheduler::new(&worker_config, state.backup_service.clone()).await?;
        scheduler.start().await?;
        tracing::info!(cron = scheduler.cron(), "Backup scheduler started");
        Some(scheduler)
    } else {
        tracing::info!("Backup scheduler disabled");
        None
    };

    // ── Step 6: HTTP server with graceful shutdown ───────────────
    let served = visitdesk_api::run_server(state, visitdesk_api::shutdown_signal()).await;

    // ── Step 7: Wait for background tasks ───────────────────────
    if let Some(scheduler) = scheduler.as_mut() {
        tracing::info!("Stopping backup scheduler...");
        match tokio::time::timeout(grace, scheduler.shutdown()).await {
            Ok(result) => result?,
            Err(_) => tracing::warn!("Backup scheduler did not stop within {:?}", grace),
        }
    }

    served?;
    tracing::info!("VisitDesk server shut down gracefully");
    Ok(())
}
