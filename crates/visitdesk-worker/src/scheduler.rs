//! Cron scheduler for periodic tasks.

use std::sync::Arc;

use tokio_cron_scheduler::{Job as CronJob, JobScheduler};

use visitdesk_core::config::worker::WorkerConfig;
use visitdesk_core::error::AppError;
use visitdesk_service::BackupService;

use crate::executor::{ScheduledTask, run_logged};
use crate::jobs::BackupTask;

/// Cron-based scheduler running the automatic backup
pub struct BackupScheduler {
    /// The underlying job scheduler
    scheduler: JobScheduler,
    /// Cron expression of the backup job
    cron: String,
}

impl std::fmt::Debug for BackupScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackupScheduler")
            .field("cron", &self.cron)
            .finish()
    }
}

impl BackupScheduler {
    /// Create a scheduler with the backup job registered on
    /// `config.backup_cron`. The scheduler is not started.
    pub async fn new(config: &WorkerConfig, backup: BackupService) -> Result<Self, AppError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::internal(format!("Failed to create scheduler: {}", e)))?;

        let this = Self {
            scheduler,
            cron: config.backup_cron.clone(),
        };
        this.schedule(&config.backup_cron, Arc::new(BackupTask::new(backup)))
            .await?;
        Ok(this)
    }

    /// Cron expression of the backup job.
    pub fn cron(&self) -> &str {
        &self.cron
    }

    /// Register `task` on a six-field cron expression (seconds first)
    pub async fn schedule(&self, cron: &str, task: Arc<dyn ScheduledTask>) -> Result<(), AppError> {
        let name = task.name().to_string();
        let job = CronJob::new_async(cron, move |_uuid, _lock| {
            let task = Arc::clone(&task);
            Box::pin(async move {
                run_logged(task.as_ref()).await;
            })
        })
        .map_err(|e| {
            AppError::configuration(format!("Invalid cron expression '{}' for {}: {}", cron, name, e))
        })?;

        self.scheduler
            .add(job)
            .await
            .map_err(|e| AppError::internal(format!("Failed to add {} schedule: {}", name, e)))?;

        tracing::info!("Registered: {} ({})", name, cron);
        Ok(())
    }

    /// Start the scheduler
    pub async fn start(&self) -> Result<(), AppError> {
        self.scheduler
            .start()
            .await
            .map_err(|e| AppError::internal(format!("Failed to start scheduler: {}", e)))?;

        tracing::info!("Cron scheduler started");
        Ok(())
    }

    /// Shutdown the scheduler
    pub async fn shutdown(&mut self) -> Result<(), AppError> {
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::internal(format!("Failed to shutdown scheduler: {}", e)))?;

        tracing::info!("Cron scheduler shut down");
        Ok(())
    }
}
