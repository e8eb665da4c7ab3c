//! Scheduled task contract and error type.

use async_trait::async_trait;
use serde_json::Value;

use visitdesk_core::error::{AppError, ErrorKind};

/// A unit of work fired by the cron scheduler.
#[async_trait]
pub trait ScheduledTask: Send + Sync + std::fmt::Debug + 'static {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Run once, returning an optional summary for the log.
    async fn execute(&self) -> Result<Option<Value>, JobExecutionError>;
}

/// Error from task execution
#[derive(Debug, thiserror::Error)]
pub enum JobExecutionError {
    /// The run was skipped, e.g. because another run is in progress
    #[error("Job skipped: {0}")]
    Skipped(String),

    /// Transient failure; the next scheduled run may succeed
    #[error("Transient job failure: {0}")]
    Transient(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(AppError),
}

impl From<AppError> for JobExecutionError {
    fn from(err: AppError) -> Self {
        match err.kind {
            ErrorKind::Conflict => Self::Skipped(err.message),
            ErrorKind::ExternalService | ErrorKind::Storage | ErrorKind::ServiceUnavailable => {
                Self::Transient(err.message)
            }
            _ => Self::Internal(err),
        }
    }
}

/// Run `task` and log its outcome. Failures never propagate to the scheduler.
pub async fn run_logged(task: &dyn ScheduledTask) {
    tracing::debug!("Running scheduled task '{}'", task.name());
    match task.execute().await {
        Ok(summary) => tracing::info!(
            task = task.name(),
            summary = %summary.unwrap_or(serde_json::Value::Null),
            "Scheduled task finished"
        ),
        Err(JobExecutionError::Skipped(reason)) => {
            tracing::warn!(task = task.name(), %reason, "Scheduled task skipped")
        }
        Err(e) => tracing::error!(task = task.name(), error = %e, "Scheduled task failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_maps_to_skipped() {
        let err = JobExecutionError::from(AppError::conflict("busy"));
        assert!(matches!(err, JobExecutionError::Skipped(ref m) if m == "busy"));
    }

    #[test]
    fn external_failures_are_transient() {
        let err = JobExecutionError::from(AppError::external("drive down"));
        assert!(matches!(err, JobExecutionError::Transient(_)));
        let err = JobExecutionError::from(AppError::database("gone"));
        assert!(matches!(err, JobExecutionError::Internal(_)));
    }
}
