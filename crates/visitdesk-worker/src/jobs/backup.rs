//! Periodic snapshot backup.

use async_trait::async_trait;
use serde_json::{Value, json};

use visitdesk_service::BackupService;

use crate::executor::{JobExecutionError, ScheduledTask};

/// Runs [`BackupService::run_scheduled`].
#[derive(Debug, Clone)]
pub struct BackupTask {
    service: BackupService,
}

impl BackupTask {
    /// Create a new backup task
    pub fn new(service: BackupService) -> Self {
        Self { service }
    }
}

#[async_trait]
impl ScheduledTask for BackupTask {
    fn name(&self) -> &str {
        "backup"
    }

    async fn execute(&self) -> Result<Option<Value>, JobExecutionError> {
        let report = self.service.run_scheduled().await?;

        if !report.success {
            let failed: Vec<String> = report
                .destinations
                .iter()
                .filter(|d| !d.ok)
                .map(|d| format!("{}: {}", d.name, d.error.as_deref().unwrap_or("unknown")))
                .collect();
            return Err(JobExecutionError::Transient(failed.join("; ")));
        }

        Ok(Some(json!({
            "backup_id": report.id,
            "files": report.artifacts.len(),
            "destinations": report.destinations.len(),
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use visitdesk_auth::rbac::RbacEnforcer;
    use visitdesk_core::config::storage::StorageConfig;
    use visitdesk_database::AuditStore;
    use visitdesk_database::memory::{MemoryAuditStore, MemoryUserStore, MemoryVisitorStore};
    use visitdesk_service::AuditService;
    use visitdesk_storage::SettingsStore;

    async fn service(dir: &tempfile::TempDir) -> BackupService {
        let config = StorageConfig {
            data_root: dir.path().to_string_lossy().into_owned(),
            ..Default::default()
        };
        let audit_log: Arc<dyn AuditStore> = Arc::new(MemoryAuditStore::new());
        let settings = Arc::new(SettingsStore::open(config.settings_path()).await.unwrap());
        BackupService::new(
            &config,
            Arc::new(MemoryVisitorStore::new()),
            Arc::new(MemoryUserStore::new()),
            audit_log.clone(),
            AuditService::new(audit_log, RbacEnforcer::new()),
            RbacEnforcer::new(),
            settings,
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn backup_task_writes_to_local_storage() {
        let dir = tempfile::tempdir().unwrap();
        let task = BackupTask::new(service(&dir).await);

        let summary = task.execute().await.unwrap().unwrap();
        assert_eq!(summary["files"], 2);
        assert_eq!(summary["destinations"], 1);

        let written = std::fs::read_dir(dir.path().join("backups")).unwrap().count();
        assert_eq!(written, 2);
    }
}
