//! Background worker configuration.

use serde::{Deserialize, Serialize};

/// Scheduled job configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Whether the scheduler is started with the server.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Cron expression (with seconds) for the automatic backup.
    #[serde(default = "default_backup_cron")]
    pub backup_cron: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            backup_cron: default_backup_cron(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_backup_cron() -> String {
    "0 0 2 * * *".to_string()
}
