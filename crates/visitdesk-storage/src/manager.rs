//! Registry of backup destinations keyed by name.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{info, warn};

use visitdesk_core::error::AppError;
use visitdesk_core::result::AppResult;
use visitdesk_core::traits::storage::StorageProvider;

/// Name the local backup directory is registered under.
pub const LOCAL: &str = "local";
/// Name the cloud drive is registered under.
pub const DRIVE: &str = "drive";

/// Holds every backup destination that a backup run writes to.
#[derive(Debug, Clone, Default)]
pub struct StorageManager {
    providers: Arc<RwLock<BTreeMap<String, Arc<dyn StorageProvider>>>>,
}

impl StorageManager {
    /// Create an empty manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a destination.
    pub async fn register(&self, name: &str, provider: Arc<dyn StorageProvider>) {
        info!(name, provider = provider.provider_type(), "Registered backup destination");
        self.providers.write().await.insert(name.to_string(), provider);
    }

    /// Remove a destination. Returns whether it was registered.
    pub async fn unregister(&self, name: &str) -> bool {
        self.providers.write().await.remove(name).is_some()
    }

    /// Look up a destination.
    pub async fn get(&self, name: &str) -> AppResult<Arc<dyn StorageProvider>> {
        self.providers
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("Backup destination '{name}' not registered")))
    }

    /// Whether `name` is registered.
    pub async fn contains(&self, name: &str) -> bool {
        self.providers.read().await.contains_key(name)
    }

    /// All destinations in name order.
    pub async fn all(&self) -> Vec<(String, Arc<dyn StorageProvider>)> {
        self.providers
            .read()
            .await
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Health of every destination. Errors count as unhealthy.
    pub async fn health_check_all(&self) -> BTreeMap<String, bool> {
        let mut results = BTreeMap::new();
        for (name, provider) in self.all().await {
            let healthy = match provider.health_check().await {
                Ok(h) => h,
                Err(e) => {
                    warn!(name, error = %e, "Backup destination health check failed");
                    false
                }
            };
            results.insert(name, healthy);
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::LocalStorageProvider;

    #[tokio::test]
    async fn register_lookup_unregister() {
        let dir = tempfile::tempdir().unwrap();
        let manager = StorageManager::new();
        let local = LocalStorageProvider::new(dir.path()).await.unwrap();
        manager.register(LOCAL, Arc::new(local)).await;

        assert!(manager.contains(LOCAL).await);
        assert_eq!(manager.get(LOCAL).await.unwrap().provider_type(), "local");
        assert!(manager.get(DRIVE).await.is_err());
        assert_eq!(manager.health_check_all().await.get(LOCAL), Some(&true));

        assert!(manager.unregister(LOCAL).await);
        assert!(!manager.unregister(LOCAL).await);
        assert!(manager.all().await.is_empty());
    }
}
