//! Backend selection: one bundle of store handles shared by every service.

use std::sync::Arc;

use tracing::info;

use visitdesk_core::config::database::{DatabaseBackend, DatabaseConfig};
use visitdesk_core::result::AppResult;

use crate::connection::DatabasePool;
use crate::memory::{MemoryAuditStore, MemoryUserStore, MemoryVisitorStore};
use crate::repositories::{AuditLogRepository, UserRepository, VisitorRepository};
use crate::store::{AuditStore, UserStore, VisitorStore};

/// Handles to the visitor, user, and audit stores.
#[derive(Debug, Clone)]
pub struct Stores {
    /// Visitor records.
    pub visitors: Arc<dyn VisitorStore>,
    /// Staff accounts.
    pub users: Arc<dyn UserStore>,
    /// Audit log.
    pub audit: Arc<dyn AuditStore>,
    /// The PostgreSQL pool, when that backend is in use.
    pub pool: Option<DatabasePool>,
}

impl Stores {
    /// Fresh in-memory stores.
    pub fn memory() -> Self {
        Self::memory_with(MemoryVisitorStore::new())
    }

    /// In-memory stores around a caller-built visitor store.
    pub fn memory_with(visitors: MemoryVisitorStore) -> Self {
        Self {
            visitors: Arc::new(visitors),
            users: Arc::new(MemoryUserStore::new()),
            audit: Arc::new(MemoryAuditStore::new()),
            pool: None,
        }
    }

    /// PostgreSQL repositories over an open pool.
    pub async fn postgres(db: DatabasePool) -> AppResult<Self> {
        let pool = db.pool().clone();
        let visitors = VisitorRepository::new(pool.clone());
        visitors.detect_composite_index().await?;
        Ok(Self {
            visitors: Arc::new(visitors),
            users: Arc::new(UserRepository::new(pool.clone())),
            audit: Arc::new(AuditLogRepository::new(pool)),
            pool: Some(db),
        })
    }

    /// Build the stores selected by `config.backend`.
    pub async fn connect(config: &DatabaseConfig) -> AppResult<Self> {
        match config.backend {
            DatabaseBackend::Memory => {
                info!("Using in-memory stores; data will not survive a restart");
                Ok(Self::memory())
            }
            DatabaseBackend::Postgres => {
                let db = DatabasePool::connect(config).await?;
                Self::postgres(db).await
            }
        }
    }

    /// Whether the backing database answers.
    pub async fn health_check(&self) -> AppResult<bool> {
        match &self.pool {
            Some(db) => db.health_check().await,
            None => Ok(true),
        }
    }
}
