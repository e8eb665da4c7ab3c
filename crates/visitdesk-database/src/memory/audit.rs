//! In-memory audit log.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use visitdesk_core::result::AppResult;
use visitdesk_core::types::{PageRequest, PageResponse};
use visitdesk_entity::audit::{AuditLogEntry, AuditSearch, CreateAuditLogEntry};

use crate::store::AuditStore;

/// Append-only audit log held in a vector.
#[derive(Debug, Default)]
pub struct MemoryAuditStore {
    entries: RwLock<Vec<AuditLogEntry>>,
}

impl MemoryAuditStore {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuditStore for MemoryAuditStore {
    async fn append(&self, data: CreateAuditLogEntry) -> AppResult<AuditLogEntry> {
        let entry = AuditLogEntry::from_create(data, Utc::now());
        self.entries.write().await.push(entry.clone());
        Ok(entry)
    }

    async fn search(
        &self,
        search: &AuditSearch,
        page: &PageRequest,
    ) -> AppResult<PageResponse<AuditLogEntry>> {
        let all = self.find_matching(search).await?;
        Ok(PageResponse::from_vec(all, page))
    }

    async fn find_matching(&self, search: &AuditSearch) -> AppResult<Vec<AuditLogEntry>> {
        // Entries are appended in time order; reverse for newest first.
        Ok(self
            .entries
            .read()
            .await
            .iter()
            .rev()
            .filter(|e| search.matches(e))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(action: &str) -> CreateAuditLogEntry {
        CreateAuditLogEntry {
            actor_id: None,
            actor_name: None,
            action: action.into(),
            target_type: "visitor".into(),
            target_id: None,
            details: serde_json::json!({}),
            ip_address: None,
        }
    }

    #[tokio::test]
    async fn search_returns_newest_first() {
        let store = MemoryAuditStore::new();
        store.append(entry("visitor.check_in")).await.unwrap();
        store.append(entry("visitor.check_out")).await.unwrap();
        let page = store
            .search(&AuditSearch::default(), &PageRequest::default())
            .await
            .unwrap();
        assert_eq!(page.total_items, 2);
        assert_eq!(page.items[0].action, "visitor.check_out");
    }
}
