//! In-memory visitor store.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use visitdesk_core::error::AppError;
use visitdesk_core::result::AppResult;
use visitdesk_core::types::DateRange;
use visitdesk_entity::visitor::filter::sort_newest_first;
use visitdesk_entity::visitor::identifiers::{is_badge_number, parse_qr_payload};
use visitdesk_entity::visitor::{Visitor, VisitorFilter, VisitorStatus};

use crate::store::VisitorStore;

/// Visitor store held in a process-local map.
#[derive(Debug)]
pub struct MemoryVisitorStore {
    visitors: RwLock<HashMap<String, Visitor>>,
    composite_index: bool,
}

impl MemoryVisitorStore {
    /// A store that answers composite queries directly.
    pub fn new() -> Self {
        Self {
            visitors: RwLock::new(HashMap::new()),
            composite_index: true,
        }
    }

    /// A store that behaves like a database missing the
    /// `(status, check_in_time)` index.
    pub fn without_composite_index() -> Self {
        Self {
            visitors: RwLock::new(HashMap::new()),
            composite_index: false,
        }
    }

    async fn collect(&self, pred: impl Fn(&Visitor) -> bool) -> Vec<Visitor> {
        self.visitors
            .read()
            .await
            .values()
            .filter(|v| pred(v))
            .cloned()
            .collect()
    }
}

impl Default for MemoryVisitorStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VisitorStore for MemoryVisitorStore {
    async fn insert(&self, visitor: &Visitor) -> AppResult<()> {
        let mut map = self.visitors.write().await;
        if map.contains_key(&visitor.id) {
            return Err(AppError::conflict(format!(
                "Visitor ID {} already exists",
                visitor.id
            )));
        }
        map.insert(visitor.id.clone(), visitor.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<Visitor>> {
        Ok(self.visitors.read().await.get(id).cloned())
    }

    async fn find_by_code(&self, code: &str) -> AppResult<Option<Visitor>> {
        let code = code.trim();
        let map = self.visitors.read().await;
        if let Some(id) = parse_qr_payload(code) {
            return Ok(map.get(id).cloned());
        }
        let badge = is_badge_number(code);
        Ok(map
            .values()
            .filter(|v| if badge { v.badge_number == code } else { v.qr_code == code })
            .max_by_key(|v| v.check_in_time)
            .cloned())
    }

    async fn update(&self, visitor: &Visitor, expected: VisitorStatus) -> AppResult<bool> {
        let mut map = self.visitors.write().await;
        match map.get_mut(&visitor.id) {
            Some(slot) if slot.status == expected => {
                *slot = visitor.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete(&self, id: &str) -> AppResult<bool> {
        Ok(self.visitors.write().await.remove(id).is_some())
    }

    async fn find_by_status(&self, status: VisitorStatus) -> AppResult<Vec<Visitor>> {
        Ok(self.collect(|v| v.status == status).await)
    }

    async fn find_checked_in_between(&self, range: &DateRange) -> AppResult<Vec<Visitor>> {
        Ok(self.collect(|v| range.contains(v.check_in_time)).await)
    }

    async fn find_all(&self) -> AppResult<Vec<Visitor>> {
        Ok(self.collect(|_| true).await)
    }

    async fn query(&self, filter: &VisitorFilter) -> AppResult<Vec<Visitor>> {
        if filter.needs_composite_index() && !self.composite_index {
            return Err(AppError::query_unsupported(
                "The query requires a composite index on (status, check_in_time)",
            ));
        }
        let mut result = self.collect(|v| filter.matches(v)).await;
        sort_newest_first(&mut result);
        Ok(result)
    }

    async fn count_by_status(&self) -> AppResult<HashMap<VisitorStatus, u64>> {
        let mut counts = HashMap::new();
        for v in self.visitors.read().await.values() {
            *counts.entry(v.status).or_insert(0) += 1;
        }
        Ok(counts)
    }
}
