//! Audit log repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use visitdesk_core::error::{AppError, ErrorKind};
use visitdesk_core::result::AppResult;
use visitdesk_core::types::pagination::{PageRequest, PageResponse};
use visitdesk_entity::audit::{AuditLogEntry, AuditSearch, CreateAuditLogEntry};

use crate::store::AuditStore;

/// PostgreSQL-backed audit log.
#[derive(Debug, Clone)]
pub struct AuditLogRepository {
    pool: PgPool,
}

/// Bind values collected while building a dynamic WHERE clause.
enum Param {
    Text(String),
    Uuid(Uuid),
    Time(DateTime<Utc>),
}

impl AuditLogRepository {
    /// Create a new audit log repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn where_clause(search: &AuditSearch) -> (String, Vec<Param>) {
        let mut conditions = Vec::new();
        let mut params = Vec::new();

        if let Some(action) = &search.action {
            if action.ends_with('.') {
                params.push(Param::Text(format!("{action}%")));
                conditions.push(format!("action LIKE ${}", params.len()));
            } else {
                params.push(Param::Text(action.clone()));
                conditions.push(format!("action = ${}", params.len()));
            }
        }
        if let Some(actor) = search.actor_id {
            params.push(Param::Uuid(actor));
            conditions.push(format!("actor_id = ${}", params.len()));
        }
        if let Some(tt) = &search.target_type {
            params.push(Param::Text(tt.clone()));
            conditions.push(format!("target_type = ${}", params.len()));
        }
        if let Some(tid) = &search.target_id {
            params.push(Param::Text(tid.clone()));
            conditions.push(format!("target_id = ${}", params.len()));
        }
        if let Some(range) = &search.range {
            let (lo, hi) = range.bounds();
            params.push(Param::Time(lo));
            conditions.push(format!("created_at >= ${}", params.len()));
            params.push(Param::Time(hi));
            conditions.push(format!("created_at < ${}", params.len()));
        }

        let clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };
        (clause, params)
    }
}

macro_rules! bind_params {
    ($query:expr, $params:expr) => {{
        let mut q = $query;
        for p in $params {
            q = match p {
                Param::Text(s) => q.bind(s.clone()),
                Param::Uuid(u) => q.bind(*u),
                Param::Time(t) => q.bind(*t),
            };
        }
        q
    }};
}

#[async_trait]
impl AuditStore for AuditLogRepository {
    async fn append(&self, data: CreateAuditLogEntry) -> AppResult<AuditLogEntry> {
        sqlx::query_as::<_, AuditLogEntry>(
            "INSERT INTO audit_log (id, actor_id, actor_name, action, target_type, target_id, details, ip_address) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(data.actor_id)
        .bind(&data.actor_name)
        .bind(&data.action)
        .bind(&data.target_type)
        .bind(&data.target_id)
        .bind(&data.details)
        .bind(&data.ip_address)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create audit entry", e))
    }

    async fn search(
        &self,
        search: &AuditSearch,
        page: &PageRequest,
    ) -> AppResult<PageResponse<AuditLogEntry>> {
        let (where_clause, params) = Self::where_clause(search);
        let count_sql = format!("SELECT COUNT(*) FROM audit_log {where_clause}");
        let select_sql = format!(
            "SELECT * FROM audit_log {where_clause} ORDER BY created_at DESC LIMIT ${} OFFSET ${}",
            params.len() + 1,
            params.len() + 2
        );

        let count_query = bind_params!(sqlx::query_scalar::<_, i64>(&count_sql), &params);
        let total = count_query.fetch_one(&self.pool).await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to count audit entries", e)
        })?;

        let select_query = bind_params!(sqlx::query_as::<_, AuditLogEntry>(&select_sql), &params);
        let entries = select_query
            .bind(page.limit() as i64)
            .bind(page.offset() as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to search audit log", e)
            })?;

        Ok(PageResponse::new(
            entries,
            page.page,
            page.page_size,
            total as u64,
        ))
    }

    async fn find_matching(&self, search: &AuditSearch) -> AppResult<Vec<AuditLogEntry>> {
        let (where_clause, params) = Self::where_clause(search);
        let sql = format!("SELECT * FROM audit_log {where_clause} ORDER BY created_at DESC");
        let query = bind_params!(sqlx::query_as::<_, AuditLogEntry>(&sql), &params);
        query.fetch_all(&self.pool).await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to load audit entries", e)
        })
    }
}
