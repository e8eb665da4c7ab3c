//! Visitor repository implementation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::types::Json;
use tracing::{info, warn};

use visitdesk_core::error::{AppError, ErrorKind};
use visitdesk_core::result::AppResult;
use visitdesk_core::types::DateRange;
use visitdesk_entity::visitor::identifiers::{is_badge_number, parse_qr_payload};
use visitdesk_entity::visitor::{Visitor, VisitorFilter, VisitorStatus};

use crate::store::VisitorStore;

/// Name of the index that serves status + check-in range queries.
pub const COMPOSITE_INDEX: &str = "idx_visitors_status_check_in";

/// PostgreSQL-backed visitor store.
#[derive(Debug)]
pub struct VisitorRepository {
    pool: PgPool,
    composite_index: AtomicBool,
}

impl VisitorRepository {
    /// Create a repository, assuming the composite index exists until
    /// [`VisitorRepository::detect_composite_index`] says otherwise.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            composite_index: AtomicBool::new(true),
        }
    }

    /// Probe `pg_indexes` for the composite index and remember the answer.
    pub async fn detect_composite_index(&self) -> AppResult<bool> {
        let present: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM pg_indexes WHERE tablename = 'visitors' AND indexname = $1)",
        )
        .bind(COMPOSITE_INDEX)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to inspect visitor indexes", e)
        })?;

        self.composite_index.store(present, Ordering::Relaxed);
        if present {
            info!(index = COMPOSITE_INDEX, "Composite visitor index available");
        } else {
            warn!(
                index = COMPOSITE_INDEX,
                "Composite visitor index missing; status + date queries will fall back"
            );
        }
        Ok(present)
    }

    async fn fetch(&self, sql: &str, what: &str) -> AppResult<Vec<Visitor>> {
        sqlx::query_as::<_, Visitor>(sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, format!("Failed to {what}"), e))
    }
}

/// `ILIKE` pattern matching `text` anywhere, with `%`, `_` and `\` taken literally.
fn contains_pattern(text: &str) -> String {
    let mut pattern = String::with_capacity(text.len() + 2);
    pattern.push('%');
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[async_trait]
impl VisitorStore for VisitorRepository {
    async fn insert(&self, v: &Visitor) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO visitors (id, first_name, last_name, phone, email, visitor_type, \
                 resident_name, resident_room, relationship, purpose, company, vehicle_registration, \
                 status, check_in_time, check_out_time, health_screening, qr_code, badge_number, notes, \
                 checked_in_by, checked_out_by, evacuated_at, evacuated_by, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, \
                 $18, $19, $20, $21, $22, $23, $24, $25)",
        )
        .bind(&v.id)
        .bind(&v.first_name)
        .bind(&v.last_name)
        .bind(&v.phone)
        .bind(&v.email)
        .bind(v.visitor_type)
        .bind(&v.resident_name)
        .bind(&v.resident_room)
        .bind(&v.relationship)
        .bind(&v.purpose)
        .bind(&v.company)
        .bind(&v.vehicle_registration)
        .bind(v.status)
        .bind(v.check_in_time)
        .bind(v.check_out_time)
        .bind(Json(&v.health_screening))
        .bind(&v.qr_code)
        .bind(&v.badge_number)
        .bind(&v.notes)
        .bind(v.checked_in_by)
        .bind(v.checked_out_by)
        .bind(v.evacuated_at)
        .bind(v.evacuated_by)
        .bind(v.created_at)
        .bind(v.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.constraint() == Some("visitors_pkey") => {
                AppError::conflict(format!("Visitor ID {} already exists", v.id))
            }
            _ => AppError::with_source(ErrorKind::Database, "Failed to insert visitor", e),
        })?;
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<Visitor>> {
        sqlx::query_as::<_, Visitor>("SELECT * FROM visitors WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find visitor", e))
    }

    async fn find_by_code(&self, code: &str) -> AppResult<Option<Visitor>> {
        let code = code.trim();
        if let Some(id) = parse_qr_payload(code) {
            return self.find_by_id(id).await;
        }
        // Badges are reissued across visits; the latest visit wins.
        let sql = if is_badge_number(code) {
            "SELECT * FROM visitors WHERE badge_number = $1 ORDER BY check_in_time DESC LIMIT 1"
        } else {
            "SELECT * FROM visitors WHERE qr_code = $1 ORDER BY check_in_time DESC LIMIT 1"
        };
        sqlx::query_as::<_, Visitor>(sql)
            .bind(code)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find visitor by code", e)
            })
    }

    async fn update(&self, v: &Visitor, expected: VisitorStatus) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE visitors SET first_name = $2, last_name = $3, phone = $4, email = $5, \
                 visitor_type = $6, resident_name = $7, resident_room = $8, relationship = $9, \
                 purpose = $10, company = $11, vehicle_registration = $12, status = $13, \
                 check_out_time = $14, health_screening = $15, notes = $16, checked_out_by = $17, \
                 evacuated_at = $18, evacuated_by = $19, updated_at = $20 \
             WHERE id = $1 AND status = $21",
        )
        .bind(&v.id)
        .bind(&v.first_name)
        .bind(&v.last_name)
        .bind(&v.phone)
        .bind(&v.email)
        .bind(v.visitor_type)
        .bind(&v.resident_name)
        .bind(&v.resident_room)
        .bind(&v.relationship)
        .bind(&v.purpose)
        .bind(&v.company)
        .bind(&v.vehicle_registration)
        .bind(v.status)
        .bind(v.check_out_time)
        .bind(Json(&v.health_screening))
        .bind(&v.notes)
        .bind(v.checked_out_by)
        .bind(v.evacuated_at)
        .bind(v.evacuated_by)
        .bind(v.updated_at)
        .bind(expected)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update visitor", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM visitors WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete visitor", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_by_status(&self, status: VisitorStatus) -> AppResult<Vec<Visitor>> {
        sqlx::query_as::<_, Visitor>("SELECT * FROM visitors WHERE status = $1")
            .bind(status)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to list visitors by status", e)
            })
    }

    async fn find_checked_in_between(&self, range: &DateRange) -> AppResult<Vec<Visitor>> {
        let (lo, hi) = range.bounds();
        sqlx::query_as::<_, Visitor>(
            "SELECT * FROM visitors WHERE check_in_time >= $1 AND check_in_time < $2",
        )
        .bind(lo)
        .bind(hi)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list visitors in range", e)
        })
    }

    async fn find_all(&self) -> AppResult<Vec<Visitor>> {
        self.fetch("SELECT * FROM visitors", "load visitors").await
    }

    async fn query(&self, filter: &VisitorFilter) -> AppResult<Vec<Visitor>> {
        if filter.needs_composite_index() && !self.composite_index.load(Ordering::Relaxed) {
            return Err(AppError::query_unsupported(format!(
                "Query on status and check-in range requires index {COMPOSITE_INDEX}"
            )));
        }

        let mut conditions = Vec::new();
        let mut idx = 1;
        if filter.status.is_some() {
            conditions.push(format!("status = ${idx}"));
            idx += 1;
        }
        if filter.range.is_some() {
            conditions.push(format!("check_in_time >= ${idx} AND check_in_time < ${}", idx + 1));
            idx += 2;
        }
        if filter.search_text().is_some() {
            let like = format!("ILIKE ${idx} ESCAPE '\\'");
            conditions.push(format!(
                "(first_name || ' ' || last_name {like} OR id {like} \
                  OR badge_number {like} OR phone {like} \
                  OR resident_name {like} OR company {like})"
            ));
        }
        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };
        let sql = format!(
            "SELECT * FROM visitors {where_clause} ORDER BY check_in_time DESC, id DESC"
        );

        let mut q = sqlx::query_as::<_, Visitor>(&sql);
        if let Some(status) = filter.status {
            q = q.bind(status);
        }
        if let Some(range) = &filter.range {
            let (lo, hi) = range.bounds();
            q = q.bind(lo).bind(hi);
        }
        if let Some(text) = filter.search_text() {
            q = q.bind(contains_pattern(text));
        }

        q.fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to query visitors", e))
    }

    async fn count_by_status(&self) -> AppResult<HashMap<VisitorStatus, u64>> {
        let rows: Vec<(VisitorStatus, i64)> =
            sqlx::query_as("SELECT status, COUNT(*) FROM visitors GROUP BY status")
                .fetch_all(&self.pool)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to count visitors", e)
                })?;
        Ok(rows.into_iter().map(|(s, c)| (s, c as u64)).collect())
    }
}
