//! Store traits implemented by the PostgreSQL repositories and the
//! in-memory stores.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use visitdesk_core::result::AppResult;
use visitdesk_core::types::{DateRange, PageRequest, PageResponse};
use visitdesk_entity::audit::{AuditLogEntry, AuditSearch, CreateAuditLogEntry};
use visitdesk_entity::user::{CreateUser, UpdateUser, User, UserRole, UserStatus};
use visitdesk_entity::visitor::{Visitor, VisitorFilter, VisitorStatus};

/// Persistence for visitor records.
#[async_trait]
pub trait VisitorStore: Send + Sync + std::fmt::Debug + 'static {
    /// Insert a new visitor. A duplicate ID yields a conflict.
    async fn insert(&self, visitor: &Visitor) -> AppResult<()>;

    /// Find a visitor by ID.
    async fn find_by_id(&self, id: &str) -> AppResult<Option<Visitor>>;

    /// Find a visitor by QR payload or badge number.
    async fn find_by_code(&self, code: &str) -> AppResult<Option<Visitor>>;

    /// Overwrite a stored visitor whose stored status is still `expected`.
    ///
    /// Returns `false` when the row is gone or its status has moved on, so a
    /// concurrent check-out or evacuation is never overwritten.
    async fn update(&self, visitor: &Visitor, expected: VisitorStatus) -> AppResult<bool>;

    /// Delete a visitor. Returns `false` when no row matched.
    async fn delete(&self, id: &str) -> AppResult<bool>;

    /// Single-field query: every visitor with `status`, unordered.
    async fn find_by_status(&self, status: VisitorStatus) -> AppResult<Vec<Visitor>>;

    /// Single-field query: every visitor who checked in during `range`, unordered.
    async fn find_checked_in_between(&self, range: &DateRange) -> AppResult<Vec<Visitor>>;

    /// Every visitor, unordered.
    async fn find_all(&self) -> AppResult<Vec<Visitor>>;

    /// Composite query ordered by check-in time, newest first.
    ///
    /// Returns [`ErrorKind::QueryUnsupported`](visitdesk_core::error::ErrorKind)
    /// when the filter needs the `(status, check_in_time)` index and the
    /// store does not have it.
    async fn query(&self, filter: &VisitorFilter) -> AppResult<Vec<Visitor>>;

    /// Number of visitors per status.
    async fn count_by_status(&self) -> AppResult<HashMap<VisitorStatus, u64>>;
}

/// Persistence for staff accounts.
#[async_trait]
pub trait UserStore: Send + Sync + std::fmt::Debug + 'static {
    /// Create a user. A duplicate username or email yields a conflict.
    async fn create(&self, data: CreateUser) -> AppResult<User>;

    /// Find a user by ID.
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>>;

    /// Find a user by username (case-insensitive).
    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>>;

    /// Find a user by email (case-insensitive).
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// List users, newest first.
    async fn list(&self, page: &PageRequest) -> AppResult<PageResponse<User>>;

    /// Every user (for backups).
    async fn find_all(&self) -> AppResult<Vec<User>>;

    /// Update profile fields.
    async fn update_profile(&self, id: Uuid, data: &UpdateUser) -> AppResult<User>;

    /// Change the role.
    async fn update_role(&self, id: Uuid, role: UserRole) -> AppResult<User>;

    /// Change the status. Reactivation clears any lock.
    async fn update_status(&self, id: Uuid, status: UserStatus) -> AppResult<User>;

    /// Replace the password hash.
    async fn update_password(&self, id: Uuid, password_hash: &str) -> AppResult<()>;

    /// Increment the failed-login counter and return the new value.
    async fn record_failed_login(&self, id: Uuid) -> AppResult<i32>;

    /// Lock the account until `until`.
    async fn lock_until(&self, id: Uuid, until: DateTime<Utc>) -> AppResult<()>;

    /// Record a successful login: reset counters and stamp `last_login_at`.
    async fn record_login(&self, id: Uuid) -> AppResult<()>;

    /// Delete a user. Returns `false` when no row matched.
    async fn delete(&self, id: Uuid) -> AppResult<bool>;

    /// Number of users.
    async fn count(&self) -> AppResult<u64>;

    /// Number of active users holding `role`.
    async fn count_active_by_role(&self, role: UserRole) -> AppResult<u64>;
}

/// Append-only audit log.
#[async_trait]
pub trait AuditStore: Send + Sync + std::fmt::Debug + 'static {
    /// Append an entry.
    async fn append(&self, data: CreateAuditLogEntry) -> AppResult<AuditLogEntry>;

    /// Search entries, newest first.
    async fn search(
        &self,
        search: &AuditSearch,
        page: &PageRequest,
    ) -> AppResult<PageResponse<AuditLogEntry>>;

    /// Every entry matching `search`, newest first (for exports and backups).
    async fn find_matching(&self, search: &AuditSearch) -> AppResult<Vec<AuditLogEntry>>;
}
