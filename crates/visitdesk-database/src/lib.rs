//! # visitdesk-database
//!
//! Store traits for visitors, users, and the audit log, with two
//! implementations: PostgreSQL repositories over sqlx and process-local
//! in-memory stores used for development and tests.

pub mod connection;
pub mod memory;
pub mod migration;
pub mod repositories;
pub mod store;
pub mod stores;

pub use connection::DatabasePool;
pub use store::{AuditStore, UserStore, VisitorStore};
pub use stores::Stores;
