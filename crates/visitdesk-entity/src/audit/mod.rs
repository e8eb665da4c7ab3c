//! Audit log entities.

pub mod action;
pub mod model;

pub use model::{AuditLogEntry, AuditSearch, CreateAuditLogEntry};
