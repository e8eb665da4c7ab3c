//! Audit trail recording and search.

pub mod service;

pub use service::AuditService;
