//! Visitor check-in, check-out, and history.

pub mod query;
pub mod service;

pub use query::query_with_fallback;
pub use service::VisitorService;
