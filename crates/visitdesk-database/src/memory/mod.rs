//! In-memory store implementations.
//!
//! Backed by `tokio::sync::RwLock` maps. Data lives for the life of the
//! process, which suits development, the CLI smoke commands, and tests.

pub mod audit;
pub mod user;
pub mod visitor;

pub use audit::MemoryAuditStore;
pub use user::MemoryUserStore;
pub use visitor::MemoryVisitorStore;
