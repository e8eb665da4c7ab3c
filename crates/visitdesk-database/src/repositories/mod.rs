//! PostgreSQL repository implementations of the store traits.

pub mod audit;
pub mod user;
pub mod visitor;

pub use audit::AuditLogRepository;
pub use user::UserRepository;
pub use visitor::VisitorRepository;
