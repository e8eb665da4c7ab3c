//! Visitor domain entities.

pub mod filter;
pub mod identifiers;
pub mod kind;
pub mod model;
pub mod screening;
pub mod status;

pub use filter::VisitorFilter;
pub use kind::VisitorType;
pub use model::{NewVisitor, Visitor, VisitorUpdate};
pub use screening::HealthScreening;
pub use status::VisitorStatus;
