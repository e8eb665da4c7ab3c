//! Core type definitions used across the VisitDesk workspace.

pub mod date_range;
pub mod pagination;
pub mod response;

pub use date_range::DateRange;
pub use pagination::{PageRequest, PageResponse};
pub use response::ApiErrorResponse;
