//! # visitdesk-core
//!
//! Core crate for VisitDesk. Contains configuration schemas, the unified
//! error system, pagination and date-range types, and the traits that
//! other crates implement.
//!
//! This crate has **no** internal dependencies on other VisitDesk crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
