//! Admin-only handlers.

pub mod audit;
pub mod backup;
pub mod users;
