//! # visitdesk-api
//!
//! HTTP API layer for VisitDesk built on Axum.
//!
//! Provides the REST endpoints for the front desk, evacuation, reports,
//! exports, and administration, plus middleware, extractors, DTOs, and
//! error mapping.

pub mod app;
pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::{build_app, run_server, shutdown_signal};
pub use error::{ApiError, ApiResult};
pub use state::AppState;
