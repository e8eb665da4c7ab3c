//! Dashboard and range reports.

pub mod dashboard;

pub use dashboard::{DashboardStats, ReportService, VisitSummary};
