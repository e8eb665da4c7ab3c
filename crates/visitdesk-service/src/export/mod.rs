//! CSV and JSON exports.

pub mod encode;
pub mod service;

pub use service::{ExportFile, ExportFormat, ExportService};
