//! # visitdesk-service
//!
//! Business logic for VisitDesk. Each service orchestrates the stores,
//! backup destinations, and the auth crate to implement one area of the
//! front desk: check-in and check-out, evacuation, users, the audit
//! trail, reports, exports, and backups.
//!
//! Services take their dependencies at construction time and are cheap
//! to clone.

pub mod audit;
pub mod backup;
pub mod context;
pub mod evacuation;
pub mod export;
pub mod report;
pub mod user;
pub mod visitor;

pub use audit::AuditService;
pub use backup::{BackupReport, BackupService, BackupStatus, BackupTrigger};
pub use context::RequestContext;
pub use evacuation::{EvacuationReport, EvacuationRoster, EvacuationScope, EvacuationService};
pub use export::{ExportFile, ExportFormat, ExportService};
pub use report::{DashboardStats, ReportService, VisitSummary};
pub use user::{AdminUserService, UserService};
pub use visitor::VisitorService;
