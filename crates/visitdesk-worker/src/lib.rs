//! Scheduled background tasks for VisitDesk.
//!
//! This crate provides:
//! - A task trait and error type shared by scheduled jobs
//! - A cron scheduler that runs the periodic backup

pub mod executor;
pub mod jobs;
pub mod scheduler;

pub use executor::{JobExecutionError, ScheduledTask};
pub use jobs::BackupTask;
pub use scheduler::BackupScheduler;
