//! Local and cloud drive backups.

pub mod service;

pub use service::{
    BackupArtifact, BackupReport, BackupService, BackupStatus, BackupTrigger, DestinationResult,
};
