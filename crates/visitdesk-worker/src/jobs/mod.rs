//! Built-in scheduled tasks.

pub mod backup;

pub use backup::BackupTask;
