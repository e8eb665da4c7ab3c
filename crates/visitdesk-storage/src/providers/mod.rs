//! Backup storage provider implementations.

pub mod drive;
pub mod local;

pub use drive::DriveStorageProvider;
pub use local::LocalStorageProvider;
