//! Core traits defined in `visitdesk-core` and implemented by other crates.

pub mod storage;

pub use storage::StorageProvider;
