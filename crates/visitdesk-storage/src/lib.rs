//! # visitdesk-storage
//!
//! Backup destinations for VisitDesk: the local filesystem and a cloud
//! drive reached over OAuth2. Also holds the JSON settings file used to
//! persist drive tokens and backup bookkeeping.

pub mod checksum;
pub mod manager;
pub mod oauth;
pub mod providers;
pub mod settings;

pub use checksum::checksum_sha256;
pub use manager::StorageManager;
pub use oauth::OAuthTokenManager;
pub use settings::SettingsStore;
