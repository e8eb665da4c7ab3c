//! # visitdesk-auth
//!
//! Authentication and authorization for VisitDesk.
//!
//! ## Modules
//!
//! - `jwt`: access/refresh token creation and validation
//! - `password`: Argon2id password hashing and policy enforcement
//! - `rbac`: role-to-permission policies and enforcement
//! - `navigation`: role-keyed view routing table
//! - `login`: credential verification with lockout

pub mod jwt;
pub mod login;
pub mod navigation;
pub mod password;
pub mod rbac;

pub use jwt::{Claims, JwtDecoder, JwtEncoder, TokenPair};
pub use login::{Authenticator, LoginOutcome};
pub use navigation::{Navigation, View};
pub use password::{PasswordHasher, PasswordValidator};
pub use rbac::{RbacEnforcer, RbacPolicies, SystemPermission};
