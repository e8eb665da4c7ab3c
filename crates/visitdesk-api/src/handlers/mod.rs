//! Route handlers organized by domain.

pub mod admin;
pub mod auth;
pub mod evacuation;
pub mod export;
pub mod health;
pub mod report;
pub mod user;
pub mod visitor;
