//! Business rules of the FIFO platform.
//!
//! Handlers in `web` call into this crate rather than `entity_api` directly; errors are
//! translated into [`error::Error`] on the way up.

// Re-exports from `entity` crate via `entity_api`
pub use entity_api::{
    audit_action, audit_logs, buffer, packages, permissions, profile, roles, users, Id,
};

pub mod audit_log;
pub mod error;
pub mod identity;
pub mod package;
pub mod queue;
pub mod time;
pub mod tracking_code;
pub mod user;
