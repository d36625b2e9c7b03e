pub use entity::{
    audit_action, audit_logs, buffer, packages, permissions, profile, role_permissions, roles,
    users, Id,
};

pub mod audit_log;
pub mod error;
pub mod package;
pub mod role;
pub mod seed;
pub mod user;

/// Parses a calendar date as sent in query strings (`YYYY-MM-DD`).
pub fn naive_date_parse_str(date_str: &str) -> Result<chrono::NaiveDate, error::Error> {
    chrono::NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|_| error::Error {
        source: None,
        error_kind: error::EntityApiErrorKind::InvalidQueryTerm,
    })
}
