//! Back-office routes under `/api/management`.

pub(crate) mod audit_log_controller;
pub(crate) mod role_controller;
pub(crate) mod user_controller;
