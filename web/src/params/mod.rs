//! This module holds typed parameters for various endpoint inputs.
//!
//! The purpose of this module is to define and manage the parameters that are used as inputs
//! for different endpoints in the web application. By using typed parameters, we can ensure
//! that the inputs are validated (by type) and correctly formatted before they are processed by the
//! application logic. Request bodies use camelCase field names.

pub(crate) mod audit_log;
pub(crate) mod package;
pub(crate) mod tracking_code;
pub(crate) mod user;
pub(crate) mod user_session;
