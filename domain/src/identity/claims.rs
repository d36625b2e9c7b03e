//! Claims carried by the access tokens issued at login.

use serde::{Deserialize, Serialize};

/// Everything a request needs to know about its caller, so handlers never go back to the
/// store to authorize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct AccessClaims {
    /// User id.
    pub(crate) sub: String,
    pub(crate) username: String,
    pub(crate) full_name: String,
    pub(crate) role: String,
    pub(crate) department: String,
    pub(crate) permissions: Vec<String>,
    pub(crate) iat: i64,
    pub(crate) exp: i64,
}
