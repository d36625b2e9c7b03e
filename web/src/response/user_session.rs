use domain::identity::{Identity, Jwt};
use domain::Id;
use serde::Serialize;
use utoipa::ToSchema;

/// Returned by a successful login. The token goes back in `Authorization: Bearer`.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    /// Unix timestamp, in seconds.
    pub expires_at: i64,
    pub user: SessionUser,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    #[schema(value_type = String, format = Uuid)]
    pub id: Id,
    pub username: String,
    pub full_name: String,
    pub role: String,
    pub department: String,
    pub permissions: Vec<String>,
}

impl LoginResponse {
    pub fn new(jwt: Jwt, identity: Identity) -> Self {
        Self {
            token: jwt.token,
            expires_at: jwt.expires_at,
            user: SessionUser {
                id: identity.user_id,
                permissions: identity.permissions.names(),
                username: identity.username,
                full_name: identity.full_name,
                role: identity.role,
                department: identity.department,
            },
        }
    }
}
