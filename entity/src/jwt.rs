use serde::Serialize;
use utoipa::ToSchema;

/// Represents a signed JSON Web Token handed to a client after login.
/// Note: This struct does not have a corresponding entity in the database.
///
/// - `token`: the encoded JWT.
/// - `sub`: the subject (user id) for convenient access without decoding the token.
/// - `expires_at`: unix timestamp (seconds) after which the token is rejected.
#[derive(Serialize, Debug, ToSchema)]
#[schema(as = jwt::Jwt)]
pub struct Jwt {
    pub token: String,
    pub sub: String,
    pub expires_at: i64,
}
