//! The Identity capability: password login, access token issuance and verification.
//!
//! A verified token resolves once into an [`Identity`] whose permissions are a typed
//! [`PermissionSet`]. Request handlers authorize against that value and never compare
//! permission names themselves.
//!
//! # Example
//!
//! ```rust,ignore
//! let authority = TokenAuthority::from_config(&config)?;
//! let (jwt, identity) = identity::login(db, &authority, "ana", "secret").await?;
//! assert_eq!(authority.verify(&jwt.token)?, identity);
//! ```

use crate::error::Error;
use crate::{roles, users, Id};
use chrono::Utc;
use claims::AccessClaims;
use entity::permissions::Permission;
use entity::roles::RoleName;
use entity_api::{role, user};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use log::*;
use sea_orm::ConnectionTrait;
use service::config::Config;
use std::fmt;

// re-export the Jwt struct from the entity module
pub use entity::jwt::Jwt;
pub use permission_set::PermissionSet;

pub(crate) mod claims;
mod permission_set;

/// The authenticated caller of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Id,
    pub username: String,
    pub full_name: String,
    pub role: String,
    pub department: String,
    pub permissions: PermissionSet,
}

impl Identity {
    pub fn can(&self, permission: Permission) -> bool {
        self.permissions.contains(permission)
    }

    pub fn role_name(&self) -> Option<RoleName> {
        RoleName::parse(&self.role)
    }

    /// Builds the identity of a stored user from its role and that role's permissions.
    pub fn from_user(
        user: &users::Model,
        role: &roles::Model,
        permissions: impl IntoIterator<Item = Permission>,
    ) -> Self {
        Self {
            user_id: user.id,
            username: user.username.clone(),
            full_name: user.full_name.clone(),
            role: role.name.clone(),
            department: user.department.clone(),
            permissions: permissions.into_iter().collect(),
        }
    }
}

/// Signs and verifies HS256 access tokens.
#[derive(Clone)]
pub struct TokenAuthority {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiry_seconds: i64,
}

impl fmt::Debug for TokenAuthority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenAuthority")
            .field("expiry_seconds", &self.expiry_seconds)
            .finish_non_exhaustive()
    }
}

impl TokenAuthority {
    pub fn new(secret: &str, expiry_seconds: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expiry_seconds: i64::try_from(expiry_seconds).unwrap_or(i64::MAX),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, Error> {
        let secret = config.jwt_secret().ok_or_else(|| {
            warn!("Failed to get JWT secret from config");
            Error::config()
        })?;
        Ok(Self::new(secret, config.jwt_expiry_seconds))
    }

    pub fn issue(&self, identity: &Identity) -> Result<Jwt, Error> {
        let issued_at = Utc::now().timestamp();
        let claims = AccessClaims {
            sub: identity.user_id.to_string(),
            username: identity.username.clone(),
            full_name: identity.full_name.clone(),
            role: identity.role.clone(),
            department: identity.department.clone(),
            permissions: identity.permissions.names(),
            iat: issued_at,
            exp: issued_at.saturating_add(self.expiry_seconds),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;

        Ok(Jwt {
            token,
            sub: claims.sub,
            expires_at: claims.exp,
        })
    }

    /// Checks the signature and expiry, then resolves the claims into an [`Identity`].
    /// Every failure is reported as unauthenticated.
    pub fn verify(&self, token: &str) -> Result<Identity, Error> {
        let validation = Validation::new(Algorithm::HS256);
        let claims = decode::<AccessClaims>(token, &self.decoding_key, &validation)
            .map_err(|e| {
                debug!("Rejected access token: {e}");
                Error::unauthenticated()
            })?
            .claims;

        let user_id = Id::parse_str(&claims.sub).map_err(|_| Error::unauthenticated())?;

        Ok(Identity {
            user_id,
            username: claims.username,
            full_name: claims.full_name,
            role: claims.role,
            department: claims.department,
            permissions: PermissionSet::from_names(&claims.permissions),
        })
    }
}

/// Loads a user's role and permissions and resolves them into an [`Identity`].
pub async fn load(db: &impl ConnectionTrait, user: &users::Model) -> Result<Identity, Error> {
    let role = role::find_by_id(db, user.role_id).await?;
    let permissions = role::find_permissions(db, &role).await?;

    Ok(Identity::from_user(
        user,
        &role,
        permissions
            .iter()
            .filter_map(|p| Permission::parse(&p.name)),
    ))
}

/// Verifies a username and password and issues an access token. An unknown username and
/// a wrong password fail the same way.
pub async fn login(
    db: &impl ConnectionTrait,
    authority: &TokenAuthority,
    username: &str,
    password: &str,
) -> Result<(Jwt, Identity), Error> {
    let user = user::find_by_username(db, username.trim())
        .await?
        .ok_or_else(|| {
            debug!("Login attempt for unknown user");
            Error::unauthenticated()
        })?;

    user::verify_password(password, &user.password_hash).map_err(|_| {
        debug!("Login attempt with a wrong password for {}", user.username);
        Error::unauthenticated()
    })?;

    let identity = load(db, &user).await?;
    let jwt = authority.issue(&identity)?;
    info!(
        "Issued token for {} with permissions {:?}",
        identity.username, identity.permissions
    );

    Ok((jwt, identity))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DomainErrorKind, EntityErrorKind, InternalErrorKind};

    fn identity() -> Identity {
        Identity {
            user_id: Id::new_v4(),
            username: "ana".to_owned(),
            full_name: "Ana Lima".to_owned(),
            role: "leader".to_owned(),
            department: "Outbound".to_owned(),
            permissions: [Permission::ViewLogs, Permission::EditUser]
                .into_iter()
                .collect(),
        }
    }

    fn assert_unauthenticated(result: Result<Identity, Error>) {
        assert_eq!(
            result.unwrap_err().error_kind,
            DomainErrorKind::Internal(InternalErrorKind::Entity(EntityErrorKind::Unauthenticated))
        );
    }

    #[test]
    fn issued_tokens_verify_back_to_the_same_identity() {
        let authority = TokenAuthority::new("test-secret", 3600);
        let identity = identity();

        let jwt = authority.issue(&identity).unwrap();

        assert_eq!(jwt.sub, identity.user_id.to_string());
        assert_eq!(authority.verify(&jwt.token).unwrap(), identity);
    }

    #[test]
    fn tokens_signed_with_another_secret_are_rejected() {
        let jwt = TokenAuthority::new("one-secret", 3600)
            .issue(&identity())
            .unwrap();

        assert_unauthenticated(TokenAuthority::new("other-secret", 3600).verify(&jwt.token));
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let now = Utc::now().timestamp();
        let claims = AccessClaims {
            sub: Id::new_v4().to_string(),
            username: "ana".to_owned(),
            full_name: "Ana Lima".to_owned(),
            role: "fifo".to_owned(),
            department: "Outbound".to_owned(),
            permissions: vec![],
            iat: now - 7200,
            exp: now - 3600,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();

        assert_unauthenticated(TokenAuthority::new("test-secret", 3600).verify(&token));
    }

    #[test]
    fn garbage_is_rejected() {
        assert_unauthenticated(TokenAuthority::new("test-secret", 3600).verify("not.a.jwt"));
    }

    #[test]
    fn unknown_permission_names_in_a_token_are_dropped() {
        let now = Utc::now().timestamp();
        let claims = AccessClaims {
            sub: Id::new_v4().to_string(),
            username: "ana".to_owned(),
            full_name: "Ana Lima".to_owned(),
            role: "fifo".to_owned(),
            department: "Outbound".to_owned(),
            permissions: vec!["MANAGE_FIFO".to_owned(), "SELF_DESTRUCT".to_owned()],
            iat: now,
            exp: now + 600,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();

        let identity = TokenAuthority::new("test-secret", 3600)
            .verify(&token)
            .unwrap();

        assert!(identity.can(Permission::ManageFifo));
        assert_eq!(identity.permissions.iter().count(), 1);
    }

    #[test]
    fn from_config_uses_the_configured_secret_and_expiry() {
        let config = Config::from_args([
            "fifo_platform_rs",
            "--jwt-secret",
            "s3cret",
            "--jwt-expiry-seconds",
            "120",
        ]);

        let authority = TokenAuthority::from_config(&config).unwrap();
        let jwt = authority.issue(&identity()).unwrap();

        assert!(jwt.expires_at - Utc::now().timestamp() <= 120);
        assert!(TokenAuthority::new("s3cret", 120).verify(&jwt.token).is_ok());
    }
}
