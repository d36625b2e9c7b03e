use crate::Error;
use axum::{extract::FromRequestParts, http::request::Parts};
use domain::error::Error as DomainError;
use domain::identity::Identity;
use log::*;

/// The caller resolved by [`crate::middleware::auth::require_auth`].
pub(crate) struct AuthenticatedUser(pub Identity);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = Error;

    // Only routes layered with `require_auth` carry an identity. Anything else is treated
    // as an unauthenticated request rather than a server error.
    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<Identity>() {
            Some(identity) => Ok(AuthenticatedUser(identity.clone())),
            None => {
                warn!("No identity attached to {}", parts.uri.path());
                Err(DomainError::unauthenticated().into())
            }
        }
    }
}
