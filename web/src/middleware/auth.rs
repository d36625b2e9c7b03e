use crate::{AppState, Error};
use axum::{
    extract::{Query, Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use domain::error::Error as DomainError;
use log::*;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

/// Authentication middleware that returns 401 Unauthorized for requests without a valid
/// access token.
///
/// The token comes from `Authorization: Bearer <token>` or, for browser WebSocket clients
/// that cannot set headers, from the `token` query parameter. On success the resolved
/// [`domain::identity::Identity`] is attached to the request for the extractors and
/// permission guards further down.
pub async fn require_auth(
    State(app_state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) =
        bearer_token(request.headers()).or_else(|| query_token(&request))
    else {
        debug!("Rejected {} {}: no access token", request.method(), request.uri().path());
        return Error::from(DomainError::unauthenticated()).into_response();
    };

    match app_state.token_authority.verify(&token) {
        Ok(identity) => {
            trace!("Authenticated {} for {}", identity.username, request.uri().path());
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        Err(e) => Error::from(e).into_response(),
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then(|| token.to_owned())
}

fn query_token(request: &Request) -> Option<String> {
    Query::<TokenQuery>::try_from_uri(request.uri())
        .ok()?
        .0
        .token
        .filter(|token| !token.is_empty())
}
