//! This module provides the permission guards for the web application's routes.
//!
//! Each submodule groups the guards of one area of the API. A guard is an axum middleware
//! given to `from_fn` in the router: it reads the caller's identity and lets the request
//! through only when the identity holds the permission the route requires. Hierarchy rules
//! that depend on the target of a request (who may edit whom) are enforced by `domain`.

pub(crate) mod management;
pub(crate) mod packages;
pub(crate) mod tracking_codes;

use crate::Error;
use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use domain::error::Error as DomainError;
use domain::identity::Identity;
use domain::permissions::Permission;
use log::*;

/// Runs `next` when `identity` holds `permission`, otherwise answers **403 FORBIDDEN**.
///
/// Typical usage inside a guard in the `protect` namespace:
/// ```rust,ignore
/// pub(crate) async fn entry(
///     AuthenticatedUser(identity): AuthenticatedUser,
///     request: Request,
///     next: Next,
/// ) -> Response {
///     authorize(&identity, Permission::ManageFifo, request, next).await
/// }
/// ```
pub(crate) async fn authorize(
    identity: &Identity,
    permission: Permission,
    request: Request,
    next: Next,
) -> Response {
    if identity.can(permission) {
        next.run(request).await
    } else {
        warn!(
            "{} lacks {permission} for {} {}",
            identity.username,
            request.method(),
            request.uri().path()
        );
        Error::from(DomainError::forbidden(format!(
            "Missing permission {permission}"
        )))
        .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::authenticated_user::AuthenticatedUser;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        middleware::from_fn,
        routing::get,
        Router,
    };
    use domain::identity::PermissionSet;
    use tower::ServiceExt;

    async fn logs_guard(
        AuthenticatedUser(identity): AuthenticatedUser,
        request: axum::extract::Request,
        next: Next,
    ) -> Response {
        authorize(&identity, Permission::ViewLogs, request, next).await
    }

    fn app(identity: Identity) -> Router {
        Router::new()
            .route("/logs", get(|| async { "logs" }))
            .route_layer(from_fn(logs_guard))
            .layer(axum::Extension(identity))
    }

    fn request() -> Request<Body> {
        Request::builder().uri("/logs").body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn callers_with_the_permission_pass() {
        let identity = crate::test_support::identity(
            "leader",
            [Permission::ViewLogs].into_iter().collect(),
        );

        let response = app(identity).oneshot(request()).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn callers_without_the_permission_are_forbidden() {
        let identity = crate::test_support::identity(
            "fifo",
            [Permission::ManageFifo, Permission::MovePackage]
                .into_iter()
                .collect::<PermissionSet>(),
        );

        let response = app(identity).oneshot(request()).await.unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
