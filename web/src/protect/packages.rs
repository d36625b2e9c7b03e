use super::authorize;
use crate::extractors::authenticated_user::AuthenticatedUser;
use axum::{extract::Request, middleware::Next, response::Response};
use domain::permissions::Permission;

// checks:
// - that the caller may register entries and exits
pub(crate) async fn manage_fifo(
    AuthenticatedUser(identity): AuthenticatedUser,
    request: Request,
    next: Next,
) -> Response {
    authorize(&identity, Permission::ManageFifo, request, next).await
}

// checks:
// - that the caller may move packages between locations
pub(crate) async fn move_package(
    AuthenticatedUser(identity): AuthenticatedUser,
    request: Request,
    next: Next,
) -> Response {
    authorize(&identity, Permission::MovePackage, request, next).await
}
