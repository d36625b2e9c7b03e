use super::authorize;
use crate::extractors::authenticated_user::AuthenticatedUser;
use axum::{extract::Request, middleware::Next, response::Response};
use domain::permissions::Permission;

pub(crate) async fn view_users(
    AuthenticatedUser(identity): AuthenticatedUser,
    request: Request,
    next: Next,
) -> Response {
    authorize(&identity, Permission::ViewUsers, request, next).await
}

pub(crate) async fn create_user(
    AuthenticatedUser(identity): AuthenticatedUser,
    request: Request,
    next: Next,
) -> Response {
    authorize(&identity, Permission::CreateUser, request, next).await
}

// checks:
// - that the caller may edit users (listing roles is part of editing)
// - who may edit whom is decided by the domain hierarchy rules
pub(crate) async fn edit_user(
    AuthenticatedUser(identity): AuthenticatedUser,
    request: Request,
    next: Next,
) -> Response {
    authorize(&identity, Permission::EditUser, request, next).await
}

pub(crate) async fn reset_password(
    AuthenticatedUser(identity): AuthenticatedUser,
    request: Request,
    next: Next,
) -> Response {
    authorize(&identity, Permission::ResetPassword, request, next).await
}

pub(crate) async fn view_logs(
    AuthenticatedUser(identity): AuthenticatedUser,
    request: Request,
    next: Next,
) -> Response {
    authorize(&identity, Permission::ViewLogs, request, next).await
}
