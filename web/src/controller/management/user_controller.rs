use crate::controller::ApiResponse;
use crate::extractors::authenticated_user::AuthenticatedUser;
use crate::params::user::{CreateParams, ResetPasswordParams, UpdateParams};
use crate::{AppState, Error};
use axum::extract::{Path, State};
use axum::{http::StatusCode, response::IntoResponse, Json};
use domain::{user as UserApi, users, Id};
use log::*;

/// CREATE a new User
#[utoipa::path(
    post,
    path = "/api/management/users",
    request_body = CreateParams,
    responses(
        (status = 201, description = "Successfully created a new User", body = users::Model),
        (status = 400, description = "Missing field or unknown role"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Missing CREATE_USER"),
        (status = 409, description = "Username already taken")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create(
    AuthenticatedUser(identity): AuthenticatedUser,
    State(app_state): State<AppState>,
    Json(params): Json<CreateParams>,
) -> Result<impl IntoResponse, Error> {
    debug!("CREATE new User {} by {}", params.username, identity.username);

    let user = UserApi::create(app_state.db_conn_ref(), params.into()).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(StatusCode::CREATED.into(), user)),
    ))
}

/// GET all Users with their roles
#[utoipa::path(
    get,
    path = "/api/management/users",
    responses(
        (status = 200, description = "Every user with its role", body = [users::Model]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Missing VIEW_USERS")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn index(State(app_state): State<AppState>) -> Result<impl IntoResponse, Error> {
    let users = UserApi::list(app_state.db_conn_ref()).await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), users)))
}

/// UPDATE another User's name, role or department
#[utoipa::path(
    put,
    path = "/api/management/users/{id}",
    params(
        ("id" = sea_orm::prelude::Uuid, Path, description = "Id of the user to update")
    ),
    request_body = UpdateParams,
    responses(
        (status = 200, description = "Successfully updated the User", body = users::Model),
        (status = 400, description = "Unknown role"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Missing EDIT_USER, or the target is outside the caller's reach"),
        (status = 404, description = "User not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update(
    AuthenticatedUser(identity): AuthenticatedUser,
    State(app_state): State<AppState>,
    Path(id): Path<Id>,
    Json(params): Json<UpdateParams>,
) -> Result<impl IntoResponse, Error> {
    let user = UserApi::update(app_state.db_conn_ref(), &identity, id, params.into()).await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), user)))
}

/// RESET another User's password
#[utoipa::path(
    put,
    path = "/api/management/users/{id}/reset-password",
    params(
        ("id" = sea_orm::prelude::Uuid, Path, description = "Id of the user whose password is reset")
    ),
    request_body = ResetPasswordParams,
    responses(
        (status = 204, description = "Password reset"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Missing RESET_PASSWORD, or the target is outside the caller's reach"),
        (status = 404, description = "User not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn reset_password(
    AuthenticatedUser(identity): AuthenticatedUser,
    State(app_state): State<AppState>,
    Path(id): Path<Id>,
    Json(params): Json<ResetPasswordParams>,
) -> Result<impl IntoResponse, Error> {
    UserApi::reset_password(app_state.db_conn_ref(), &identity, id, params.new_password).await?;

    Ok(Json(ApiResponse::<()>::no_content(
        StatusCode::NO_CONTENT.into(),
    )))
}
