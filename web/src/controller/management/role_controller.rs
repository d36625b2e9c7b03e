use crate::controller::ApiResponse;
use crate::{AppState, Error};
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use domain::{roles, user as UserApi};

/// GET every role with its permissions, to fill the role picker when editing a user
#[utoipa::path(
    get,
    path = "/api/management/roles",
    responses(
        (status = 200, description = "Roles and their permissions", body = [roles::Model]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Missing EDIT_USER")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn index(State(app_state): State<AppState>) -> Result<impl IntoResponse, Error> {
    let roles = UserApi::roles(app_state.db_conn_ref()).await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), roles)))
}
