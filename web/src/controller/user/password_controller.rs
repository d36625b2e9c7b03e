use crate::controller::ApiResponse;
use crate::extractors::authenticated_user::AuthenticatedUser;
use crate::params::user::ChangePasswordParams;
use crate::{AppState, Error};
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use domain::user as UserApi;
use log::*;

/// CHANGE the caller's own password
#[utoipa::path(
    put,
    path = "/api/user/change-password",
    request_body = ChangePasswordParams,
    responses(
        (status = 204, description = "Password changed"),
        (status = 400, description = "Missing field"),
        (status = 401, description = "Unauthorized, or the old password is wrong")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn change_password(
    AuthenticatedUser(identity): AuthenticatedUser,
    State(app_state): State<AppState>,
    Json(params): Json<ChangePasswordParams>,
) -> Result<impl IntoResponse, Error> {
    UserApi::change_password(
        app_state.db_conn_ref(),
        identity.user_id,
        &params.old_password,
        params.new_password,
    )
    .await?;
    info!("{} changed their password", identity.username);

    Ok(Json(ApiResponse::<()>::no_content(
        StatusCode::NO_CONTENT.into(),
    )))
}
