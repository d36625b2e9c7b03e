use crate::controller::ApiResponse;
use crate::params::user_session::Credentials;
use crate::response::user_session::LoginResponse;
use crate::{AppState, Error};
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use domain::identity;
use log::*;

/// Logs the user into the platform and returns a signed access token.
///
/// After logging in successfully, pass the token back on every API call, e.g.:
/// curl --header "Authorization: Bearer <token>" http://localhost:8080/api/fifo-queue
///
/// Browser WebSocket clients pass it as a query parameter instead:
/// ws://localhost:8080/api/ws?token=<token>
#[utoipa::path(
    post,
    path = "/login",
    request_body = Credentials,
    responses(
        (status = 200, description = "Logs in and returns an access token", body = LoginResponse),
        (status = 401, description = "Unknown username or wrong password"),
        (status = 405, description = "Method not allowed")
    )
)]
pub async fn login(
    State(app_state): State<AppState>,
    Json(creds): Json<Credentials>,
) -> Result<impl IntoResponse, Error> {
    debug!("Login attempt for {}", creds.username);

    let (jwt, identity) = identity::login(
        app_state.db_conn_ref(),
        &app_state.token_authority,
        &creds.username,
        &creds.password,
    )
    .await?;

    Ok(Json(ApiResponse::new(
        StatusCode::OK.into(),
        LoginResponse::new(jwt, identity),
    )))
}
