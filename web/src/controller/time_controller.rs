use crate::controller::ApiResponse;
use crate::response::time::ServerTime;
use crate::{AppState, Error};
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;

/// GET the server clock in the display time zone, so kiosks and handhelds agree on "now"
#[utoipa::path(
    get,
    path = "/public/time",
    responses(
        (status = 200, description = "Current server time", body = ServerTime),
    )
)]
pub async fn server_time(State(app_state): State<AppState>) -> Result<impl IntoResponse, Error> {
    let now = Utc::now().with_timezone(&app_state.display_timezone);

    Ok(Json(ApiResponse::new(
        StatusCode::OK.into(),
        ServerTime::from(now),
    )))
}
