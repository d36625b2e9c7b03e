use crate::controller::ApiResponse;
use crate::params::audit_log::IndexParams;
use crate::{AppState, Error};
use axum::extract::{Query, State};
use axum::{http::StatusCode, response::IntoResponse, Json};
use domain::{audit_log as AuditLogApi, audit_logs};
use log::*;

/// GET audit entries, newest first
#[utoipa::path(
    get,
    path = "/api/management/logs",
    params(IndexParams),
    responses(
        (status = 200, description = "Matching audit entries", body = [audit_logs::Model]),
        (status = 400, description = "Unknown action or malformed date range"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Missing VIEW_LOGS")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn index(
    State(app_state): State<AppState>,
    Query(params): Query<IndexParams>,
) -> Result<impl IntoResponse, Error> {
    debug!("GET audit logs with filters {params:?}");

    let logs = AuditLogApi::find_by(
        app_state.db_conn_ref(),
        params.into(),
        app_state.display_timezone,
    )
    .await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), logs)))
}
