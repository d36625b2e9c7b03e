use crate::controller::ApiResponse;
use crate::params::tracking_code::{ConfirmParams, GenerateParams};
use crate::{AppState, Error};
use axum::extract::{Path, State};
use axum::{http::StatusCode, response::IntoResponse, Json};
use domain::{packages, tracking_code as TrackingCodeApi};
use log::*;

/// POST to propose the next unused tracking codes. Nothing is reserved until confirmed.
#[utoipa::path(
    post,
    path = "/api/tracking-codes/generate",
    request_body = GenerateParams,
    responses(
        (status = 200, description = "Proposed codes", body = [String]),
        (status = 400, description = "Quantity is not positive or exceeds the batch limit"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Missing GENERATE_QR_CODES")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn generate(
    State(app_state): State<AppState>,
    Json(params): Json<GenerateParams>,
) -> Result<impl IntoResponse, Error> {
    debug!("Generating {} tracking code(s)", params.quantity);

    let codes = TrackingCodeApi::generate(app_state.db_conn_ref(), params.quantity).await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), codes)))
}

/// POST printed codes so they are recorded as pending packages
#[utoipa::path(
    post,
    path = "/api/tracking-codes/confirm",
    request_body = ConfirmParams,
    responses(
        (status = 201, description = "Codes recorded as pending packages", body = [packages::Model]),
        (status = 400, description = "Empty list"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Missing GENERATE_QR_CODES"),
        (status = 409, description = "A code was already issued; nothing was saved")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn confirm(
    State(app_state): State<AppState>,
    Json(params): Json<ConfirmParams>,
) -> Result<impl IntoResponse, Error> {
    let packages = TrackingCodeApi::confirm(app_state.db_conn_ref(), params.tracking_ids).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(StatusCode::CREATED.into(), packages)),
    ))
}

/// GET a previously issued code, including packages that already left, for reprinting
#[utoipa::path(
    get,
    path = "/api/tracking-codes/{trackingId}",
    params(
        ("trackingId" = String, Path, description = "Tracking code, e.g. CG000001")
    ),
    responses(
        (status = 200, description = "The package behind the code", body = packages::Model),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Missing GENERATE_QR_CODES"),
        (status = 404, description = "The code was never issued")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn read(
    State(app_state): State<AppState>,
    Path(tracking_id): Path<String>,
) -> Result<impl IntoResponse, Error> {
    let package = TrackingCodeApi::find(app_state.db_conn_ref(), &tracking_id).await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), package)))
}
