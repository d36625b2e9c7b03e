//! Read-only views of the FIFO queue. The same handlers serve the public kiosk routes and
//! the authenticated `/api` routes.

use crate::controller::ApiResponse;
use crate::response::queue::{BacklogCount, BufferCounts, QueuedPackage};
use crate::{AppState, Error};
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;
use domain::queue;
use hub::queue_state;
use log::*;

/// GET the queued packages, oldest entry first
#[utoipa::path(
    get,
    path = "/api/fifo-queue",
    responses(
        (status = 200, description = "Queued packages in FIFO order", body = [QueuedPackage]),
        (status = 401, description = "Unauthorized"),
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn fifo_queue(State(app_state): State<AppState>) -> Result<impl IntoResponse, Error> {
    let packages = queue::find_queue(app_state.db_conn_ref()).await?;
    debug!("Found {} queued package(s)", packages.len());

    let items: Vec<QueuedPackage> = packages.into_iter().map(QueuedPackage::from).collect();
    Ok(Json(ApiResponse::new(StatusCode::OK.into(), items)))
}

/// GET how many packages are waiting to ship and their summed value
#[utoipa::path(
    get,
    path = "/api/backlog-count",
    responses(
        (status = 200, description = "Backlog count and value", body = BacklogCount),
        (status = 401, description = "Unauthorized"),
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn backlog_count(State(app_state): State<AppState>) -> Result<impl IntoResponse, Error> {
    let backlog = queue::backlog(app_state.db_conn_ref()).await?;

    Ok(Json(ApiResponse::new(
        StatusCode::OK.into(),
        BacklogCount::from(backlog),
    )))
}

/// GET per-buffer counts, values and average dwell times
#[utoipa::path(
    get,
    path = "/api/buffer-counts",
    responses(
        (status = 200, description = "Per-buffer statistics", body = BufferCounts),
        (status = 401, description = "Unauthorized"),
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn buffer_counts(State(app_state): State<AppState>) -> Result<impl IntoResponse, Error> {
    let db = app_state.db_conn_ref();
    let totals = queue::buffer_totals(db).await?;
    // Dwell times come from the same computation the live queue_update messages use
    let state = queue_state::compute(queue::find_queue(db).await?, Utc::now());

    Ok(Json(ApiResponse::new(
        StatusCode::OK.into(),
        BufferCounts::new(totals, state.buffer_avg_times),
    )))
}
