use crate::controller::ApiResponse;
use crate::extractors::authenticated_user::AuthenticatedUser;
use crate::params::package::{EntryParams, ExitParams, MoveParams};
use crate::{AppState, Error};
use axum::extract::{Path, State};
use axum::{http::StatusCode, response::IntoResponse, Json};
use domain::package::{self as PackageApi, MoveOutcome};
use domain::{packages, Id};
use log::*;

/// POST a package into a buffer
#[utoipa::path(
    post,
    path = "/api/entry",
    request_body = EntryParams,
    responses(
        (status = 201, description = "Package entered the queue", body = packages::Model),
        (status = 400, description = "Missing field, unknown buffer or invalid profile"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Missing MANAGE_FIFO"),
        (status = 409, description = "The package is already queued")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn entry(
    AuthenticatedUser(identity): AuthenticatedUser,
    State(app_state): State<AppState>,
    Json(params): Json<EntryParams>,
) -> Result<impl IntoResponse, Error> {
    debug!("ENTRY {} into {} by {}", params.tracking_id, params.buffer, identity.username);

    let package = PackageApi::enter(
        app_state.db_conn_ref(),
        &app_state.events,
        &identity,
        params.into(),
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(StatusCode::CREATED.into(), package)),
    ))
}

/// POST a package out of the queue
#[utoipa::path(
    post,
    path = "/api/exit",
    request_body = ExitParams,
    responses(
        (status = 200, description = "Package left the queue", body = packages::Model),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Missing MANAGE_FIFO"),
        (status = 404, description = "No active package with that code"),
        (status = 409, description = "The package never entered a buffer")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn exit(
    AuthenticatedUser(identity): AuthenticatedUser,
    State(app_state): State<AppState>,
    Json(params): Json<ExitParams>,
) -> Result<impl IntoResponse, Error> {
    debug!("EXIT {} by {}", params.tracking_id, identity.username);

    let package = PackageApi::exit(
        app_state.db_conn_ref(),
        &app_state.events,
        &identity,
        &params.tracking_id,
    )
    .await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), package)))
}

/// PUT a package at another location
#[utoipa::path(
    put,
    path = "/api/packages/{id}/move",
    params(
        ("id" = sea_orm::prelude::Uuid, Path, description = "Package id")
    ),
    request_body = MoveParams,
    responses(
        (status = 200, description = "Package moved, or already at that location", body = packages::Model),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Missing MOVE_PACKAGE"),
        (status = 404, description = "No active package with that id")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn move_package(
    AuthenticatedUser(identity): AuthenticatedUser,
    State(app_state): State<AppState>,
    Path(id): Path<Id>,
    Json(params): Json<MoveParams>,
) -> Result<impl IntoResponse, Error> {
    debug!("MOVE package {id} to {} by {}", params.location, identity.username);

    let outcome = PackageApi::move_to(
        app_state.db_conn_ref(),
        &app_state.events,
        &identity,
        id,
        &params.location,
    )
    .await?;

    let package = match outcome {
        MoveOutcome::Moved(package) | MoveOutcome::Unchanged(package) => package,
    };

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), package)))
}
