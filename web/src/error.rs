use std::error::Error as StdError;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use domain::error::{DomainErrorKind, EntityErrorKind, Error as DomainError, InternalErrorKind};

extern crate log;
use log::*;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug)]
pub struct Error(DomainError);

impl StdError for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> core::result::Result<(), std::fmt::Error> {
        write!(fmt, "{self:?}")
    }
}

impl Error {
    /// Status and client-safe message. Internal details never leave the server.
    fn status_and_message(&self) -> (StatusCode, String) {
        match &self.0.error_kind {
            DomainErrorKind::Validation(message) => (StatusCode::BAD_REQUEST, message.clone()),
            DomainErrorKind::Conflict(message) => (StatusCode::CONFLICT, message.clone()),
            DomainErrorKind::Forbidden(message) => (StatusCode::FORBIDDEN, message.clone()),
            DomainErrorKind::Internal(InternalErrorKind::Entity(entity_error_kind)) => {
                match entity_error_kind {
                    EntityErrorKind::NotFound => (StatusCode::NOT_FOUND, "Not found".to_owned()),
                    EntityErrorKind::Invalid => {
                        (StatusCode::BAD_REQUEST, "Invalid request".to_owned())
                    }
                    EntityErrorKind::Unauthenticated => {
                        (StatusCode::UNAUTHORIZED, "Unauthorized".to_owned())
                    }
                    EntityErrorKind::Conflict => (StatusCode::CONFLICT, "Conflict".to_owned()),
                    EntityErrorKind::DbTransaction | EntityErrorKind::Other(_) => internal(),
                }
            }
            DomainErrorKind::Internal(_) => internal(),
        }
    }
}

fn internal() -> (StatusCode, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".to_owned(),
    )
}

// List of possible StatusCode variants https://docs.rs/http/latest/http/status/struct.StatusCode.html#associatedconstant.UNPROCESSABLE_ENTITY
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();

        if status.is_server_error() {
            error!("Request failed: {:?} (source: {:?})", self.0.error_kind, self.0.source);
        } else {
            debug!("Request rejected with {status}: {message}");
        }

        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl<E> From<E> for Error
where
    E: Into<DomainError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
