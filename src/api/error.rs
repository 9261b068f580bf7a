use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::logic::MissingReferences;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Failures reported to API clients
#[derive(Debug, Error)]
pub enum ApiError {
    /// The target of the request does not exist
    #[error("{0}")]
    NotFound(String),
    /// One or more referenced records do not exist
    #[error("{0}")]
    MissingReferences(MissingReferences),
    /// A created record points at a person with the wrong role and was removed again
    #[error("{0}")]
    RoleConflict(String),
    #[error("{0}")]
    BadRequest(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) | ApiError::MissingReferences(_) => StatusCode::NOT_FOUND,
            ApiError::RoleConflict(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl From<MissingReferences> for ApiError {
    fn from(missing: MissingReferences) -> Self {
        ApiError::MissingReferences(missing)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let payload = Json(ErrorResponse {
            error: self.to_string(),
        });
        (status, payload).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Translate store and resolver failures at the route boundary.
/// The underlying error is logged; clients only see the route's message.
pub trait OrApiError<T> {
    fn or_not_found(self, message: &str) -> ApiResult<T>;
    fn or_bad_request(self, message: &str) -> ApiResult<T>;
}

impl<T> OrApiError<T> for anyhow::Result<T> {
    fn or_not_found(self, message: &str) -> ApiResult<T> {
        self.map_err(|err| {
            log::error!("{}: {:#}", message, err);
            ApiError::NotFound(message.to_string())
        })
    }

    fn or_bad_request(self, message: &str) -> ApiResult<T> {
        self.map_err(|err| {
            log::error!("{}: {:#}", message, err);
            ApiError::BadRequest(message.to_string())
        })
    }
}
