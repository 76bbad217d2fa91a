use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::flyers::UploadError;

/// Failures raised by the event and guest registries.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Event with this title already exists.")]
    Conflict(String),
    #[error("{0} not found")]
    NotFound(&'static str),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unprocessable(String),
    #[error(transparent)]
    Validation(#[from] validator::ValidationErrors),
    #[error(transparent)]
    Upload(#[from] UploadError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            AppError::Store(StoreError::NotFound(what)) => {
                (StatusCode::NOT_FOUND, format!("{what} not found"))
            }
            AppError::Store(err @ StoreError::Conflict(_)) => (StatusCode::CONFLICT, err.to_string()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Unprocessable(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            AppError::Validation(errors) => (StatusCode::UNPROCESSABLE_ENTITY, errors.to_string()),
            AppError::Upload(err @ UploadError::InvalidName(_)) => {
                (StatusCode::UNPROCESSABLE_ENTITY, err.to_string())
            }
            AppError::Upload(err @ UploadError::Body(_)) => (StatusCode::BAD_REQUEST, err.to_string()),
            AppError::Upload(e) => {
                error!("flyer upload failed: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "could not store flyer".to_string())
            }
        };
        (status, Json(json!({ "detail": detail }))).into_response()
    }
}
