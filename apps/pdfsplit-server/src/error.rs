//! Error types for the pdfsplit server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use pdfsplit_core::PdfSplitError;
use serde_json::json;
use thiserror::Error;

/// Server error types
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<PdfSplitError> for ApiError {
    fn from(err: PdfSplitError) -> Self {
        match err {
            PdfSplitError::NotFound(msg) => ApiError::NotFound(msg),
            PdfSplitError::Validation(msg) => ApiError::BadRequest(msg),
            PdfSplitError::Internal(msg) => ApiError::Internal(msg),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "detail": message,
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}
