use axum::Json;
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use nerfr_core::NerError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Errors returned by request handlers. Every variant renders as
/// `{"error": "..."}` with a matching status code.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    UnsupportedMediaType(String),

    #[error(transparent)]
    Json(#[from] JsonRejection),

    #[error(transparent)]
    MultipartRejection(#[from] MultipartRejection),

    #[error(transparent)]
    Multipart(#[from] MultipartError),

    #[error("inference failed: {0}")]
    Inference(#[from] NerError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::Json(_) => StatusCode::BAD_REQUEST,
            Self::MultipartRejection(rejection) => rejection.status(),
            Self::Multipart(err) => err.status(),
            Self::Inference(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            Self::Json(rejection) => rejection.body_text(),
            Self::MultipartRejection(rejection) => rejection.body_text(),
            Self::Multipart(err) => err.body_text(),
            other => other.to_string(),
        };
        if status.is_server_error() {
            error!(%status, error = %message, "request failed");
        }
        (status, Json(json!({ "error": message }))).into_response()
    }
}
