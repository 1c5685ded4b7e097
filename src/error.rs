use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

use crate::users::services::ServiceError;

/// Error surfaced by a handler; rendered as JSON.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Request body that could not be decoded.
    #[error("{0}")]
    Decode(String),
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    Service(#[from] ServiceError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Decode(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Service(e) => match e {
                ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
                ServiceError::Unauthorized => StatusCode::UNAUTHORIZED,
                ServiceError::NotFound => StatusCode::NOT_FOUND,
                ServiceError::Store(_) | ServiceError::Password(_) | ServiceError::Token(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }
        let body = match self {
            ApiError::Service(ServiceError::Validation(errors)) => json!({ "errors": errors }),
            other => json!({ "error": other.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}
