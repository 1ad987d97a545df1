use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::forms::ValidationErrors;
use crate::location::LocationError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("backend unreachable: {0}")]
    Transport(String),

    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("not signed in")]
    Unauthorized,

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("unexpected response from {endpoint}: {reason}")]
    Decode { endpoint: String, reason: String },

    #[error(transparent)]
    Location(#[from] LocationError),

    #[error("validation failed")]
    Validation(ValidationErrors),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Transport(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = self.to_string();

        let (status, body) = match &self {
            AppError::Transport(_) => (StatusCode::BAD_GATEWAY, json!({ "error": message })),
            AppError::Rejected { status, .. } => (
                StatusCode::from_u16(*status)
                    .ok()
                    .filter(|code| code.is_client_error() || code.is_server_error())
                    .unwrap_or(StatusCode::BAD_GATEWAY),
                json!({ "error": message }),
            ),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, json!({ "error": message })),
            AppError::Forbidden(_) => (StatusCode::FORBIDDEN, json!({ "error": message })),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, json!({ "error": message })),
            AppError::Conflict(_) => (StatusCode::CONFLICT, json!({ "error": message })),
            AppError::Decode { .. } => (StatusCode::BAD_GATEWAY, json!({ "error": message })),
            AppError::Location(_) => (StatusCode::CONFLICT, json!({ "error": message })),
            AppError::Validation(fields) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({ "error": message, "fields": fields }),
            ),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, json!({ "error": message })),
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": message }),
            ),
        };

        (status, Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
