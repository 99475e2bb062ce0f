use serde::Serialize;
use thiserror::Error;

use crate::auth::AuthHeaderError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Event not found")]
    NotFound,

    #[error("Unauthorized: {0}")]
    Auth(#[from] AuthHeaderError),

    #[error("Unauthorized: invalid API key")]
    InvalidApiKey,

    #[error("Invalid input: {0}")]
    BadRequest(String),

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        use axum::http::StatusCode;

        let (status, message) = match &self {
            AppError::NotFound => (StatusCode::NOT_FOUND, self.to_string()),
            AppError::Auth(_) | AppError::InvalidApiKey => {
                (StatusCode::UNAUTHORIZED, self.to_string())
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Storage(e) => {
                tracing::error!("Storage error: {e}");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
            AppError::Json(e) => {
                tracing::error!("JSON error: {e}");
                (StatusCode::BAD_REQUEST, format!("Invalid JSON: {e}"))
            }
        };

        let body = axum::Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}
