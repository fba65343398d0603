use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use parley_chat::ChatError;
use parley_persist::StoreError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Chat(#[from] ChatError),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Internal server error")]
    Internal,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            ApiError::Chat(ChatError::Validation(_)) => (StatusCode::BAD_REQUEST, self.to_string()),
            // Absence and foreign ownership share one response on purpose
            ApiError::Chat(ChatError::AccessDenied) => (StatusCode::NOT_FOUND, self.to_string()),
            ApiError::Chat(ChatError::Agent(ref e)) => {
                tracing::error!("Agent error: {}", e);
                (StatusCode::BAD_GATEWAY, "Agent error".to_string())
            }
            ApiError::Chat(ChatError::Cancelled) => {
                (StatusCode::REQUEST_TIMEOUT, self.to_string())
            }
            ApiError::Chat(ChatError::Store(ref e)) | ApiError::Store(ref e) => {
                tracing::error!("Storage error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Storage error".to_string())
            }
            ApiError::Internal => {
                tracing::error!("Internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
