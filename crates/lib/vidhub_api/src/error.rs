//! Application error types.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::{debug, error};
use vidhub_core::auth::AuthError;
use vidhub_core::graph::GraphError;
use vidhub_core::media::MediaError;
use vidhub_core::store::StoreError;

use crate::response::ErrorResponse;

/// Convenience alias for handler return types.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level errors with HTTP status mapping.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("Token issuance failed")]
    TokenIssuance(String),

    #[error("Internal server error")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Validation(m) => (StatusCode::BAD_REQUEST, m.as_str()),
            AppError::Conflict(m) => (StatusCode::CONFLICT, m.as_str()),
            AppError::Unauthorized(m) => (StatusCode::UNAUTHORIZED, m.as_str()),
            AppError::InvalidToken(m) => (StatusCode::UNAUTHORIZED, m.as_str()),
            AppError::NotFound(m) => (StatusCode::NOT_FOUND, m.as_str()),
            AppError::PayloadTooLarge(m) => (StatusCode::PAYLOAD_TOO_LARGE, m.as_str()),
            AppError::UnsupportedMediaType(m) => (StatusCode::UNSUPPORTED_MEDIA_TYPE, m.as_str()),
            AppError::TokenIssuance(cause) => {
                error!(%cause, "token issuance failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Token issuance failed")
            }
            AppError::Internal(cause) => {
                error!(%cause, "internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };
        let body = Json(ErrorResponse {
            status_code: status.as_u16(),
            message: message.to_string(),
            success: false,
        });
        (status, body).into_response()
    }
}

// Parser detail stays in the log, never in the reply.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        debug!(reason = %rejection.body_text(), "request body rejected");
        match rejection.status() {
            StatusCode::PAYLOAD_TOO_LARGE => AppError::PayloadTooLarge("Request body is too large".into()),
            StatusCode::UNSUPPORTED_MEDIA_TYPE => {
                AppError::UnsupportedMediaType("Expected a JSON request body".into())
            }
            _ => AppError::Validation("Malformed JSON request body".into()),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DuplicateKey { .. } => {
                AppError::Conflict("User with email or username already exists".into())
            }
            _ => AppError::Internal(e.to_string()),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::CredentialError => AppError::Unauthorized("Invalid user credentials".into()),
            AuthError::Unauthorized(msg) => AppError::Unauthorized(msg),
            AuthError::InvalidToken(msg) => AppError::InvalidToken(msg),
            AuthError::TokenIssuance(cause) => AppError::TokenIssuance(cause),
            AuthError::ValidationError(msg) => AppError::Validation(msg),
            AuthError::Conflict(msg) => AppError::Conflict(msg),
            AuthError::NotFound(msg) => AppError::NotFound(msg),
            AuthError::Store(e) => AppError::from(e),
            AuthError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

impl From<GraphError> for AppError {
    fn from(e: GraphError) -> Self {
        match e {
            GraphError::Validation(msg) => AppError::Validation(msg),
            GraphError::NotFound(msg) => AppError::NotFound(msg),
            GraphError::Store(e) => AppError::from(e),
        }
    }
}

impl From<MediaError> for AppError {
    fn from(e: MediaError) -> Self {
        match e {
            MediaError::NotFound(path) => AppError::Validation(format!("File not found: {path}")),
            MediaError::Upload(cause) => AppError::Internal(cause),
        }
    }
}
