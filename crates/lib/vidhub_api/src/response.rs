//! Response envelopes.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Success envelope: `{statusCode, data, message, success: true}`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub status_code: u16,
    pub data: T,
    pub message: String,
    pub success: bool,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(status: StatusCode, data: T, message: impl Into<String>) -> Self {
        Self {
            status_code: status.as_u16(),
            data,
            message: message.into(),
            success: status.as_u16() < 400,
        }
    }

    /// `200 OK` envelope.
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self::new(StatusCode::OK, data, message)
    }

    /// `201 Created` envelope.
    pub fn created(data: T, message: impl Into<String>) -> Self {
        Self::new(StatusCode::CREATED, data, message)
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::OK);
        (status, Json(self)).into_response()
    }
}

/// Failure envelope: `{statusCode, message, success: false}`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub status_code: u16,
    pub message: String,
    pub success: bool,
}

/// Empty `data` payload.
#[derive(Debug, Serialize)]
pub struct Empty {}
