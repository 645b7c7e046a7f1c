//! Healthcheck endpoint.

use crate::models::HealthResponse;
use crate::response::ApiResponse;

/// `GET /api/v1/healthcheck` — liveness probe with the core version.
pub async fn healthcheck_handler() -> ApiResponse<HealthResponse> {
    ApiResponse::ok(
        HealthResponse {
            status: "ok",
            version: vidhub_core::version(),
        },
        "Service is healthy",
    )
}
