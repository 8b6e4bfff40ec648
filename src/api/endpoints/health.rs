//! Health check endpoint.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, ApiResponse};

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// `GET /api/health`: liveness plus a database round trip.
pub async fn check(
    State(ctx): State<ApiContext>,
) -> Result<Json<ApiResponse<HealthResponse>>, ApiError> {
    let conn = ctx.core.conn().await?;
    conn.query_row("SELECT 1", [], |_| Ok(()))?;

    Ok(ApiResponse::ok(HealthResponse {
        status: "ok",
        version: crate::config::APP_VERSION,
    }))
}
