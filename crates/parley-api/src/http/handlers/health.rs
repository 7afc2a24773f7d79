//! Liveness probe.

use std::time::Instant;

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use crate::http::error::AppError;
use crate::http::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub version: &'static str,
}

/// GET /api/v1/health - Liveness check, including a database round trip.
pub async fn health(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<HealthStatus>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let status = match database_reachable(&state).await {
        true => "ok",
        false => "degraded",
    };

    let elapsed = start.elapsed().as_millis() as u64;
    let body = HealthStatus {
        status,
        version: env!("CARGO_PKG_VERSION"),
    };
    Ok(Json(
        ApiResponse::success(body, request_id, elapsed).with_link("self", "/api/v1/health"),
    ))
}

async fn database_reachable(state: &AppState) -> bool {
    match state.db_pool.ping().await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!("health check database ping failed: {e}");
            false
        }
    }
}
