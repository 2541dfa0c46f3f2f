//! Health check handlers

use super::types::HealthResponse;
use crate::AppState;
use axum::{extract::State, response::Json};

/// Service banner for the root path
pub async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "Delver Research API",
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "Health",
    summary = "Health check",
    description = "Check the server health status",
    responses(
        (status = 200, description = "Server is healthy", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        engine_ready: state.is_ready(),
        websocket_enabled: true,
    })
}
