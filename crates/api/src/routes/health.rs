use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// `ok` or `degraded`.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    pub db_healthy: bool,
    pub monitor_running: bool,
    pub ws_connections: usize,
}

/// GET /health -- returns service and database health.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_healthy = state.quality.ping().await.is_ok();
    let status = if db_healthy { "ok" } else { "degraded" };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        db_healthy,
        monitor_running: state.monitor.get_monitoring_status().await.is_running,
        ws_connections: state.ws_manager.connection_count().await,
    })
}

/// Mount health check routes (intended for root-level, NOT under `/api/v1`).
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
