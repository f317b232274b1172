pub mod health;
pub mod quality;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;
use crate::ws;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /ws                                   WebSocket push channel
///
/// /quality/dashboard                    dashboard view
/// /quality/run-check                    background pass (POST, 202)
/// /quality/metrics                      latest metric per (table, metric)
/// /quality/issues                       list issues
/// /quality/issues/{id}/resolve          resolve (PUT)
/// /quality/trends                       trend rows
/// /quality/summary                      live summary
/// /quality/rules                        list, create
/// /quality/rules/{id}                   activate / deactivate (PATCH)
/// /quality/monitoring/status            monitor state
/// /quality/monitoring/start             start schedule (POST)
/// /quality/monitoring/stop              stop schedule (POST)
/// /quality/monitoring/immediate-check   inline pass (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/ws", get(ws::ws_handler))
        .nest("/quality", quality::router())
}
