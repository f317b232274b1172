//! Route definitions for the quality endpoints.

use axum::routing::{get, patch, post, put};
use axum::Router;

use crate::handlers::{monitoring, quality};
use crate::state::AppState;

/// Routes mounted at `/quality`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(quality::get_dashboard))
        .route("/run-check", post(quality::run_check))
        .route("/summary", get(quality::get_summary))
        .route("/metrics", get(quality::list_metrics))
        .route("/trends", get(quality::list_trends))
        .route("/issues", get(quality::list_issues))
        .route("/issues/{id}/resolve", put(quality::resolve_issue))
        .route(
            "/rules",
            get(quality::list_rules).post(quality::create_rule),
        )
        .route("/rules/{id}", patch(quality::update_rule))
        .route("/monitoring/status", get(monitoring::get_status))
        .route("/monitoring/start", post(monitoring::start))
        .route("/monitoring/stop", post(monitoring::stop))
        .route(
            "/monitoring/immediate-check",
            post(monitoring::immediate_check),
        )
}
