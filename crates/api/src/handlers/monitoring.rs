//! Handlers for controlling the background quality monitor.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::background::quality_monitor::{ImmediateCheckOutcome, MonitoringStatus};
use crate::response::DataResponse;
use crate::state::AppState;

/// Result of a start or stop request.
#[derive(Debug, Serialize)]
pub struct MonitoringToggle {
    /// `false` when the monitor was already in the requested state.
    pub changed: bool,
    pub status: MonitoringStatus,
}

/// GET /quality/monitoring/status
pub async fn get_status(State(state): State<AppState>) -> Json<DataResponse<MonitoringStatus>> {
    Json(DataResponse {
        data: state.monitor.get_monitoring_status().await,
    })
}

/// POST /quality/monitoring/start
pub async fn start(State(state): State<AppState>) -> Json<DataResponse<MonitoringToggle>> {
    let changed = state.monitor.start_monitoring().await;
    Json(DataResponse {
        data: MonitoringToggle {
            changed,
            status: state.monitor.get_monitoring_status().await,
        },
    })
}

/// POST /quality/monitoring/stop
pub async fn stop(State(state): State<AppState>) -> Json<DataResponse<MonitoringToggle>> {
    let changed = state.monitor.stop_monitoring().await;
    Json(DataResponse {
        data: MonitoringToggle {
            changed,
            status: state.monitor.get_monitoring_status().await,
        },
    })
}

/// POST /quality/monitoring/immediate-check
///
/// Runs a pass inline. A failed pass is still a 200 with
/// `status: "failed"` in the body.
pub async fn immediate_check(
    State(state): State<AppState>,
) -> Json<DataResponse<ImmediateCheckOutcome>> {
    Json(DataResponse {
        data: state.monitor.run_immediate_check().await,
    })
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};

    use crate::test_support::{send, TestApp};

    const START: &str = "/api/v1/quality/monitoring/start";
    const STOP: &str = "/api/v1/quality/monitoring/stop";

    #[tokio::test]
    async fn start_stop_cycle_reports_changes() {
        let app = TestApp::new();

        let (status, body) = send(app.router(), Method::POST, START, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["changed"], true);
        assert_eq!(body["data"]["status"]["is_running"], true);

        let (_, body) = send(app.router(), Method::POST, START, None).await;
        assert_eq!(body["data"]["changed"], false);

        let (_, body) = send(app.router(), Method::POST, STOP, None).await;
        assert_eq!(body["data"]["changed"], true);
        assert_eq!(body["data"]["status"]["is_running"], false);

        let (_, body) = send(app.router(), Method::POST, STOP, None).await;
        assert_eq!(body["data"]["changed"], false);
    }

    #[tokio::test]
    async fn status_reports_configuration() {
        let app = TestApp::new();
        let (status, body) = send(
            app.router(),
            Method::GET,
            "/api/v1/quality/monitoring/status",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["is_running"], false);
        assert_eq!(body["data"]["check_interval_minutes"], 60);
        assert_eq!(body["data"]["alert_threshold"], 70.0);
        assert!(body["data"]["last_check_at"].is_null());
    }

    #[tokio::test]
    async fn immediate_check_returns_outcome_inline() {
        let app = TestApp::new();
        let (status, body) = send(
            app.router(),
            Method::POST,
            "/api/v1/quality/monitoring/immediate-check",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "completed");
        assert_eq!(body["data"]["overall_score"], 0.0);

        app.store.fail_loads(true);
        let (status, body) = send(
            app.router(),
            Method::POST,
            "/api/v1/quality/monitoring/immediate-check",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "failed");
        assert!(body["data"]["error"].is_string());
    }
}
