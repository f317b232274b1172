use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use gridwatch_api::background::quality_monitor::QualityMonitor;
use gridwatch_api::config::{LogFormat, MonitorConfig, ServerConfig};
use gridwatch_api::engine::{PgQualityStore, QualityService};
use gridwatch_api::router::build_app_router;
use gridwatch_api::state::AppState;
use gridwatch_api::ws::WsManager;
use gridwatch_events::EventBus;

/// Test `ServerConfig` matching the local development defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        log_format: LogFormat::Text,
        monitor: MonitorConfig::default(),
    }
}

/// Build the production router over the given pool.
pub fn build_test_app(pool: PgPool) -> Router {
    let config = test_config();
    let quality = Arc::new(QualityService::new(Arc::new(PgQualityStore::new(pool))));
    let event_bus = Arc::new(EventBus::default());
    let monitor = Arc::new(QualityMonitor::new(
        Arc::clone(&quality),
        Arc::clone(&event_bus),
        config.monitor.clone(),
    ));

    let state = AppState {
        config: Arc::new(config.clone()),
        quality,
        monitor,
        ws_manager: Arc::new(WsManager::new()),
        event_bus,
    };
    build_app_router(state, &config)
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn send_json(
    app: Router,
    method: Method,
    uri: &str,
    body: serde_json::Value,
) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
    .unwrap()
}

pub async fn post_empty(app: Router, uri: &str) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
