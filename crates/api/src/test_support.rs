//! Shared fixtures for handler tests.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use gridwatch_events::EventBus;
use http_body_util::BodyExt;
use tower::ServiceExt;

use crate::background::quality_monitor::QualityMonitor;
use crate::config::{LogFormat, MonitorConfig, ServerConfig};
use crate::engine::memory_store::MemoryStore;
use crate::engine::QualityService;
use crate::router::build_app_router;
use crate::state::AppState;
use crate::ws::WsManager;

pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".into(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".into()],
        request_timeout_secs: 30,
        log_format: LogFormat::Text,
        monitor: MonitorConfig::default(),
    }
}

/// Application state over an in-memory store.
pub struct TestApp {
    pub store: Arc<MemoryStore>,
    pub state: AppState,
    config: ServerConfig,
}

impl TestApp {
    pub fn new() -> Self {
        let config = test_config();
        let store = Arc::new(MemoryStore::new());
        let quality = Arc::new(QualityService::new(store.clone()));
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
        Self {
            store,
            state,
            config,
        }
    }

    pub fn router(&self) -> Router {
        build_app_router(self.state.clone(), &self.config)
    }
}

/// Send one request through the router and decode the JSON body.
pub async fn send(
    app: Router,
    method: Method,
    uri: &str,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}
