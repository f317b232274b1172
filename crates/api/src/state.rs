use std::sync::Arc;

use gridwatch_events::EventBus;

use crate::background::quality_monitor::QualityMonitor;
use crate::config::ServerConfig;
use crate::engine::QualityService;
use crate::ws::WsManager;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; everything inside is behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    /// Quality engine (reads and check passes).
    pub quality: Arc<QualityService>,
    /// The single background monitor owned by this process.
    pub monitor: Arc<QualityMonitor>,
    /// WebSocket connection manager (dashboard clients).
    pub ws_manager: Arc<WsManager>,
    pub event_bus: Arc<EventBus>,
}
