use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gridwatch_api::background::quality_monitor::QualityMonitor;
use gridwatch_api::config::{LogFormat, ServerConfig};
use gridwatch_api::engine::{PgQualityStore, QualityService};
use gridwatch_api::router::build_app_router;
use gridwatch_api::{state, ws};

use state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Configuration ---
    let config = ServerConfig::from_env();

    // --- Tracing ---
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "gridwatch_api=debug,tower_http=debug".into());
    match config.log_format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Text => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init(),
    }
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = gridwatch_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    gridwatch_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    gridwatch_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Quality engine ---
    let store = Arc::new(PgQualityStore::new(pool));
    let quality = Arc::new(QualityService::new(store));

    // --- Event bus ---
    let event_bus = Arc::new(gridwatch_events::EventBus::default());

    // --- WebSocket manager + heartbeat ---
    let ws_manager = Arc::new(ws::WsManager::new());
    let heartbeat_cancel = CancellationToken::new();
    let heartbeat_handle = ws::start_heartbeat(Arc::clone(&ws_manager), heartbeat_cancel.clone());

    // Forward quality events to WebSocket clients.
    let relay_cancel = CancellationToken::new();
    let relay = ws::QualityRelay::new(Arc::clone(&ws_manager));
    let relay_rx = event_bus.subscribe();
    let relay_cancel_clone = relay_cancel.clone();
    let relay_handle = tokio::spawn(async move {
        tokio::select! {
            () = relay.run(relay_rx) => {}
            () = relay_cancel_clone.cancelled() => {}
        }
    });

    // --- Quality monitor ---
    let monitor = Arc::new(QualityMonitor::new(
        Arc::clone(&quality),
        Arc::clone(&event_bus),
        config.monitor.clone(),
    ));
    if config.monitor.autostart {
        monitor.start_monitoring().await;
    }

    // --- App state ---
    let state = AppState {
        config: Arc::new(config.clone()),
        quality,
        monitor: Arc::clone(&monitor),
        ws_manager: Arc::clone(&ws_manager),
        event_bus,
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    // Let an in-flight pass finish before the relay goes away.
    monitor.stop_monitoring().await;
    tracing::info!("Quality monitor stopped");

    relay_cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(5), relay_handle).await;
    tracing::info!("Event relay stopped");

    let ws_count = ws_manager.connection_count().await;
    tracing::info!(ws_count, "Closing remaining WebSocket connections");
    ws_manager.shutdown_all().await;

    heartbeat_cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(5), heartbeat_handle).await;
    tracing::info!("Heartbeat task stopped");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT or SIGTERM (on Unix) to initiate graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
