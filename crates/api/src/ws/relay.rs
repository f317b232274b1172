//! Forwards quality events from the event bus to WebSocket clients.

use std::sync::Arc;

use axum::extract::ws::Message;
use gridwatch_events::DomainEvent;
use serde_json::json;
use tokio::sync::broadcast;

use crate::ws::WsManager;

/// Pushes every `quality.*` event to the connected dashboards as a JSON text
/// frame `{type, data, timestamp}`.
pub struct QualityRelay {
    ws_manager: Arc<WsManager>,
}

impl QualityRelay {
    pub fn new(ws_manager: Arc<WsManager>) -> Self {
        Self { ws_manager }
    }

    /// Run until the event bus is dropped.
    pub async fn run(self, mut receiver: broadcast::Receiver<DomainEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    if event.is_quality() {
                        self.forward(&event).await;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Quality relay lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, quality relay shutting down");
                    break;
                }
            }
        }
    }

    async fn forward(&self, event: &DomainEvent) {
        let frame = frame_for(event);
        let sent = self
            .ws_manager
            .broadcast(event.table_name.as_deref(), Message::Text(frame.into()))
            .await;
        tracing::debug!(event_type = %event.event_type, clients = sent, "Quality event pushed");
    }
}

/// Wire form of an event pushed to clients.
pub fn frame_for(event: &DomainEvent) -> String {
    json!({
        "type": event.event_type,
        "data": event.payload,
        "timestamp": event.timestamp,
    })
    .to_string()
}
