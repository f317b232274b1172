use std::collections::BTreeSet;
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use gridwatch_core::monitored::MonitoredTable;
use serde::Deserialize;

use crate::state::AppState;
use crate::ws::manager::WsManager;

/// Client-to-server control messages.
#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
enum ClientMessage {
    /// Follow only these tables. An empty list follows everything.
    Subscribe { tables: Vec<String> },
}

/// Upgrade to a WebSocket and hand the socket to the connection loop.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state.ws_manager))
}

/// Drive one connection: a spawned sender task forwards queued messages to
/// the sink while this task reads client messages until disconnect.
async fn handle_socket(socket: WebSocket, ws_manager: Arc<WsManager>) {
    let conn_id = uuid::Uuid::new_v4().to_string();
    tracing::info!(conn_id = %conn_id, "WebSocket connected");

    let mut rx = ws_manager.add(conn_id.clone()).await;
    let (mut sink, mut stream) = socket.split();

    let sender_conn_id = conn_id.clone();
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sink.send(msg).await.is_err() {
                tracing::debug!(conn_id = %sender_conn_id, "WebSocket sink closed");
                break;
            }
        }
    });

    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Close(_)) => break,
            Ok(Message::Pong(_)) => {
                tracing::trace!(conn_id = %conn_id, "Pong received");
            }
            Ok(Message::Text(text)) => match parse_subscription(text.as_str()) {
                Ok(tables) => {
                    tracing::debug!(conn_id = %conn_id, ?tables, "Subscription updated");
                    ws_manager.set_tables(&conn_id, tables).await;
                }
                Err(e) => {
                    tracing::debug!(conn_id = %conn_id, error = %e, "Ignoring client message");
                }
            },
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(conn_id = %conn_id, error = %e, "WebSocket receive error");
                break;
            }
        }
    }

    ws_manager.remove(&conn_id).await;
    send_task.abort();
    tracing::info!(conn_id = %conn_id, "WebSocket disconnected");
}

/// Parse a subscribe message into a validated table filter.
fn parse_subscription(text: &str) -> Result<BTreeSet<String>, String> {
    let ClientMessage::Subscribe { tables } =
        serde_json::from_str::<ClientMessage>(text).map_err(|e| e.to_string())?;
    tables
        .iter()
        .map(|t| {
            MonitoredTable::from_name(t)
                .map(|table| table.name().to_string())
                .map_err(|e| e.to_string())
        })
        .collect()
}
