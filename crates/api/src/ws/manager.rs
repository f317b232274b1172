use std::collections::{BTreeSet, HashMap};

use axum::body::Bytes;
use axum::extract::ws::Message;
use gridwatch_core::types::Timestamp;
use tokio::sync::{mpsc, RwLock};

/// Channel sender half for pushing messages to a WebSocket connection.
pub type WsSender = mpsc::UnboundedSender<Message>;

/// A single dashboard connection.
pub struct WsConnection {
    pub sender: WsSender,
    pub connected_at: Timestamp,
    /// Tables the client asked to follow. Empty means every table.
    pub tables: BTreeSet<String>,
}

impl WsConnection {
    /// Whether an event about `table_name` should reach this client.
    /// Events not scoped to a table reach everyone.
    fn follows(&self, table_name: Option<&str>) -> bool {
        match table_name {
            Some(name) if !self.tables.is_empty() => self.tables.contains(name),
            _ => true,
        }
    }
}

/// Tracks all open WebSocket connections.
///
/// Interior `RwLock`; wrap in `Arc` to share.
pub struct WsManager {
    connections: RwLock<HashMap<String, WsConnection>>,
}

impl WsManager {
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
        }
    }

    /// Register a connection and return the receiver for its outbound
    /// messages.
    pub async fn add(&self, conn_id: String) -> mpsc::UnboundedReceiver<Message> {
        let (tx, rx) = mpsc::unbounded_channel();
        let conn = WsConnection {
            sender: tx,
            connected_at: chrono::Utc::now(),
            tables: BTreeSet::new(),
        };
        self.connections.write().await.insert(conn_id, conn);
        rx
    }

    pub async fn remove(&self, conn_id: &str) {
        self.connections.write().await.remove(conn_id);
    }

    /// Replace the table filter of a connection. Returns `false` if the
    /// connection is gone.
    pub async fn set_tables(&self, conn_id: &str, tables: BTreeSet<String>) -> bool {
        match self.connections.write().await.get_mut(conn_id) {
            Some(conn) => {
                conn.tables = tables;
                true
            }
            None => false,
        }
    }

    /// Send a message to every client following `table_name`.
    ///
    /// Closed channels are skipped; their connections are removed by their
    /// own receive loop. Returns the number of clients reached.
    pub async fn broadcast(&self, table_name: Option<&str>, message: Message) -> usize {
        let conns = self.connections.read().await;
        let mut sent = 0;
        for conn in conns.values().filter(|c| c.follows(table_name)) {
            if conn.sender.send(message.clone()).is_ok() {
                sent += 1;
            }
        }
        sent
    }

    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Send a Close frame to every connection, then clear the map.
    pub async fn shutdown_all(&self) {
        let mut conns = self.connections.write().await;
        let count = conns.len();
        for conn in conns.values() {
            let _ = conn.sender.send(Message::Close(None));
        }
        conns.clear();
        tracing::info!(count, "Closed all WebSocket connections");
    }

    /// Send a Ping frame to every connected client.
    pub async fn ping_all(&self) {
        let conns = self.connections.read().await;
        for conn in conns.values() {
            let _ = conn.sender.send(Message::Ping(Bytes::new()));
        }
    }
}

impl Default for WsManager {
    fn default() -> Self {
        Self::new()
    }
}
