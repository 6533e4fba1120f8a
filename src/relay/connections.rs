use super::Transport;
use crate::errors::{Error, Result};
use crate::event::ClientEvent;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info};

/// Channel sender half for pushing serialized events to a client connection
pub type ConnectionSender = mpsc::UnboundedSender<String>;

/// Metadata for a single client connection
pub struct ClientConnection {
    pub user_id: String,
    /// Session announced when connecting, if any
    pub session_id: Option<String>,
    pub sender: ConnectionSender,
    pub connected_at: DateTime<Utc>,
}

/// Live client connections, keyed by connection id
///
/// Events are addressed by user: every open connection of the user receives them and the
/// client filters on `sessionId`.
#[derive(Default)]
pub struct ConnectionManager {
    connections: RwLock<HashMap<String, ClientConnection>>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a connection and returns the receiver its writer task drains
    pub async fn add(
        &self,
        conn_id: &str,
        user_id: &str,
        session_id: Option<String>,
    ) -> mpsc::UnboundedReceiver<String> {
        let (tx, rx) = mpsc::unbounded_channel();
        let conn = ClientConnection {
            user_id: user_id.to_string(),
            session_id,
            sender: tx,
            connected_at: Utc::now(),
        };
        self.connections
            .write()
            .await
            .insert(conn_id.to_string(), conn);
        info!("Client connected: {} (user {})", conn_id, user_id);
        rx
    }

    pub async fn remove(&self, conn_id: &str) {
        if let Some(conn) = self.connections.write().await.remove(conn_id) {
            let open_for = Utc::now() - conn.connected_at;
            info!(
                "Client disconnected: {} (session {:?}, open {}s)",
                conn_id,
                conn.session_id,
                open_for.num_seconds()
            );
        }
    }

    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Sends a payload to every connection of a user; returns how many accepted it
    pub async fn send_to_user(&self, user_id: &str, payload: &str) -> usize {
        let conns = self.connections.read().await;
        conns
            .values()
            .filter(|conn| conn.user_id == user_id)
            .filter(|conn| conn.sender.send(payload.to_string()).is_ok())
            .count()
    }

    /// Closes every connection by dropping its sender
    pub async fn shutdown_all(&self) {
        let mut conns = self.connections.write().await;
        let count = conns.len();
        conns.clear();
        info!(count, "Closed all client connections");
    }
}

#[async_trait]
impl Transport for ConnectionManager {
    async fn push(&self, user_id: &str, event: &ClientEvent) -> Result<()> {
        let payload = serde_json::to_string(event)?;
        let delivered = self.send_to_user(user_id, &payload).await;
        if delivered == 0 {
            return Err(Error::Transport(format!(
                "no active connection for user {}",
                user_id
            )));
        }
        debug!(
            "Delivered {:?} for session {:?} to {} connection(s)",
            event.action,
            event.session_id(),
            delivered
        );
        Ok(())
    }
}
