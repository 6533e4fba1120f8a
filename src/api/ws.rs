use crate::api::routes::AppState;
use crate::relay::ConnectionManager;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Extension, Query};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, trace};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectParams {
    pub user_id: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Upgrades the request and binds the socket to the given user
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<ConnectParams>,
    Extension(state): Extension<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, params, state.connections))
}

/// Forwards relay events to the socket until either side closes
async fn handle_socket(socket: WebSocket, params: ConnectParams, connections: Arc<ConnectionManager>) {
    let conn_id = uuid::Uuid::new_v4().to_string();
    let mut rx = connections
        .add(&conn_id, &params.user_id, params.session_id)
        .await;

    let (mut sink, mut stream) = socket.split();

    let sender_conn_id = conn_id.clone();
    let send_task = tokio::spawn(async move {
        while let Some(payload) = rx.recv().await {
            if sink.send(Message::Text(payload)).await.is_err() {
                debug!("WebSocket sink closed for {}", sender_conn_id);
                break;
            }
        }
    });

    while let Some(frame) = stream.next().await {
        match frame {
            Ok(Message::Close(_)) => break,
            Ok(Message::Pong(_)) => trace!("Pong received from {}", conn_id),
            Ok(_) => {}
            Err(e) => {
                debug!("WebSocket receive error on {}: {}", conn_id, e);
                break;
            }
        }
    }

    connections.remove(&conn_id).await;
    send_task.abort();
    info!("WebSocket {} closed", conn_id);
}
