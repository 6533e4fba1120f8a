//! Pushes client events to whatever connection is bound to a session.

mod connections;

pub use connections::*;

use crate::errors::Result;
use crate::event::{ChatbotAction, ClientEvent, TokenEvent};
use crate::llm::TokenListener;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Delivery channel to connected clients
#[async_trait]
pub trait Transport: Send + Sync {
    /// Delivers one event to the connections of `user_id`
    async fn push(&self, user_id: &str, event: &ClientEvent) -> Result<()>;
}

/// Emits client events and stamps token events with sequence numbers
///
/// The sequence counter belongs to the relay instance and is shared by every run the
/// process handles, so numbers increase across runs as well as within one.
pub struct StreamingRelay {
    transport: Arc<dyn Transport>,
    sequence: AtomicU64,
}

impl StreamingRelay {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            sequence: AtomicU64::new(0),
        }
    }

    /// Relays one token of a run
    pub async fn emit_token(&self, user_id: &str, session_id: &str, run_id: &str, value: &str) {
        let sequence_number = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let token = TokenEvent {
            run_id: run_id.to_string(),
            sequence_number,
            value: value.to_string(),
        };
        self.emit(ClientEvent::new(
            ChatbotAction::LlmNewToken,
            user_id,
            token.into_payload(session_id),
        ))
        .await;
    }

    /// Pushes an informational line, shown like streamed text
    pub async fn emit_progress(&self, user_id: &str, session_id: &str, content: &str) {
        self.emit(ClientEvent::new(
            ChatbotAction::LlmNewToken,
            user_id,
            json!({
                "sessionId": session_id,
                "type": "text",
                "content": content,
                "metadata": {},
            }),
        ))
        .await;
    }

    /// Pushes the terminal response of a run; `payload` carries `sessionId`
    pub async fn emit_final(&self, user_id: &str, user_groups: Vec<String>, payload: Value) {
        self.emit(
            ClientEvent::new(ChatbotAction::FinalResponse, user_id, payload)
                .with_user_groups(user_groups),
        )
        .await;
    }

    /// Pushes a sanitized failure notice
    pub async fn emit_error(&self, session_id: &str, user_id: &str, message: &str) {
        self.emit(
            ClientEvent::new(
                ChatbotAction::Error,
                user_id,
                json!({
                    "sessionId": session_id,
                    "content": message,
                    "type": "text",
                }),
            )
            .with_direction("OUT"),
        )
        .await;
    }

    pub async fn emit_heartbeat(&self, user_id: &str, session_id: &str) {
        self.emit(ClientEvent::new(
            ChatbotAction::Heartbeat,
            user_id,
            json!({ "sessionId": session_id }),
        ))
        .await;
    }

    /// Last sequence number handed out
    pub fn last_sequence_number(&self) -> u64 {
        self.sequence.load(Ordering::SeqCst)
    }

    async fn emit(&self, event: ClientEvent) {
        if let Err(e) = self.transport.push(&event.user_id, &event).await {
            warn!(
                "Dropping {:?} event for user {}: {}",
                event.action, event.user_id, e
            );
        }
    }
}

/// Token listener bound to the user and session of one job
pub struct RelayTokenListener {
    relay: Arc<StreamingRelay>,
    user_id: String,
    session_id: String,
    enabled: bool,
}

impl RelayTokenListener {
    /// # Arguments
    /// * `relay` - Relay receiving the tokens
    /// * `user_id` - Owner of the job
    /// * `session_id` - Session the tokens belong to
    /// * `enabled` - The adapter's streaming flag; tokens are dropped when false
    pub fn new(relay: Arc<StreamingRelay>, user_id: &str, session_id: &str, enabled: bool) -> Self {
        Self {
            relay,
            user_id: user_id.to_string(),
            session_id: session_id.to_string(),
            enabled,
        }
    }
}

#[async_trait]
impl TokenListener for RelayTokenListener {
    async fn on_token(&self, run_id: &str, token: &str) {
        if !self.enabled {
            debug!("Streaming is disabled, ignoring token");
            return;
        }
        if token.is_empty() {
            return;
        }
        self.relay
            .emit_token(&self.user_id, &self.session_id, run_id, token)
            .await;
    }
}
