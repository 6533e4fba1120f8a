use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Action tag carried by every event pushed to a client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatbotAction {
    /// Incremental output token or progress line
    LlmNewToken,
    /// Terminal response of a run or comparison
    FinalResponse,
    /// Liveness ping carrying no payload
    Heartbeat,
    /// Sanitized failure notice
    Error,
}

/// Event pushed to the client bound to a session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClientEvent {
    #[serde(rename = "type")]
    pub kind: String,
    pub action: ChatbotAction,
    pub user_id: String,
    /// Unix seconds, rendered as a string
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_groups: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<String>,
    pub data: Value,
}

impl ClientEvent {
    /// Creates a text event stamped with the current time
    ///
    /// # Arguments
    /// * `action` - Action tag of the event
    /// * `user_id` - Addressed user
    /// * `data` - Payload; must carry `sessionId`
    pub fn new(action: ChatbotAction, user_id: &str, data: Value) -> Self {
        Self {
            kind: "text".to_string(),
            action,
            user_id: user_id.to_string(),
            timestamp: crate::utils::unix_timestamp(),
            user_groups: None,
            direction: None,
            data,
        }
    }

    pub fn with_user_groups(mut self, groups: Vec<String>) -> Self {
        self.user_groups = Some(groups);
        self
    }

    pub fn with_direction(mut self, direction: &str) -> Self {
        self.direction = Some(direction.to_string());
        self
    }

    /// Session id carried in the payload, if any
    pub fn session_id(&self) -> Option<&str> {
        self.data.get("sessionId").and_then(Value::as_str)
    }
}

/// Token payload relayed for `llm_new_token` events
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TokenEvent {
    pub run_id: String,
    pub sequence_number: u64,
    pub value: String,
}

impl TokenEvent {
    pub fn into_payload(self, session_id: &str) -> Value {
        json!({
            "sessionId": session_id,
            "token": self,
        })
    }
}
