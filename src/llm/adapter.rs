use crate::errors::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt::Debug;

/// Files attached to a chat turn, forwarded to adapters untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Attachments {
    #[serde(default)]
    pub images: Vec<Value>,
    #[serde(default)]
    pub documents: Vec<Value>,
    #[serde(default)]
    pub videos: Vec<Value>,
}

impl Attachments {
    pub fn is_empty(&self) -> bool {
        self.images.is_empty() && self.documents.is_empty() && self.videos.is_empty()
    }
}

/// Per-instance adapter settings
///
/// An instance is built for exactly one session, so any per-session state an adapter keeps
/// (history, token counters) cannot leak into another job.
#[derive(Debug, Clone, PartialEq)]
pub struct AdapterSettings {
    pub model_id: String,
    pub mode: String,
    pub session_id: String,
    pub user_id: String,
    pub model_kwargs: Map<String, Value>,
}

impl AdapterSettings {
    /// Whether tokens should be relayed while the model produces them.
    /// Controlled by the `streaming` model kwarg, on unless set to `false`.
    pub fn streaming(&self) -> bool {
        self.model_kwargs
            .get("streaming")
            .and_then(Value::as_bool)
            .unwrap_or(true)
    }

    pub fn temperature(&self) -> Option<f64> {
        self.model_kwargs.get("temperature").and_then(Value::as_f64)
    }

    pub fn max_tokens(&self) -> Option<u64> {
        self.model_kwargs.get("maxTokens").and_then(Value::as_u64)
    }
}

/// Input of a single model invocation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdapterRequest {
    pub prompt: String,
    pub workspace_id: Option<String>,
    pub user_groups: Vec<String>,
    pub attachments: Attachments,
    pub system_prompts: Map<String, Value>,
}

impl AdapterRequest {
    /// System prompt text assembled from the string entries of `system_prompts`
    pub fn system_prompt(&self) -> Option<String> {
        let parts: Vec<&str> = self
            .system_prompts
            .values()
            .filter_map(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join("\n\n"))
        }
    }
}

/// Completed model answer
#[derive(Debug, Clone, PartialEq)]
pub struct AdapterResponse {
    pub session_id: String,
    pub content: String,
    pub metadata: Map<String, Value>,
}

impl AdapterResponse {
    /// Payload of the `final_response` event
    pub fn into_payload(self) -> Value {
        json!({
            "sessionId": self.session_id,
            "type": "text",
            "content": self.content,
            "metadata": self.metadata,
        })
    }
}

/// Receives tokens while a model produces them
///
/// Adapters await each call before producing the next token, which keeps tokens of a run
/// in production order.
#[async_trait]
pub trait TokenListener: Send + Sync {
    async fn on_token(&self, run_id: &str, token: &str);
}

/// A model backend bound to one session
#[async_trait]
pub trait ModelAdapter: Debug + Send + Sync {
    /// Whether this instance wants its tokens relayed
    fn streaming_enabled(&self) -> bool;

    /// Runs the model on one request
    ///
    /// # Arguments
    /// * `request` - Prompt and context of the turn
    /// * `listener` - Optional sink for incremental tokens
    async fn invoke(
        &self,
        request: AdapterRequest,
        listener: Option<&dyn TokenListener>,
    ) -> Result<AdapterResponse>;
}

/// Builds adapter instances for one `(provider, model)` key
pub trait AdapterFactory: Debug + Send + Sync {
    fn create(&self, settings: AdapterSettings) -> Result<Box<dyn ModelAdapter>>;
}

/// Fresh identifier for one model run
pub fn new_run_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
