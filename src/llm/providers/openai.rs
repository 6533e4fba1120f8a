use super::response_metadata;
use crate::errors::{Error, Result};
use crate::llm::{
    new_run_id, AdapterRequest, AdapterResponse, AdapterSettings, ChatMessage, ModelAdapter,
    TokenListener,
};
use crate::utils::http_client;
use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

/// Adapter for OpenAI's chat completions API
///
/// The completion is requested in one piece and handed to the listener as a single token.
#[derive(Debug)]
pub struct OpenAiAdapter {
    /// OpenAI API key loaded from environment
    api_key: String,
    settings: AdapterSettings,
}

impl OpenAiAdapter {
    /// Creates an adapter instance for one session
    ///
    /// # Returns
    /// * `Result<Self>` - Adapter instance or a configuration error if `OPENAI_API_KEY` is unset
    pub fn new(settings: AdapterSettings) -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| Error::Config("OPENAI_API_KEY environment variable not set".into()))?;
        Ok(Self { api_key, settings })
    }
}

#[async_trait]
impl ModelAdapter for OpenAiAdapter {
    fn streaming_enabled(&self) -> bool {
        self.settings.streaming()
    }

    async fn invoke(
        &self,
        request: AdapterRequest,
        listener: Option<&dyn TokenListener>,
    ) -> Result<AdapterResponse> {
        let run_id = new_run_id();
        let mut request_body = json!({
            "model": self.settings.model_id,
            "messages": ChatMessage::conversation(&request),
            "temperature": self.settings.temperature().unwrap_or(0.7),
        });
        if let Some(max_tokens) = self.settings.max_tokens() {
            request_body["max_tokens"] = json!(max_tokens);
        }

        let res = http_client()
            .post("https://api.openai.com/v1/chat/completions")
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await?;

        if !res.status().is_success() {
            let text = res.text().await?;
            return Err(Error::BackendInvocation(format!("OpenAI API error: {}", text)));
        }

        let json_resp: serde_json::Value = res.json().await?;
        let content = json_resp["choices"][0]["message"]["content"]
            .as_str()
            .map(|c| c.trim().to_string())
            .ok_or_else(|| Error::BackendInvocation("No content in OpenAI LLM response".into()))?;
        debug!("OpenAI response for session {}", self.settings.session_id);

        if let Some(listener) = listener {
            listener.on_token(&run_id, &content).await;
        }

        Ok(AdapterResponse {
            session_id: self.settings.session_id.clone(),
            content,
            metadata: response_metadata(
                &run_id,
                &self.settings,
                json_resp["usage"]["prompt_tokens"].as_u64(),
                json_resp["usage"]["completion_tokens"].as_u64(),
            ),
        })
    }
}
