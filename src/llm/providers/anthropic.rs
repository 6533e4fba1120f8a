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

const DEFAULT_MAX_TOKENS: u64 = 4096;

/// Adapter for Anthropic's messages API
#[derive(Debug)]
pub struct AnthropicAdapter {
    /// Anthropic API key loaded from environment
    api_key: String,
    settings: AdapterSettings,
}

impl AnthropicAdapter {
    pub fn new(settings: AdapterSettings) -> Result<Self> {
        let api_key = std::env::var("ANTHROPIC_API_KEY").map_err(|_| {
            Error::Config("ANTHROPIC_API_KEY environment variable not set".into())
        })?;
        Ok(Self { api_key, settings })
    }
}

#[async_trait]
impl ModelAdapter for AnthropicAdapter {
    fn streaming_enabled(&self) -> bool {
        self.settings.streaming()
    }

    async fn invoke(
        &self,
        request: AdapterRequest,
        listener: Option<&dyn TokenListener>,
    ) -> Result<AdapterResponse> {
        let run_id = new_run_id();
        let (system, messages) = ChatMessage::split_system(ChatMessage::conversation(&request));

        let mut request_body = json!({
            "model": self.settings.model_id,
            "max_tokens": self.settings.max_tokens().unwrap_or(DEFAULT_MAX_TOKENS),
            "messages": messages,
        });
        if let Some(system) = system {
            request_body["system"] = json!(system);
        }
        if let Some(temperature) = self.settings.temperature() {
            request_body["temperature"] = json!(temperature);
        }

        let res = http_client()
            .post("https://api.anthropic.com/v1/messages")
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&request_body)
            .send()
            .await?;

        if !res.status().is_success() {
            let text = res.text().await?;
            return Err(Error::BackendInvocation(format!(
                "Anthropic API error: {}",
                text
            )));
        }

        let json_resp: serde_json::Value = res.json().await?;
        let content = json_resp["content"]
            .as_array()
            .map(|parts| {
                parts
                    .iter()
                    .filter_map(|p| p["text"].as_str())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .filter(|text| !text.is_empty())
            .ok_or_else(|| {
                Error::BackendInvocation("No content in Anthropic LLM response".into())
            })?;
        debug!("Anthropic response: {}", content);

        if let Some(listener) = listener {
            listener.on_token(&run_id, &content).await;
        }

        Ok(AdapterResponse {
            session_id: self.settings.session_id.clone(),
            content: content.trim().to_string(),
            metadata: response_metadata(
                &run_id,
                &self.settings,
                json_resp["usage"]["input_tokens"].as_u64(),
                json_resp["usage"]["output_tokens"].as_u64(),
            ),
        })
    }
}
