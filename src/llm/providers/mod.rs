use super::{AdapterFactory, AdapterSettings, ModelAdapter};
use crate::errors::{Error, Result};
use serde_json::{json, Map, Value};
use std::sync::Arc;

pub mod anthropic;
pub mod ollama;
pub mod openai;

/// Built-in chat providers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    OpenAi,
    Anthropic,
    Ollama,
}

/// Factory building adapters of one built-in provider
#[derive(Debug)]
pub struct ProviderFactory {
    kind: ProviderKind,
}

impl AdapterFactory for ProviderFactory {
    fn create(&self, settings: AdapterSettings) -> Result<Box<dyn ModelAdapter>> {
        let adapter: Box<dyn ModelAdapter> = match self.kind {
            ProviderKind::OpenAi => Box::new(openai::OpenAiAdapter::new(settings)?),
            ProviderKind::Anthropic => Box::new(anthropic::AnthropicAdapter::new(settings)?),
            ProviderKind::Ollama => Box::new(ollama::OllamaAdapter::new(settings)),
        };
        Ok(adapter)
    }
}

/// Returns the factory for a provider name ("openai", "anthropic" or "ollama")
pub fn factory_for(provider: &str) -> Result<Arc<dyn AdapterFactory>> {
    let kind = match provider {
        "openai" => ProviderKind::OpenAi,
        "anthropic" => ProviderKind::Anthropic,
        "ollama" => ProviderKind::Ollama,
        _ => return Err(Error::Config(format!("Unknown provider '{}'", provider))),
    };
    Ok(Arc::new(ProviderFactory { kind }))
}

/// Response metadata shared by every provider: run id, model and token usage
fn response_metadata(
    run_id: &str,
    settings: &AdapterSettings,
    input_tokens: Option<u64>,
    output_tokens: Option<u64>,
) -> Map<String, Value> {
    let mut metadata = Map::new();
    metadata.insert("runId".to_string(), json!(run_id));
    metadata.insert("modelId".to_string(), json!(settings.model_id));
    metadata.insert("mode".to_string(), json!(settings.mode));
    if input_tokens.is_some() || output_tokens.is_some() {
        metadata.insert(
            "usage".to_string(),
            json!({
                "input_tokens": input_tokens.unwrap_or(0),
                "output_tokens": output_tokens.unwrap_or(0),
            }),
        );
    }
    metadata
}
