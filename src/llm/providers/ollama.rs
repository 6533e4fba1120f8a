use super::response_metadata;
use crate::errors::{Error, Result};
use crate::llm::{
    new_run_id, AdapterRequest, AdapterResponse, AdapterSettings, ChatMessage, ModelAdapter,
    TokenListener,
};
use crate::utils::http_client;
use async_trait::async_trait;
use futures::{Stream, StreamExt};
use serde_json::{json, Value};
use tracing::debug;

const DEFAULT_OLLAMA_HOST: &str = "http://localhost:11434";

/// Adapter for a local Ollama server
///
/// When a listener is attached and streaming is enabled, the NDJSON chat stream is read
/// line by line and every content fragment is relayed as it arrives.
#[derive(Debug)]
pub struct OllamaAdapter {
    /// Base URL of the Ollama server, from `OLLAMA_HOST`
    host: String,
    settings: AdapterSettings,
}

impl OllamaAdapter {
    pub fn new(settings: AdapterSettings) -> Self {
        let host = std::env::var("OLLAMA_HOST").unwrap_or_else(|_| DEFAULT_OLLAMA_HOST.into());
        Self {
            host: host.trim_end_matches('/').to_string(),
            settings,
        }
    }

    fn options(&self) -> Value {
        let mut options = json!({});
        if let Some(temperature) = self.settings.temperature() {
            options["temperature"] = json!(temperature);
        }
        if let Some(max_tokens) = self.settings.max_tokens() {
            options["num_predict"] = json!(max_tokens);
        }
        options
    }
}

#[async_trait]
impl ModelAdapter for OllamaAdapter {
    fn streaming_enabled(&self) -> bool {
        self.settings.streaming()
    }

    async fn invoke(
        &self,
        request: AdapterRequest,
        listener: Option<&dyn TokenListener>,
    ) -> Result<AdapterResponse> {
        let run_id = new_run_id();
        let stream = listener.is_some() && self.streaming_enabled();
        let request_body = json!({
            "model": self.settings.model_id,
            "stream": stream,
            "messages": ChatMessage::conversation(&request),
            "options": self.options(),
        });

        let res = http_client()
            .post(format!("{}/api/chat", self.host))
            .json(&request_body)
            .send()
            .await?;

        if !res.status().is_success() {
            let text = res.text().await?;
            return Err(Error::BackendInvocation(format!("Ollama API error: {}", text)));
        }

        let (content, last_frame) = if stream {
            read_ndjson_stream(res.bytes_stream(), &run_id, listener).await?
        } else {
            let frame: Value = res.json().await?;
            let content = frame["message"]["content"]
                .as_str()
                .unwrap_or_default()
                .to_string();
            if let Some(listener) = listener {
                listener.on_token(&run_id, &content).await;
            }
            (content, frame)
        };

        check_frame(&last_frame)?;
        if content.trim().is_empty() {
            return Err(Error::BackendInvocation(
                "No content in Ollama LLM response".into(),
            ));
        }
        debug!("Ollama response for session {}", self.settings.session_id);

        Ok(AdapterResponse {
            session_id: self.settings.session_id.clone(),
            content: content.trim().to_string(),
            metadata: response_metadata(
                &run_id,
                &self.settings,
                last_frame["prompt_eval_count"].as_u64(),
                last_frame["eval_count"].as_u64(),
            ),
        })
    }
}

/// Reads an NDJSON chat stream, relaying each content fragment in arrival order
///
/// Chunks are buffered as bytes and only decoded once a full line is available, so
/// frames and UTF-8 sequences may be split anywhere. A trailing frame without a newline
/// is still read. Returns the accumulated content and the last frame, which carries the
/// token counts. An `error` frame stops the read.
async fn read_ndjson_stream<S, B, E>(
    body: S,
    run_id: &str,
    listener: Option<&dyn TokenListener>,
) -> Result<(String, Value)>
where
    S: Stream<Item = std::result::Result<B, E>>,
    B: AsRef<[u8]>,
    Error: From<E>,
{
    futures::pin_mut!(body);
    let mut content = String::new();
    let mut last_frame = Value::Null;
    let mut buffer: Vec<u8> = Vec::new();

    while let Some(chunk) = body.next().await {
        buffer.extend_from_slice(chunk?.as_ref());
        while let Some(pos) = buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = buffer.drain(..=pos).collect();
            if let Some(frame) = parse_frame(&line)? {
                check_frame(&frame)?;
                relay_fragment(&frame, run_id, &mut content, listener).await;
                last_frame = frame;
            }
        }
    }
    if let Some(frame) = parse_frame(&buffer)? {
        check_frame(&frame)?;
        relay_fragment(&frame, run_id, &mut content, listener).await;
        last_frame = frame;
    }

    Ok((content, last_frame))
}

fn check_frame(frame: &Value) -> Result<()> {
    match frame["error"].as_str() {
        Some(error) => Err(Error::BackendInvocation(format!("Ollama API error: {}", error))),
        None => Ok(()),
    }
}

/// Parses one NDJSON line; blank lines yield nothing
fn parse_frame(line: &[u8]) -> Result<Option<Value>> {
    let text = String::from_utf8_lossy(line);
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_str(text)?))
}

async fn relay_fragment(
    frame: &Value,
    run_id: &str,
    content: &mut String,
    listener: Option<&dyn TokenListener>,
) {
    if let Some(fragment) = frame["message"]["content"].as_str() {
        content.push_str(fragment);
        if let Some(listener) = listener {
            listener.on_token(run_id, fragment).await;
        }
    }
}
