mod parser;
use crate::search::Workspace;
use crate::utils::deserialize_duration;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::time::Duration;

pub use parser::{load_relay_config, parse_relay_config};

/// Main configuration structure for the relay process
#[derive(Debug, Deserialize, Clone, Default)]
pub struct RelayConfig {
    /// HTTP/WebSocket listener settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Batch consumer settings
    #[serde(default)]
    pub consumer: ConsumerConfig,
    /// Backend used by comparison jobs that do not name one
    #[serde(default)]
    pub compare: CompareConfig,
    /// Models registered in the adapter registry at start-up
    #[serde(default)]
    pub models: Vec<ModelConfig>,
    /// Search engines and seeded workspaces
    #[serde(default)]
    pub search: SearchConfig,
}

/// Listener settings for the API server
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Settings for the job consumer and its intake queue
#[derive(Debug, Deserialize, Clone)]
pub struct ConsumerConfig {
    /// Maximum number of records handed to one `process_batch` call
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// How long to wait for a batch to fill once its first record arrived
    #[serde(
        default = "default_batch_window",
        deserialize_with = "deserialize_duration"
    )]
    pub batch_window: Duration,
    /// Records of a batch processed at the same time
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    /// Upper bound on a single adapter invocation
    #[serde(
        default = "default_invoke_timeout",
        deserialize_with = "deserialize_duration"
    )]
    pub invoke_timeout: Duration,
    /// Capacity of the in-process intake queue
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            batch_window: default_batch_window(),
            max_concurrency: default_max_concurrency(),
            invoke_timeout: default_invoke_timeout(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

/// Backend defaults for prompt comparison jobs
#[derive(Debug, Deserialize, Clone)]
pub struct CompareConfig {
    pub provider: String,
    pub model_id: String,
    #[serde(default = "default_mode")]
    pub mode: String,
    #[serde(default = "default_compare_kwargs")]
    pub model_kwargs: Map<String, Value>,
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            provider: "anthropic".to_string(),
            model_id: "claude-3-haiku-20240307".to_string(),
            mode: default_mode(),
            model_kwargs: default_compare_kwargs(),
        }
    }
}

/// A `(provider, model_id)` pair to register
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ModelConfig {
    pub provider: String,
    pub model_id: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct SearchConfig {
    /// Endpoint per engine name (`aurora`, `opensearch`, `kendra`, `bedrock_kb`)
    #[serde(default)]
    pub engines: BTreeMap<String, EngineConfig>,
    /// Workspaces known to the in-memory store
    #[serde(default)]
    pub workspaces: Vec<Workspace>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EngineConfig {
    pub endpoint: String,
    #[serde(
        default = "default_engine_timeout",
        deserialize_with = "deserialize_duration"
    )]
    pub timeout: Duration,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_batch_size() -> usize {
    10
}

fn default_batch_window() -> Duration {
    Duration::from_secs(1)
}

fn default_max_concurrency() -> usize {
    4
}

fn default_invoke_timeout() -> Duration {
    Duration::from_secs(120)
}

fn default_queue_capacity() -> usize {
    1024
}

fn default_engine_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_mode() -> String {
    "chain".to_string()
}

fn default_compare_kwargs() -> Map<String, Value> {
    let mut kwargs = Map::new();
    kwargs.insert("temperature".to_string(), Value::from(0.1));
    kwargs.insert("maxTokens".to_string(), Value::from(512));
    kwargs
}
