use super::RelayConfig;
use crate::errors::{Error, Result};
use crate::search::EngineKind;
use std::fs;
use std::str::FromStr;
use tracing::info;
use url::Url;

/// Loads and parses the relay configuration from a YAML file
///
/// # Arguments
///
/// * `file_path` - Path to the YAML configuration file
///
/// # Errors
///
/// Returns an error if the file cannot be read, the YAML cannot be parsed into a
/// `RelayConfig`, or the parsed values are inconsistent.
pub fn load_relay_config(file_path: &str) -> Result<RelayConfig> {
    let yaml_str = fs::read_to_string(file_path)?;
    let config = parse_relay_config(&yaml_str)?;
    info!(
        "Loaded relay configuration from {} ({} models, {} engines, {} workspaces)",
        file_path,
        config.models.len(),
        config.search.engines.len(),
        config.search.workspaces.len()
    );
    Ok(config)
}

/// Parses and validates a YAML configuration document
pub fn parse_relay_config(yaml_str: &str) -> Result<RelayConfig> {
    let config: RelayConfig = serde_yaml::from_str(yaml_str)?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &RelayConfig) -> Result<()> {
    if config.consumer.batch_size == 0 {
        return Err(Error::Config("consumer.batch_size must be positive".into()));
    }
    if config.consumer.max_concurrency == 0 {
        return Err(Error::Config(
            "consumer.max_concurrency must be positive".into(),
        ));
    }
    if config.consumer.queue_capacity == 0 {
        return Err(Error::Config(
            "consumer.queue_capacity must be positive".into(),
        ));
    }

    for (name, engine) in &config.search.engines {
        EngineKind::from_str(name)?;
        let url = Url::parse(&engine.endpoint)
            .map_err(|e| Error::Config(format!("engine '{}' endpoint: {}", name, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "engine '{}' endpoint must be http(s), got '{}'",
                name,
                url.scheme()
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    const SAMPLE: &str = r#"
server:
  port: 8080
consumer:
  batch_size: 5
  batch_window: 250ms
  invoke_timeout: 2m
compare:
  provider: openai
  model_id: gpt-4o-mini
models:
  - provider: openai
    model_id: gpt-4o-mini
  - provider: ollama
    model_id: llama3
search:
  engines:
    opensearch:
      endpoint: http://localhost:9200/query
  workspaces:
    - id: ws1
      status: ready
      engine: opensearch
"#;

    #[test]
    fn parses_full_document() {
        let config = parse_relay_config(SAMPLE).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.consumer.batch_size, 5);
        assert_eq!(config.consumer.batch_window, Duration::from_millis(250));
        assert_eq!(config.consumer.invoke_timeout, Duration::from_secs(120));
        assert_eq!(config.consumer.max_concurrency, 4);
        assert_eq!(config.compare.provider, "openai");
        assert_eq!(config.compare.mode, "chain");
        assert_eq!(config.compare.model_kwargs["maxTokens"], 512);
        assert_eq!(config.models.len(), 2);
        assert_eq!(
            config.search.engines["opensearch"].timeout,
            Duration::from_secs(30)
        );
        assert_eq!(config.search.workspaces[0].engine, "opensearch");
    }

    #[test]
    fn empty_document_uses_defaults() {
        let config = parse_relay_config("{}").unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.consumer.batch_size, 10);
        assert_eq!(config.compare.model_id, "claude-3-haiku-20240307");
        assert!(config.models.is_empty());
    }

    #[test]
    fn rejects_unknown_engine_name() {
        let yaml = "search:\n  engines:\n    solr:\n      endpoint: http://localhost\n";
        assert!(matches!(
            parse_relay_config(yaml),
            Err(Error::UnsupportedEngine(_))
        ));
    }

    #[test]
    fn rejects_invalid_endpoint() {
        let yaml = "search:\n  engines:\n    kendra:\n      endpoint: not a url\n";
        assert!(matches!(parse_relay_config(yaml), Err(Error::Config(_))));

        let yaml = "search:\n  engines:\n    kendra:\n      endpoint: ftp://host/query\n";
        assert!(matches!(parse_relay_config(yaml), Err(Error::Config(_))));
    }

    #[test]
    fn rejects_bad_duration_and_zero_sizes() {
        assert!(parse_relay_config("consumer:\n  batch_window: later\n").is_err());
        assert!(matches!(
            parse_relay_config("consumer:\n  batch_size: 0\n"),
            Err(Error::Config(_))
        ));
    }
}
