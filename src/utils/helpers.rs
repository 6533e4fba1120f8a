use chrono::Utc;
use once_cell::sync::Lazy;
use reqwest::Client;
use serde::{Deserialize, Deserializer};
use std::time::Duration;

static HTTP_CLIENT: Lazy<Client> = Lazy::new(Client::new);

/// Process-wide HTTP client shared by model adapters and search engines
pub fn http_client() -> &'static Client {
    &HTTP_CLIENT
}

/// Current time as whole unix seconds, rendered the way clients expect it
pub fn unix_timestamp() -> String {
    Utc::now().timestamp().to_string()
}

/// Parses a human readable duration such as "2s", "500ms" or "2m"
///
/// # Arguments
/// * `value` - Duration string
///
/// # Returns
/// * `Result<Duration, String>` - Parsed duration or a description of the problem
pub fn parse_duration(value: &str) -> Result<Duration, String> {
    humantime::parse_duration(value.trim())
        .map_err(|e| format!("invalid duration '{}': {}", value, e))
}

/// Serde adapter for `humantime` duration strings
pub fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_duration(&raw).map_err(serde::de::Error::custom)
}

/// Renders a duration back to its human readable form for log lines and errors
pub fn format_duration(duration: Duration) -> String {
    humantime::format_duration(duration).to_string()
}
