/// Errors raised by the relay, the orchestrators and the search dispatcher.
///
/// The `Display` text of `BackendInvocation` is the raw upstream message. It is fed to the
/// failure classifier and must never be forwarded to a client as-is.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed, oversized or missing request fields.
    #[error("Validation error: {0}")]
    Validation(String),
    /// A workspace, adapter or engine lookup returned nothing.
    #[error("{0} not found")]
    NotFound(String),
    /// The workspace exists but cannot serve queries yet.
    #[error("Workspace is not ready (status: {0})")]
    NotReady(String),
    #[error("Semantic search is not supported for engine '{0}'")]
    UnsupportedEngine(String),
    /// Opaque failure reported by a model or search backend.
    #[error("{0}")]
    BackendInvocation(String),
    #[error("Timed out after {0}")]
    Timeout(String),
    /// The client connection could not be reached.
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Malformed envelope: {0}")]
    MalformedEnvelope(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Serde error: {0}")]
    SerdeError(#[from] serde_json::Error),
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
