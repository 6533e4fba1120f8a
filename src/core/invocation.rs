use crate::errors::{Error, Result};
use crate::llm::{AdapterRequest, AdapterResponse, ModelAdapter, TokenListener};
use crate::utils::format_duration;
use std::time::Duration;

/// Invokes an adapter, giving up after `timeout`
pub(crate) async fn invoke_with_timeout(
    adapter: &dyn ModelAdapter,
    request: AdapterRequest,
    listener: Option<&dyn TokenListener>,
    timeout: Duration,
) -> Result<AdapterResponse> {
    tokio::time::timeout(timeout, adapter.invoke(request, listener))
        .await
        .map_err(|_| Error::Timeout(format_duration(timeout)))?
}
