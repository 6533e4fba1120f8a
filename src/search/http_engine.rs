use super::{EngineKind, SearchEngine, SearchResult, Workspace};
use crate::errors::{Error, Result};
use crate::utils::http_client;
use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Engine client forwarding queries to a remote search endpoint
///
/// The endpoint receives `{workspaceId, workspace, query, limit, fullResponse}` and answers
/// with a search result document.
#[derive(Debug)]
pub struct HttpSearchEngine {
    kind: EngineKind,
    endpoint: Url,
    timeout: Duration,
}

impl HttpSearchEngine {
    pub fn new(kind: EngineKind, endpoint: &str, timeout: Duration) -> Result<Self> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| Error::Config(format!("engine '{}' endpoint: {}", kind, e)))?;
        Ok(Self {
            kind,
            endpoint,
            timeout,
        })
    }
}

#[async_trait]
impl SearchEngine for HttpSearchEngine {
    async fn query(
        &self,
        workspace_id: &str,
        workspace: &Workspace,
        query: &str,
        limit: usize,
        full_response: bool,
    ) -> Result<SearchResult> {
        let request_body = json!({
            "workspaceId": workspace_id,
            "workspace": workspace,
            "query": query,
            "limit": limit,
            "fullResponse": full_response,
        });

        debug!("{} query for workspace {}", self.kind, workspace_id);
        let res = http_client()
            .post(self.endpoint.clone())
            .timeout(self.timeout)
            .json(&request_body)
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await?;
            return Err(Error::BackendInvocation(format!(
                "{} search error ({}): {}",
                self.kind, status, text
            )));
        }

        Ok(res.json::<SearchResult>().await?)
    }
}
