use super::{EngineKind, EngineRegistry, SearchResult, Workspace, WorkspaceStore};
use crate::errors::{Error, Result};
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;

/// Default number of items returned by a query when the caller does not ask for more
pub const DEFAULT_SEARCH_LIMIT: usize = 5;

/// Routes a query to the engine bound to the target workspace
#[derive(Debug, Clone)]
pub struct SearchDispatcher {
    workspaces: Arc<dyn WorkspaceStore>,
    engines: Arc<EngineRegistry>,
}

impl SearchDispatcher {
    pub fn new(workspaces: Arc<dyn WorkspaceStore>, engines: Arc<EngineRegistry>) -> Self {
        Self {
            workspaces,
            engines,
        }
    }

    /// Runs a single query
    ///
    /// # Arguments
    /// * `workspace_id` - Workspace to query
    /// * `query` - Query text
    /// * `limit` - Maximum number of items
    /// * `full_response` - Whether per-strategy item lists are requested
    ///
    /// # Returns
    /// * `Result<SearchResult>` - The engine's answer tagged with the engine name.
    ///   Fails with `NotFound`, `NotReady` or `UnsupportedEngine` before any engine call.
    pub async fn search(
        &self,
        workspace_id: &str,
        query: &str,
        limit: usize,
        full_response: bool,
    ) -> Result<SearchResult> {
        let workspace = self.ready_workspace(workspace_id).await?;
        self.search_in(&workspace, query, limit, full_response)
            .await
    }

    /// Looks up a workspace and checks it can serve queries
    pub(crate) async fn ready_workspace(&self, workspace_id: &str) -> Result<Workspace> {
        let workspace = self
            .workspaces
            .get_workspace(workspace_id)
            .await?
            .ok_or_else(|| Error::NotFound("Workspace".to_string()))?;

        if !workspace.is_ready() {
            return Err(Error::NotReady(workspace.status.to_string()));
        }
        Ok(workspace)
    }

    /// Runs a query against an already resolved workspace
    pub(crate) async fn search_in(
        &self,
        workspace: &Workspace,
        query: &str,
        limit: usize,
        full_response: bool,
    ) -> Result<SearchResult> {
        if query.trim().is_empty() {
            return Err(Error::Validation("query must not be empty".to_string()));
        }
        if limit == 0 {
            return Err(Error::Validation("limit must be positive".to_string()));
        }

        let kind = EngineKind::from_str(&workspace.engine)?;
        let engine = self
            .engines
            .get(kind)
            .ok_or_else(|| Error::UnsupportedEngine(kind.to_string()))?;

        debug!(
            "Dispatching query to {} for workspace {} (limit {})",
            kind, workspace.id, limit
        );
        let mut result = engine
            .query(&workspace.id, workspace, query, limit, full_response)
            .await?;

        result.engine = kind.as_str().to_string();
        if result.workspace_id.is_empty() {
            result.workspace_id = workspace.id.clone();
        }
        Ok(result)
    }
}
