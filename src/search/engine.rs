use super::{EngineKind, SearchResult, Workspace};
use crate::config::SearchConfig;
use crate::errors::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt::Debug;
use std::str::FromStr;
use std::sync::Arc;

use super::HttpSearchEngine;

/// A retrieval backend able to answer queries for the workspaces bound to it
#[async_trait]
pub trait SearchEngine: Debug + Send + Sync {
    /// Runs a query against one workspace
    ///
    /// # Arguments
    /// * `workspace_id` - Id of the queried workspace
    /// * `workspace` - The workspace record, already checked to be ready
    /// * `query` - Query text
    /// * `limit` - Maximum number of items to return
    /// * `full_response` - Whether per-strategy item lists should be included
    async fn query(
        &self,
        workspace_id: &str,
        workspace: &Workspace,
        query: &str,
        limit: usize,
        full_response: bool,
    ) -> Result<SearchResult>;
}

/// Engine lookup table, fixed once built
#[derive(Debug, Default, Clone)]
pub struct EngineRegistry {
    engines: HashMap<EngineKind, Arc<dyn SearchEngine>>,
}

impl EngineRegistry {
    pub fn new(engines: impl IntoIterator<Item = (EngineKind, Arc<dyn SearchEngine>)>) -> Self {
        Self {
            engines: engines.into_iter().collect(),
        }
    }

    /// Builds one HTTP engine client per configured endpoint
    pub fn from_config(config: &SearchConfig) -> Result<Self> {
        let mut engines: Vec<(EngineKind, Arc<dyn SearchEngine>)> = Vec::new();
        for (name, engine) in &config.engines {
            let kind = EngineKind::from_str(name)?;
            let client = HttpSearchEngine::new(kind, &engine.endpoint, engine.timeout)?;
            engines.push((kind, Arc::new(client)));
        }
        Ok(Self::new(engines))
    }

    pub fn get(&self, kind: EngineKind) -> Option<&Arc<dyn SearchEngine>> {
        self.engines.get(&kind)
    }

    pub fn kinds(&self) -> Vec<EngineKind> {
        let mut kinds: Vec<_> = self.engines.keys().copied().collect();
        kinds.sort();
        kinds
    }
}
