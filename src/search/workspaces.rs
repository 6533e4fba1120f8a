use super::Workspace;
use crate::errors::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt::Debug;

/// Read access to workspace records
#[async_trait]
pub trait WorkspaceStore: Debug + Send + Sync {
    async fn get_workspace(&self, workspace_id: &str) -> Result<Option<Workspace>>;
}

/// Workspace store seeded once from configuration
#[derive(Debug, Default)]
pub struct InMemoryWorkspaceStore {
    workspaces: HashMap<String, Workspace>,
}

impl InMemoryWorkspaceStore {
    pub fn new(workspaces: impl IntoIterator<Item = Workspace>) -> Self {
        Self {
            workspaces: workspaces
                .into_iter()
                .map(|ws| (ws.id.clone(), ws))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.workspaces.len()
    }
}

#[async_trait]
impl WorkspaceStore for InMemoryWorkspaceStore {
    async fn get_workspace(&self, workspace_id: &str) -> Result<Option<Workspace>> {
        Ok(self.workspaces.get(workspace_id).cloned())
    }
}
