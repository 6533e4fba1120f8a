use super::{ComparisonReport, PromptComparison, SearchDispatcher};
use crate::core::client_message;
use crate::errors::{Error, Result};
use tracing::{info, warn};

/// Hard cap on the number of prompts compared in one request
pub const MAX_COMPARE_PROMPTS: usize = 10;

/// Runs one query per prompt against the same workspace and collects every outcome
#[derive(Debug, Clone)]
pub struct SearchComparison {
    dispatcher: SearchDispatcher,
}

impl SearchComparison {
    pub fn new(dispatcher: SearchDispatcher) -> Self {
        Self { dispatcher }
    }

    /// Compares several prompts against one workspace
    ///
    /// The workspace is looked up once. A failing prompt is recorded with its error and
    /// does not stop the others; entries keep the order of `prompts`.
    ///
    /// # Arguments
    /// * `workspace_id` - Workspace to query
    /// * `prompts` - Between one and `MAX_COMPARE_PROMPTS` query texts
    /// * `limit` - Maximum number of items per prompt
    /// * `full_response` - Whether per-strategy item lists are requested
    pub async fn compare(
        &self,
        workspace_id: &str,
        prompts: &[String],
        limit: usize,
        full_response: bool,
    ) -> Result<ComparisonReport> {
        if prompts.is_empty() {
            return Err(Error::Validation(
                "At least one prompt is required".to_string(),
            ));
        }
        if prompts.len() > MAX_COMPARE_PROMPTS {
            return Err(Error::Validation(format!(
                "Maximum {} prompts allowed for comparison",
                MAX_COMPARE_PROMPTS
            )));
        }

        let workspace = self.dispatcher.ready_workspace(workspace_id).await?;
        info!(
            "Comparing {} prompts on workspace {} ({})",
            prompts.len(),
            workspace.id,
            workspace.engine
        );

        let mut per_prompt = Vec::with_capacity(prompts.len());
        for (index, prompt) in prompts.iter().enumerate() {
            match self
                .dispatcher
                .search_in(&workspace, prompt, limit, full_response)
                .await
            {
                Ok(result) => per_prompt.push(PromptComparison::succeeded(prompt, result)),
                Err(e) => {
                    warn!("Prompt {} of comparison failed: {}", index + 1, e);
                    per_prompt.push(PromptComparison::failed(prompt, client_message(&e)));
                }
            }
        }

        Ok(ComparisonReport {
            workspace_id: workspace_id.to_string(),
            total_prompts: prompts.len(),
            engine: workspace.engine.clone(),
            per_prompt,
        })
    }
}
