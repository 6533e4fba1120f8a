use super::classifier::classify;
use super::invocation::invoke_with_timeout;
use super::job::{Job, PromptInput};
use crate::config::CompareConfig;
use crate::constants::COMPARE_SUB_SESSION_INFIX;
use crate::errors::{Error, Result};
use crate::llm::{AdapterRegistry, AdapterSettings, Attachments};
use crate::relay::StreamingRelay;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

/// Outcome of one prompt variant; exactly one of `response`/`error` is set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonResult {
    pub index: usize,
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ComparisonResult {
    fn succeeded(index: usize, prompt: &str, content: String, metadata: Map<String, Value>) -> Self {
        Self {
            index,
            prompt: prompt.to_string(),
            response: Some(content),
            metadata,
            error: None,
        }
    }

    fn failed(index: usize, prompt: &str, message: &str) -> Self {
        Self {
            index,
            prompt: prompt.to_string(),
            response: None,
            metadata: Map::new(),
            error: Some(message.to_string()),
        }
    }
}

/// Runs one job across several prompt variants against a single backend
pub struct ComparisonOrchestrator {
    adapters: Arc<AdapterRegistry>,
    relay: Arc<StreamingRelay>,
    defaults: CompareConfig,
    invoke_timeout: Duration,
}

impl ComparisonOrchestrator {
    pub fn new(
        adapters: Arc<AdapterRegistry>,
        relay: Arc<StreamingRelay>,
        defaults: CompareConfig,
        invoke_timeout: Duration,
    ) -> Self {
        Self {
            adapters,
            relay,
            defaults,
            invoke_timeout,
        }
    }

    /// Runs every prompt of `job` in order and pushes the aggregate report
    ///
    /// A failing variant is recorded and the remaining ones still run. An error is only
    /// returned when nothing could be started, in which case no report is pushed.
    ///
    /// # Errors
    /// * `Validation` when the job carries no prompt, or names only one of provider and model
    /// * `NotFound` when no adapter is registered for the provider and model
    pub async fn compare(&self, job: &Job) -> Result<Vec<ComparisonResult>> {
        let prompts: Vec<String> = match &job.prompt {
            PromptInput::Many(prompts) => prompts.clone(),
            PromptInput::Single(text) => vec![text.clone()],
            PromptInput::Empty => Vec::new(),
        };
        if prompts.is_empty() {
            return Err(Error::Validation(
                "At least one prompt is required".to_string(),
            ));
        }

        let (provider, model_id) = match (job.provider.as_deref(), job.model_id.as_deref()) {
            (Some(provider), Some(model_id)) => (provider, model_id),
            (None, None) => (
                self.defaults.provider.as_str(),
                self.defaults.model_id.as_str(),
            ),
            _ => {
                return Err(Error::Validation(
                    "provider and modelName must be given together".to_string(),
                ))
            }
        };
        let mode = job.mode.as_deref().unwrap_or(&self.defaults.mode);
        let factory = self.adapters.resolve(provider, model_id)?;

        let mut model_kwargs = self.defaults.model_kwargs.clone();
        model_kwargs.extend(job.model_kwargs.clone());

        let workspace_label = job.workspace_id.as_deref().unwrap_or("unknown");
        let total = prompts.len();
        info!(
            "Comparing {} prompts with {}.{} for session {}",
            total, provider, model_id, job.session_id
        );
        self.relay
            .emit_progress(
                &job.user_id,
                &job.session_id,
                &format!(
                    "Comparing {} prompts using workspace {}...\n\n",
                    total, workspace_label
                ),
            )
            .await;

        let mut results = Vec::with_capacity(total);
        for (index, prompt) in prompts.iter().enumerate() {
            let settings = AdapterSettings {
                model_id: model_id.to_string(),
                mode: mode.to_string(),
                session_id: format!("{}{}{}", job.session_id, COMPARE_SUB_SESSION_INFIX, index),
                user_id: job.user_id.clone(),
                model_kwargs: model_kwargs.clone(),
            };

            let outcome = match factory.create(settings) {
                Ok(adapter) => {
                    invoke_with_timeout(
                        adapter.as_ref(),
                        job.adapter_request(prompt, Attachments::default()),
                        None,
                        self.invoke_timeout,
                    )
                    .await
                }
                Err(e) => Err(e),
            };

            match outcome {
                Ok(response) => {
                    results.push(ComparisonResult::succeeded(
                        index,
                        prompt,
                        response.content,
                        response.metadata,
                    ));
                    self.relay
                        .emit_progress(
                            &job.user_id,
                            &job.session_id,
                            &format!("Completed prompt {}/{}\n", index + 1, total),
                        )
                        .await;
                }
                Err(e) => {
                    let raw = e.to_string();
                    error!(
                        "Error processing prompt {} of session {}: {}",
                        index, job.session_id, raw
                    );
                    results.push(ComparisonResult::failed(index, prompt, classify(&raw).text()));
                }
            }
        }

        let payload = json!({
            "sessionId": job.session_id,
            "type": "text",
            "content": format_comparison_results(workspace_label, &results),
            "metadata": {
                "compareResults": results,
                "workspaceId": job.workspace_id,
            },
        });
        self.relay
            .emit_final(&job.user_id, job.user_groups(), payload)
            .await;

        Ok(results)
    }
}

/// Renders comparison results as the markdown report shown to the user
pub fn format_comparison_results(workspace_label: &str, results: &[ComparisonResult]) -> String {
    let mut content = format!(
        "## Prompt Comparison Results (Workspace: {})\n\n",
        workspace_label
    );

    for result in results {
        content.push_str(&format!("### Prompt {}\n", result.index + 1));
        content.push_str(&format!("**Input:** {}\n\n", result.prompt));
        match (&result.response, &result.error) {
            (Some(response), _) => content.push_str(&format!("**Response:** {}\n\n", response)),
            (None, Some(error)) => content.push_str(&format!("**Response:** Error: {}\n\n", error)),
            (None, None) => content.push_str("**Response:** \n\n"),
        }

        if let Some(usage) = result.metadata.get("usage").and_then(Value::as_object) {
            let count = |key: &str| usage.get(key).and_then(Value::as_u64).unwrap_or(0);
            content.push_str(&format!(
                "**Usage:** {} input tokens, {} output tokens\n\n",
                count("input_tokens"),
                count("output_tokens")
            ));
        }

        content.push_str("---\n\n");
    }

    content
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::GENERIC_FAILURE_MESSAGE;
    use crate::core::{JobAction, RawRecord};
    use crate::event::ChatbotAction;
    use crate::llm::AdapterFactory;
    use crate::test_support::{RecordingTransport, ScriptedFactory};

    struct Harness {
        transport: Arc<RecordingTransport>,
        factory: Arc<ScriptedFactory>,
        orchestrator: ComparisonOrchestrator,
    }

    fn harness(factory: ScriptedFactory) -> Harness {
        harness_with(factory, CompareConfig::default())
    }

    fn harness_with(factory: ScriptedFactory, defaults: CompareConfig) -> Harness {
        let transport = Arc::new(RecordingTransport::default());
        let factory = Arc::new(factory);
        let registered: Arc<dyn AdapterFactory> = factory.clone();
        let registry = AdapterRegistry::new([(
            AdapterRegistry::key("anthropic", "claude-3-haiku-20240307"),
            registered,
        )]);
        let orchestrator = ComparisonOrchestrator::new(
            Arc::new(registry),
            Arc::new(StreamingRelay::new(transport.clone())),
            defaults,
            Duration::from_secs(5),
        );
        Harness {
            transport,
            factory,
            orchestrator,
        }
    }

    fn compare_job(prompts: &[&str]) -> Job {
        let body = json!({
            "userId": "user-1",
            "userGroups": ["team"],
            "action": "compare",
            "data": {
                "sessionId": "sess",
                "prompts": prompts,
                "workspaceId": "ws1",
                "modelKwargs": {"maxTokens": 64}
            }
        });
        let job = Job::parse(&RawRecord::new("m1", &body.to_string())).unwrap();
        assert_eq!(job.action, JobAction::Compare);
        job
    }

    #[tokio::test]
    async fn results_follow_prompt_order_with_isolated_failure() {
        let h = harness(ScriptedFactory::default());
        let job = compare_job(&["first", "bad prompt", "third"]);

        let results = h.orchestrator.compare(&job).await.unwrap();

        assert_eq!(results.len(), 3);
        for (i, result) in results.iter().enumerate() {
            assert_eq!(result.index, i);
            assert!(result.response.is_some() != result.error.is_some());
        }
        assert_eq!(results[0].prompt, "first");
        assert_eq!(results[1].error.as_deref(), Some(GENERIC_FAILURE_MESSAGE));
        assert_eq!(results[2].response.as_deref(), Some("echo: third"));
    }

    #[tokio::test]
    async fn each_variant_gets_its_own_sub_session() {
        let h = harness(ScriptedFactory::default());
        h.orchestrator
            .compare(&compare_job(&["a", "b", "c"]))
            .await
            .unwrap();

        let sessions: Vec<String> = h
            .factory
            .settings()
            .iter()
            .map(|s| s.session_id.clone())
            .collect();
        assert_eq!(sessions, vec!["sess_prompt_0", "sess_prompt_1", "sess_prompt_2"]);

        let settings = &h.factory.settings()[0];
        assert_eq!(settings.model_kwargs["temperature"], 0.1);
        assert_eq!(settings.model_kwargs["maxTokens"], 64);
        assert!(h
            .factory
            .requests()
            .iter()
            .all(|r| r.attachments.is_empty() && r.workspace_id.as_deref() == Some("ws1")));
    }

    #[tokio::test]
    async fn variants_use_configured_mode_when_job_names_none() {
        let defaults = CompareConfig {
            mode: "agent".to_string(),
            ..CompareConfig::default()
        };
        let h = harness_with(ScriptedFactory::default(), defaults);
        let job = compare_job(&["a", "b"]);
        assert!(job.mode.is_none());

        h.orchestrator.compare(&job).await.unwrap();

        let modes: Vec<String> = h.factory.settings().iter().map(|s| s.mode.clone()).collect();
        assert_eq!(modes, vec!["agent", "agent"]);
    }

    #[tokio::test]
    async fn job_mode_overrides_configured_mode() {
        let h = harness(ScriptedFactory::default());
        let mut job = compare_job(&["a"]);
        job.mode = Some("rag".to_string());

        h.orchestrator.compare(&job).await.unwrap();

        assert_eq!(h.factory.settings()[0].mode, "rag");
    }

    #[tokio::test]
    async fn streams_progress_then_one_final_report() {
        let h = harness(ScriptedFactory::default());
        h.orchestrator
            .compare(&compare_job(&["a", "bad", "c"]))
            .await
            .unwrap();

        let events = h.transport.events();
        let contents: Vec<(ChatbotAction, String)> = events
            .iter()
            .map(|(_, e)| {
                (
                    e.action,
                    e.data["content"].as_str().unwrap_or_default().to_string(),
                )
            })
            .collect();

        assert_eq!(contents[0].1, "Comparing 3 prompts using workspace ws1...\n\n");
        assert_eq!(contents[1].1, "Completed prompt 1/3\n");
        assert_eq!(contents[2].1, "Completed prompt 3/3\n");
        assert_eq!(contents.len(), 4);
        assert!(contents[..3]
            .iter()
            .all(|(action, _)| *action == ChatbotAction::LlmNewToken));
        assert!(h.transport.tokens().is_empty());

        let (user, last) = events.last().unwrap();
        assert_eq!(user, "user-1");
        assert_eq!(last.action, ChatbotAction::FinalResponse);
        assert_eq!(last.user_groups.as_deref(), Some(&["team".to_string()][..]));
        assert_eq!(last.data["sessionId"], "sess");
        assert_eq!(last.data["metadata"]["workspaceId"], "ws1");
        assert_eq!(
            last.data["metadata"]["compareResults"]
                .as_array()
                .unwrap()
                .len(),
            3
        );
        let report = last.data["content"].as_str().unwrap();
        assert!(report.starts_with("## Prompt Comparison Results (Workspace: ws1)\n\n"));
        assert!(report.contains("**Response:** Error: ⚠️ *Something went wrong*"));
        assert!(!report.contains("ThrottlingException"));
    }

    #[tokio::test]
    async fn unresolvable_backend_fails_before_announcing() {
        let h = harness(ScriptedFactory::default());
        let mut job = compare_job(&["a", "b"]);
        job.provider = Some("acme".to_string());
        job.model_id = Some("claude-3-haiku-20240307".to_string());

        let err = h.orchestrator.compare(&job).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert!(h.transport.events().is_empty());
    }

    #[tokio::test]
    async fn provider_without_model_is_rejected() {
        let h = harness(ScriptedFactory::default());
        let mut job = compare_job(&["a", "b"]);
        job.provider = Some("anthropic".to_string());

        let err = h.orchestrator.compare(&job).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(h.factory.settings().is_empty());

        let mut job = compare_job(&["a"]);
        job.model_id = Some("claude-3-haiku-20240307".to_string());
        let err = h.orchestrator.compare(&job).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(h.transport.events().is_empty());
    }

    #[tokio::test]
    async fn explicit_pair_selects_registered_backend() {
        let h = harness(ScriptedFactory::default());
        let mut job = compare_job(&["a"]);
        job.provider = Some("anthropic".to_string());
        job.model_id = Some("claude-3-haiku-20240307".to_string());

        let results = h.orchestrator.compare(&job).await.unwrap();
        assert_eq!(results[0].response.as_deref(), Some("echo: a"));
        assert_eq!(h.factory.settings()[0].model_id, "claude-3-haiku-20240307");
    }

    #[tokio::test]
    async fn empty_prompt_list_is_rejected() {
        let h = harness(ScriptedFactory::default());
        let err = h.orchestrator.compare(&compare_job(&[])).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn formats_report_with_usage() {
        let mut metadata = Map::new();
        metadata.insert(
            "usage".to_string(),
            json!({"input_tokens": 12, "output_tokens": 30}),
        );
        let results = vec![
            ComparisonResult::succeeded(0, "What is RAG?", "Retrieval.".to_string(), metadata),
            ComparisonResult::failed(1, "Explain", "⚠️ *Something went wrong*"),
        ];

        let report = format_comparison_results("unknown", &results);
        assert_eq!(
            report,
            "## Prompt Comparison Results (Workspace: unknown)\n\n\
             ### Prompt 1\n**Input:** What is RAG?\n\n**Response:** Retrieval.\n\n\
             **Usage:** 12 input tokens, 30 output tokens\n\n---\n\n\
             ### Prompt 2\n**Input:** Explain\n\n\
             **Response:** Error: ⚠️ *Something went wrong*\n\n---\n\n"
        );
    }
}
