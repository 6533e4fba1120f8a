//! Doubles shared by the unit tests

use crate::errors::{Error, Result};
use crate::event::{ChatbotAction, ClientEvent, TokenEvent};
use crate::llm::{
    new_run_id, AdapterFactory, AdapterRequest, AdapterResponse, AdapterSettings, ModelAdapter,
    TokenListener,
};
use crate::relay::Transport;
use crate::search::{
    Chunk, InMemoryWorkspaceStore, SearchEngine, SearchResult, Workspace, WorkspaceStatus,
    WorkspaceStore,
};
use async_trait::async_trait;
use serde_json::{json, Map};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub fn workspace(id: &str, engine: &str) -> Workspace {
    Workspace {
        id: id.to_string(),
        name: Some(format!("{} workspace", id)),
        status: WorkspaceStatus::Ready,
        engine: engine.to_string(),
    }
}

pub fn prompts(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("prompt {}", i)).collect()
}

/// Transport keeping every pushed event
#[derive(Default)]
pub struct RecordingTransport {
    events: Mutex<Vec<(String, ClientEvent)>>,
    unreachable: bool,
}

impl RecordingTransport {
    /// A transport whose client is never connected
    pub fn unreachable() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            unreachable: true,
        }
    }

    pub fn events(&self) -> Vec<(String, ClientEvent)> {
        self.events.lock().unwrap().clone()
    }

    /// Token events in push order
    pub fn tokens(&self) -> Vec<TokenEvent> {
        self.events()
            .into_iter()
            .filter(|(_, e)| e.action == ChatbotAction::LlmNewToken)
            .filter_map(|(_, e)| e.data.get("token").cloned())
            .map(|token| serde_json::from_value(token).unwrap())
            .collect()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn push(&self, user_id: &str, event: &ClientEvent) -> Result<()> {
        if self.unreachable {
            return Err(Error::Transport(format!(
                "no active connection for user {}",
                user_id
            )));
        }
        self.events
            .lock()
            .unwrap()
            .push((user_id.to_string(), event.clone()));
        Ok(())
    }
}

/// Adapter factory whose adapters answer `echo: <prompt>` word by word
///
/// Prompts steer failures: `bad` fails with an unrecognised vendor error, `image-size` with
/// a known one, `slow` sleeps for seconds and `panic` panics.
#[derive(Debug, Default)]
pub struct ScriptedFactory {
    settings: Mutex<Vec<AdapterSettings>>,
    requests: Arc<Mutex<Vec<AdapterRequest>>>,
}

impl ScriptedFactory {
    pub fn settings(&self) -> Vec<AdapterSettings> {
        self.settings.lock().unwrap().clone()
    }

    pub fn requests(&self) -> Vec<AdapterRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl AdapterFactory for ScriptedFactory {
    fn create(&self, settings: AdapterSettings) -> Result<Box<dyn ModelAdapter>> {
        self.settings.lock().unwrap().push(settings.clone());
        Ok(Box::new(ScriptedAdapter {
            settings,
            requests: self.requests.clone(),
        }))
    }
}

#[derive(Debug)]
struct ScriptedAdapter {
    settings: AdapterSettings,
    requests: Arc<Mutex<Vec<AdapterRequest>>>,
}

#[async_trait]
impl ModelAdapter for ScriptedAdapter {
    fn streaming_enabled(&self) -> bool {
        self.settings.streaming()
    }

    async fn invoke(
        &self,
        request: AdapterRequest,
        listener: Option<&dyn TokenListener>,
    ) -> Result<AdapterResponse> {
        self.requests.lock().unwrap().push(request.clone());
        let prompt = request.prompt;

        if prompt.contains("panic") {
            panic!("scripted adapter panicked on '{}'", prompt);
        }
        if prompt.contains("slow") {
            tokio::time::sleep(Duration::from_secs(10)).await;
        }
        if prompt.contains("image-size") {
            return Err(Error::BackendInvocation(
                "An error occurred (ValidationException) when calling the InvokeModel \
                 operation: The provided image must have dimensions in set [1280x720]"
                    .to_string(),
            ));
        }
        if prompt.contains("bad") {
            return Err(Error::BackendInvocation(format!(
                "An error occurred (ThrottlingException) at \
                 arn:aws:bedrock:us-east-1:123456789012:model/x for '{}'",
                prompt
            )));
        }

        let content = format!("echo: {}", prompt);
        let run_id = new_run_id();
        if let Some(listener) = listener {
            for word in content.split_whitespace() {
                listener.on_token(&run_id, word).await;
                tokio::task::yield_now().await;
            }
        }

        let mut metadata = Map::new();
        metadata.insert(
            "usage".to_string(),
            json!({
                "input_tokens": prompt.split_whitespace().count(),
                "output_tokens": content.split_whitespace().count(),
            }),
        );
        Ok(AdapterResponse {
            session_id: self.settings.session_id.clone(),
            content,
            metadata,
        })
    }
}

/// Arguments of one engine query
#[derive(Debug, Clone, PartialEq)]
pub struct EngineCall {
    pub workspace_id: String,
    pub workspace: Workspace,
    pub query: String,
    pub limit: usize,
    pub full_response: bool,
}

/// Engine recording its calls; queries containing a configured needle fail
#[derive(Debug, Default)]
pub struct StubEngine {
    calls: Mutex<Vec<EngineCall>>,
    failing: Vec<String>,
}

impl StubEngine {
    pub fn failing_on(needles: &[&str]) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            failing: needles.iter().map(|n| n.to_string()).collect(),
        }
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SearchEngine for StubEngine {
    async fn query(
        &self,
        workspace_id: &str,
        workspace: &Workspace,
        query: &str,
        limit: usize,
        full_response: bool,
    ) -> Result<SearchResult> {
        self.calls.lock().unwrap().push(EngineCall {
            workspace_id: workspace_id.to_string(),
            workspace: workspace.clone(),
            query: query.to_string(),
            limit,
            full_response,
        });

        if self.failing.iter().any(|needle| query.contains(needle.as_str())) {
            return Err(Error::BackendInvocation(format!(
                "engine rejected query '{}'",
                query
            )));
        }

        Ok(SearchResult {
            engine: "raw".to_string(),
            items: vec![Chunk {
                chunk_id: "chunk-1".to_string(),
                document_id: "doc-1".to_string(),
                content: format!("match for {}", query),
                score: 0.9,
                ..Chunk::default()
            }],
            ..SearchResult::default()
        })
    }
}

/// Workspace store counting its lookups
#[derive(Debug)]
pub struct CountingWorkspaceStore {
    inner: InMemoryWorkspaceStore,
    lookups: AtomicUsize,
}

impl CountingWorkspaceStore {
    pub fn new(workspaces: Vec<Workspace>) -> Self {
        Self {
            inner: InMemoryWorkspaceStore::new(workspaces),
            lookups: AtomicUsize::new(0),
        }
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WorkspaceStore for CountingWorkspaceStore {
    async fn get_workspace(&self, workspace_id: &str) -> Result<Option<Workspace>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.inner.get_workspace(workspace_id).await
    }
}
