use crate::errors::Error;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Retrieval backends a workspace can be bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineKind {
    Aurora,
    Opensearch,
    Kendra,
    BedrockKb,
}

impl EngineKind {
    pub const ALL: [EngineKind; 4] = [
        EngineKind::Aurora,
        EngineKind::Opensearch,
        EngineKind::Kendra,
        EngineKind::BedrockKb,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EngineKind::Aurora => "aurora",
            EngineKind::Opensearch => "opensearch",
            EngineKind::Kendra => "kendra",
            EngineKind::BedrockKb => "bedrock_kb",
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EngineKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EngineKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| Error::UnsupportedEngine(s.to_string()))
    }
}

/// Lifecycle status of a workspace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkspaceStatus {
    Creating,
    Ready,
    Error,
    #[serde(other)]
    Unknown,
}

impl fmt::Display for WorkspaceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            WorkspaceStatus::Creating => "creating",
            WorkspaceStatus::Ready => "ready",
            WorkspaceStatus::Error => "error",
            WorkspaceStatus::Unknown => "unknown",
        };
        f.write_str(label)
    }
}

/// A knowledge base bound to exactly one engine
///
/// The engine is kept as the raw string recorded at creation time so that
/// workspaces bound to an engine this process does not know can still be read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workspace {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub status: WorkspaceStatus,
    pub engine: String,
}

impl Workspace {
    pub fn is_ready(&self) -> bool {
        self.status == WorkspaceStatus::Ready
    }
}

/// One retrieved passage
///
/// Engines may answer in snake_case; known fields are accepted under both spellings and
/// always written back in camelCase. Fields this type does not know are forwarded as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chunk {
    #[serde(default, alias = "chunk_id")]
    pub chunk_id: String,
    #[serde(default, alias = "document_id")]
    pub document_id: String,
    #[serde(default, alias = "document_sub_id")]
    pub document_sub_id: Option<String>,
    #[serde(default, alias = "document_type")]
    pub document_type: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, alias = "content_complement")]
    pub content_complement: String,
    #[serde(default, alias = "vector_search_score")]
    pub vector_search_score: Option<f64>,
    #[serde(default, alias = "keyword_search_score")]
    pub keyword_search_score: Option<f64>,
    #[serde(default)]
    pub score: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Raw engine answer, tagged with the engine that produced it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    #[serde(default)]
    pub engine: String,
    #[serde(default, alias = "workspace_id")]
    pub workspace_id: String,
    #[serde(default)]
    pub items: Vec<Chunk>,
    #[serde(
        default,
        alias = "vector_search_items",
        skip_serializing_if = "Option::is_none"
    )]
    pub vector_search_items: Option<Vec<Chunk>>,
    #[serde(
        default,
        alias = "keyword_search_items",
        skip_serializing_if = "Option::is_none"
    )]
    pub keyword_search_items: Option<Vec<Chunk>>,
}

/// Outcome of one prompt inside a search comparison; exactly one of `result`/`error` is set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptComparison {
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<SearchResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PromptComparison {
    pub fn succeeded(prompt: &str, result: SearchResult) -> Self {
        Self {
            prompt: prompt.to_string(),
            result: Some(result),
            error: None,
        }
    }

    pub fn failed(prompt: &str, error: String) -> Self {
        Self {
            prompt: prompt.to_string(),
            result: None,
            error: Some(error),
        }
    }
}

/// Aggregate answer of a search comparison, ordered as the request's prompts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonReport {
    pub workspace_id: String,
    pub total_prompts: usize,
    pub engine: String,
    #[serde(rename = "promptsComparison")]
    pub per_prompt: Vec<PromptComparison>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn engine_names_round_trip_through_from_str() {
        for kind in EngineKind::ALL {
            assert_eq!(kind.as_str().parse::<EngineKind>().unwrap(), kind);
        }
        assert!(matches!(
            "elastic".parse::<EngineKind>(),
            Err(Error::UnsupportedEngine(name)) if name == "elastic"
        ));
    }

    #[test]
    fn unknown_workspace_status_is_not_ready() {
        let ws: Workspace =
            serde_json::from_value(json!({"id": "ws", "status": "deleting", "engine": "aurora"}))
                .unwrap();
        assert_eq!(ws.status, WorkspaceStatus::Unknown);
        assert!(!ws.is_ready());
    }

    #[test]
    fn chunk_normalizes_snake_case_fields() {
        let chunk: Chunk = serde_json::from_value(json!({
            "sources": ["doc1"],
            "chunk_id": "chunk1",
            "workspace_id": "test-workspace",
            "document_id": "doc1",
            "document_sub_id": null,
            "document_type": "text",
            "path": "/test/doc1.txt",
            "language": "en",
            "title": "Test Document",
            "content": "Test content",
            "content_complement": "",
            "vector_search_score": 0.9,
            "keyword_search_score": null,
            "score": 0.9
        }))
        .unwrap();

        assert_eq!(chunk.chunk_id, "chunk1");
        assert_eq!(chunk.vector_search_score, Some(0.9));

        let out = serde_json::to_value(&chunk).unwrap();
        assert_eq!(out["chunkId"], "chunk1");
        assert_eq!(out["documentType"], "text");
        assert_eq!(out["vectorSearchScore"], 0.9);
        assert!(out["keywordSearchScore"].is_null());
        assert!(out.get("chunk_id").is_none());
        // engine-specific fields pass through untouched
        assert_eq!(out["sources"], json!(["doc1"]));
        assert_eq!(out["workspace_id"], "test-workspace");
    }

    #[test]
    fn report_serializes_prompts_comparison_in_order() {
        let report = ComparisonReport {
            workspace_id: "ws".to_string(),
            total_prompts: 2,
            engine: "kendra".to_string(),
            per_prompt: vec![
                PromptComparison::succeeded("a", SearchResult::default()),
                PromptComparison::failed("b", "boom".to_string()),
            ],
        };
        let out = serde_json::to_value(&report).unwrap();
        assert_eq!(out["workspaceId"], "ws");
        assert_eq!(out["totalPrompts"], 2);
        assert_eq!(out["promptsComparison"][0]["prompt"], "a");
        assert!(out["promptsComparison"][0]["error"].is_null());
        assert_eq!(out["promptsComparison"][1]["error"], "boom");
        assert!(out["promptsComparison"][1]["result"].is_null());
    }
}
