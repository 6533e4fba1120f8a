use crate::api::errors::{api_error, ApiError};
use crate::api::routes::AppState;
use crate::core::JobEnvelope;
use crate::errors::Error;
use crate::search::{ComparisonReport, SearchResult, MAX_COMPARE_PROMPTS};
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::{extract::Extension, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

/// Longest query or prompt accepted, in characters
pub const MAX_QUERY_CHARS: usize = 256;
/// Items returned when the request does not set `limit`
pub const DEFAULT_API_LIMIT: usize = 25;
pub const MAX_API_LIMIT: usize = 100;
/// Fewest prompts a search comparison accepts
pub const MIN_COMPARE_PROMPTS: usize = 2;

/// Request payload of `POST /search`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub workspace_id: String,
    pub query: String,
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Request payload of `POST /search/compare`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchCompareRequest {
    pub workspace_id: String,
    pub prompts: Vec<String>,
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Response payload of `POST /jobs`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnqueueResponse {
    pub message_id: String,
    /// Session the job's events are pushed under, generated when the envelope has none
    pub session_id: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub connections: usize,
}

/// Queues a job envelope for the consumer
///
/// The envelope is parsed once up front so that malformed bodies are rejected here
/// instead of being dropped by the consumer. The session id is resolved before queueing
/// and returned, so a generated one is the same one the consumer pushes events under.
#[axum::debug_handler]
pub async fn enqueue_job(
    Extension(state): Extension<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<EnqueueResponse>), ApiError> {
    let Json(body) = payload?;
    let mut envelope = JobEnvelope::from_value(body)?;
    let session_id = envelope.ensure_session_id().to_string();
    let body = serde_json::to_string(&envelope).map_err(Error::from)?;

    let message_id = state.queue.enqueue(body).await?;
    info!("Queued job {} for session {}", message_id, session_id);
    Ok((
        StatusCode::ACCEPTED,
        Json(EnqueueResponse {
            message_id,
            session_id,
        }),
    ))
}

/// Runs one semantic search
#[axum::debug_handler]
pub async fn search(
    Extension(state): Extension<AppState>,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Json<SearchResult>, ApiError> {
    let Json(request) = payload?;
    check_text("query", &request.query)?;
    let limit = resolve_limit(request.limit)?;

    let result = state
        .dispatcher
        .search(&request.workspace_id, &request.query, limit, true)
        .await?;
    Ok(Json(result))
}

/// Runs the same search for several prompts
#[axum::debug_handler]
pub async fn search_compare(
    Extension(state): Extension<AppState>,
    payload: Result<Json<SearchCompareRequest>, JsonRejection>,
) -> Result<Json<ComparisonReport>, ApiError> {
    let Json(request) = payload?;
    if request.prompts.len() < MIN_COMPARE_PROMPTS || request.prompts.len() > MAX_COMPARE_PROMPTS {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            &format!(
                "Between {} and {} prompts are required",
                MIN_COMPARE_PROMPTS, MAX_COMPARE_PROMPTS
            ),
        ));
    }
    for prompt in &request.prompts {
        check_text("prompt", prompt)?;
    }
    let limit = resolve_limit(request.limit)?;

    let report = state
        .comparison
        .compare(&request.workspace_id, &request.prompts, limit, true)
        .await?;
    Ok(Json(report))
}

pub async fn health(Extension(state): Extension<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        connections: state.connections.connection_count().await,
    })
}

fn check_text(field: &str, value: &str) -> Result<(), ApiError> {
    let len = value.chars().count();
    if value.trim().is_empty() || len > MAX_QUERY_CHARS {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            &format!("{} must be between 1 and {} characters", field, MAX_QUERY_CHARS),
        ));
    }
    Ok(())
}

fn resolve_limit(limit: Option<usize>) -> Result<usize, ApiError> {
    match limit.unwrap_or(DEFAULT_API_LIMIT) {
        limit @ 1..=MAX_API_LIMIT => Ok(limit),
        _ => Err(api_error(
            StatusCode::BAD_REQUEST,
            &format!("limit must be between 1 and {}", MAX_API_LIMIT),
        )),
    }
}
