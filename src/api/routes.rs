//! API routes configuration module

use crate::api::handlers::{enqueue_job, health, search, search_compare};
use crate::api::ws::ws_handler;
use crate::core::JobQueue;
use crate::relay::ConnectionManager;
use crate::search::{SearchComparison, SearchDispatcher};
use axum::{
    routing::{get, post},
    Extension, Router,
};
use std::sync::Arc;

/// Handles shared by every request handler
#[derive(Clone)]
pub struct AppState {
    pub queue: JobQueue,
    pub dispatcher: SearchDispatcher,
    pub comparison: SearchComparison,
    pub connections: Arc<ConnectionManager>,
}

/// Creates the API router
///
/// # Arguments
/// * `state` - Queue, search services and connections shared across handlers
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/jobs", post(enqueue_job))
        .route("/search", post(search))
        .route("/search/compare", post(search_compare))
        .route("/ws", get(ws_handler))
        .route("/health", get(health))
        .layer(Extension(state))
}
