//! Main entry point for the relay.
//!
//! Initializes logging, loads environment variables and configuration, then runs the job
//! consumer next to the HTTP/WebSocket API until interrupted.

mod api;
mod cli;
mod config;
mod constants;
mod core;
mod errors;
mod event;
mod llm;
mod relay;
mod search;
#[cfg(test)]
mod test_support;
mod utils;

use crate::api::routes::AppState;
use crate::core::{job_queue, JobConsumer};
use crate::llm::AdapterRegistry;
use crate::relay::{ConnectionManager, StreamingRelay};
use crate::search::{EngineRegistry, InMemoryWorkspaceStore, SearchComparison, SearchDispatcher};
use clap::Parser;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Main entry point that initializes and runs the relay.
///
/// # Initialization steps:
/// 1. Parse CLI arguments
/// 2. Initialize logging system
/// 3. Load environment variables and configuration
/// 4. Build the backend registries, relay and consumer
/// 5. Run the consumer and the API server until Ctrl-C
#[tokio::main]
async fn main() {
    let cli = cli::Cli::parse();
    utils::init_logging(&cli.logging_level, cli.log_to_file);

    if let Err(e) = dotenvy::dotenv() {
        warn!("Failed to load .env file: {}", e);
    }

    let mut config = match config::load_relay_config(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration from {}: {}", cli.config, e);
            return;
        }
    };
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    let adapters = match AdapterRegistry::from_config(&config.models) {
        Ok(registry) => Arc::new(registry),
        Err(e) => {
            error!("Failed to register model adapters: {}", e);
            return;
        }
    };
    let engines = match EngineRegistry::from_config(&config.search) {
        Ok(registry) => Arc::new(registry),
        Err(e) => {
            error!("Failed to register search engines: {}", e);
            return;
        }
    };
    let workspaces = Arc::new(InMemoryWorkspaceStore::new(
        config.search.workspaces.clone(),
    ));
    info!(
        "Registered {} adapters, engines {:?}, {} workspaces",
        adapters.len(),
        engines.kinds(),
        workspaces.len()
    );

    let connections = Arc::new(ConnectionManager::new());
    let relay = Arc::new(StreamingRelay::new(connections.clone()));
    let consumer = JobConsumer::new(
        adapters,
        relay,
        config.compare.clone(),
        &config.consumer,
    );
    let (queue, intake) = job_queue(config.consumer.queue_capacity);

    let dispatcher = SearchDispatcher::new(workspaces, engines);
    let state = AppState {
        queue,
        comparison: SearchComparison::new(dispatcher.clone()),
        dispatcher,
        connections: connections.clone(),
    };

    let consumer_task = tokio::spawn(async move { consumer.run(intake).await });

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
    let host = config.server.host.clone();
    let port = config.server.port;
    let mut server_task = tokio::spawn(async move {
        crate::api::server::launch_server(&host, port, state, async move {
            let _ = shutdown_rx.await;
        })
        .await
    });

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown requested");
            let _ = shutdown_tx.send(());
            connections.shutdown_all().await;
            match server_task.await {
                Ok(Err(e)) => error!("API server error: {}", e),
                Err(e) => error!("API server task failed: {}", e),
                Ok(Ok(())) => {}
            }
        }
        result = &mut server_task => {
            match result {
                Ok(Ok(())) => info!("API server stopped"),
                Ok(Err(e)) => error!("Failed to start server: {}", e),
                Err(e) => error!("API server task failed: {}", e),
            }
        }
    }

    connections.shutdown_all().await;
    if let Err(e) = consumer_task.await {
        error!("Job consumer task failed: {}", e);
    }
    info!("Relay stopped");
}
