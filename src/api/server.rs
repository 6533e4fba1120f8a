use crate::api::routes::{self, AppState};
use crate::errors::Result;
use std::future::Future;
use tracing::info;

/// Starts and runs the HTTP server until `shutdown` resolves
///
/// # Arguments
/// * `host` - Interface to bind
/// * `port` - Port number to listen on
/// * `state` - Handles shared with the request handlers
/// * `shutdown` - Completes when the server should stop accepting connections
pub async fn launch_server(
    host: &str,
    port: u16,
    state: AppState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let app = routes::app(state);

    let listener = tokio::net::TcpListener::bind((host, port)).await?;
    info!("API server listening on {}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}
