/// API error types and handling
pub mod errors;
/// HTTP handlers for job intake and search
pub mod handlers;
/// Routes configuration and shared state
pub mod routes;
/// HTTP server implementation
pub mod server;
/// Client WebSocket connections
pub mod ws;
