//! Knowledge-retrieval dispatch
//!
//! This module contains:
//! - The search result and workspace data model
//! - The engine trait and the immutable engine registry
//! - The single-query dispatcher and the multi-prompt comparison built on it
//! - The HTTP engine client and the in-memory workspace store used by the binary

mod compare;
mod dispatcher;
mod engine;
mod http_engine;
mod types;
mod workspaces;

pub use compare::*;
pub use dispatcher::*;
pub use engine::*;
pub use http_engine::*;
pub use types::*;
pub use workspaces::*;
