//! Core module containing the job relay
//!
//! This module contains:
//! - The job model and envelope parsing
//! - The batch consumer and its intake queue
//! - The prompt comparison orchestrator
//! - The failure classifier applied before anything reaches a client

mod classifier;
mod compare;
mod consumer;
mod invocation;
mod job;
mod queue;

pub use classifier::*;
pub use compare::*;
pub use consumer::*;
pub use job::*;
pub use queue::*;
