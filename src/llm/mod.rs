mod adapter;
mod message;
pub mod providers;
mod registry;

pub use adapter::*;
pub use message::*;
pub use registry::*;
