//! Bounded pool of browser contexts.

pub mod manager;

pub use manager::{ContextHandle, RenderPool};
