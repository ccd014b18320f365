//! Headless browser abstraction.
//!
//! The dynamic source only talks to these traits. [`chrome::ChromeRenderer`]
//! drives a real Chromium over CDP; tests substitute an in-memory fake.

pub mod chrome;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Outcome of a top-level navigation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NavigationResult {
    /// URL of the document after redirects.
    pub final_url: String,
    /// HTTP status of the main document, 0 if unknown.
    pub status: u16,
    /// URLs passed through before `final_url`.
    pub redirect_chain: Vec<String>,
    pub load_time_ms: u64,
}

/// A browser capable of opening isolated contexts.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Open a fresh context (one tab) for a single URL.
    async fn new_context(&self) -> Result<Box<dyn RenderContext>>;

    /// Human-readable backend name for diagnostics.
    fn name(&self) -> &str;

    /// Stop the browser once no more contexts will be opened.
    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }
}

/// One scoped browsing session.
///
/// Callers must finish with [`RenderContext::close`]; the pool enforces this
/// for contexts it hands out.
#[async_trait]
pub trait RenderContext: Send + Sync {
    /// Navigate and wait for the load event, bounded by `timeout_ms`.
    async fn navigate(&mut self, url: &str, timeout_ms: u64) -> Result<NavigationResult>;

    /// Wait until `selector` matches an element. Returns `false` on timeout.
    async fn wait_for(&self, selector: &str, timeout_ms: u64) -> Result<bool>;

    /// Evaluate a script and return its JSON-serializable result.
    async fn execute_js(&self, script: &str) -> Result<serde_json::Value>;

    /// Number of top-level windows belonging to this context, including
    /// popups the page opened.
    async fn window_count(&self) -> Result<usize>;

    /// Tear the context down, closing any windows it opened.
    async fn close(self: Box<Self>) -> Result<()>;
}
