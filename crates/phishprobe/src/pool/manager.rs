//! Render pool: caps how many browser contexts exist at once.
//!
//! A context handed out by [`RenderPool::acquire`] holds a semaphore permit
//! until it is closed. Dropping a handle without closing it (a cancelled
//! scan) still closes the context on a background task.

use crate::renderer::{RenderContext, Renderer};
use anyhow::Result;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::warn;

/// A context borrowed from the pool.
pub struct ContextHandle {
    context: Option<Box<dyn RenderContext>>,
    _permit: OwnedSemaphorePermit,
    active_count: Arc<AtomicUsize>,
}

impl ContextHandle {
    pub fn context_mut(&mut self) -> &mut dyn RenderContext {
        match self.context.as_deref_mut() {
            Some(ctx) => ctx,
            None => unreachable!("context is present until the handle is closed"),
        }
    }

    /// Close the context and release its slot.
    pub async fn close(mut self) -> Result<()> {
        match self.context.take() {
            Some(ctx) => ctx.close().await,
            None => Ok(()),
        }
    }
}

impl Drop for ContextHandle {
    fn drop(&mut self) {
        if let Some(ctx) = self.context.take() {
            match tokio::runtime::Handle::try_current() {
                Ok(rt) => {
                    rt.spawn(async move {
                        if let Err(e) = ctx.close().await {
                            warn!("closing abandoned browser context: {e:#}");
                        }
                    });
                }
                Err(_) => warn!("browser context dropped outside a runtime; not closed"),
            }
        }
        self.active_count.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Hands out at most `max_contexts` live contexts.
pub struct RenderPool {
    renderer: Arc<dyn Renderer>,
    semaphore: Arc<Semaphore>,
    max_contexts: usize,
    active_count: Arc<AtomicUsize>,
}

impl RenderPool {
    pub fn new(renderer: Arc<dyn Renderer>, max_contexts: usize) -> Self {
        let max_contexts = max_contexts.max(1);
        Self {
            renderer,
            semaphore: Arc::new(Semaphore::new(max_contexts)),
            max_contexts,
            active_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Wait for a free slot, then open a context.
    pub async fn acquire(&self) -> Result<ContextHandle> {
        let permit = Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .map_err(|e| anyhow::anyhow!("render pool closed: {e}"))?;

        let context = self.renderer.new_context().await?;
        self.active_count.fetch_add(1, Ordering::SeqCst);

        Ok(ContextHandle {
            context: Some(context),
            _permit: permit,
            active_count: Arc::clone(&self.active_count),
        })
    }

    /// Contexts currently open.
    pub fn active(&self) -> usize {
        self.active_count.load(Ordering::SeqCst)
    }

    pub fn max_contexts(&self) -> usize {
        self.max_contexts
    }

    /// Slots free right now.
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    pub fn renderer_name(&self) -> &str {
        self.renderer.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::NavigationResult;
    use async_trait::async_trait;
    use std::time::Duration;

    struct CountingRenderer {
        closed: Arc<AtomicUsize>,
    }

    struct CountingContext {
        closed: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Renderer for CountingRenderer {
        async fn new_context(&self) -> Result<Box<dyn RenderContext>> {
            Ok(Box::new(CountingContext {
                closed: Arc::clone(&self.closed),
            }))
        }

        fn name(&self) -> &str {
            "counting"
        }
    }

    #[async_trait]
    impl RenderContext for CountingContext {
        async fn navigate(&mut self, url: &str, _timeout_ms: u64) -> Result<NavigationResult> {
            Ok(NavigationResult {
                final_url: url.to_string(),
                ..Default::default()
            })
        }

        async fn wait_for(&self, _selector: &str, _timeout_ms: u64) -> Result<bool> {
            Ok(true)
        }

        async fn execute_js(&self, _script: &str) -> Result<serde_json::Value> {
            Ok(serde_json::Value::Null)
        }

        async fn window_count(&self) -> Result<usize> {
            Ok(1)
        }

        async fn close(self: Box<Self>) -> Result<()> {
            self.closed.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn pool(max: usize) -> (RenderPool, Arc<AtomicUsize>) {
        let closed = Arc::new(AtomicUsize::new(0));
        let renderer = Arc::new(CountingRenderer {
            closed: Arc::clone(&closed),
        });
        (RenderPool::new(renderer, max), closed)
    }

    #[tokio::test]
    async fn test_acquire_and_close() {
        let (pool, closed) = pool(2);
        let handle = pool.acquire().await.unwrap();
        assert_eq!(pool.active(), 1);
        assert_eq!(pool.available(), 1);

        handle.close().await.unwrap();
        assert_eq!(pool.active(), 0);
        assert_eq!(pool.available(), 2);
        assert_eq!(closed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_limit_blocks_until_release() {
        let (pool, _) = pool(1);
        let first = pool.acquire().await.unwrap();
        let blocked = tokio::time::timeout(Duration::from_millis(50), pool.acquire()).await;
        assert!(blocked.is_err());

        first.close().await.unwrap();
        let second = tokio::time::timeout(Duration::from_millis(500), pool.acquire()).await;
        assert!(second.is_ok());
    }

    #[tokio::test]
    async fn test_dropped_handle_is_closed_in_background() {
        let (pool, closed) = pool(1);
        let handle = pool.acquire().await.unwrap();
        drop(handle);
        assert_eq!(pool.active(), 0);

        for _ in 0..50 {
            if closed.load(Ordering::SeqCst) == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(closed.load(Ordering::SeqCst), 1);
    }
}
