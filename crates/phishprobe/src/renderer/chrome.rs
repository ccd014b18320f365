//! Chromium renderer over the DevTools protocol (chromiumoxide).

use super::{NavigationResult, RenderContext, Renderer};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::target::{CloseTargetParams, GetTargetsParams, TargetId};
use chromiumoxide::Page;
use futures::StreamExt;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Poll interval while waiting for an element.
const WAIT_POLL: Duration = Duration::from_millis(100);

/// Launch options for the headless browser.
#[derive(Debug, Clone, Default)]
pub struct ChromeOptions {
    /// Explicit browser binary; otherwise chromiumoxide searches the usual
    /// install locations.
    pub executable: Option<PathBuf>,
    /// User agent override.
    pub user_agent: Option<String>,
}

/// A launched headless Chromium.
pub struct ChromeRenderer {
    browser: Mutex<Browser>,
    handler: JoinHandle<()>,
}

impl ChromeRenderer {
    pub async fn launch(options: &ChromeOptions) -> Result<Self> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .window_size(1920, 1080)
            .arg("--disable-dev-shm-usage")
            .arg("--disable-gpu")
            .arg("--disable-extensions")
            .arg("--disable-blink-features=AutomationControlled");
        if let Some(path) = &options.executable {
            builder = builder.chrome_executable(path);
        }
        if let Some(ua) = &options.user_agent {
            builder = builder.arg(format!("--user-agent={ua}"));
        }
        let config = builder
            .build()
            .map_err(|e| anyhow!("invalid browser config: {e}"))?;

        let (browser, mut events) = Browser::launch(config)
            .await
            .context("launching headless Chromium")?;
        let handler = tokio::spawn(async move {
            while let Some(event) = events.next().await {
                if event.is_err() {
                    break;
                }
            }
        });
        info!("headless Chromium launched");

        Ok(Self {
            browser: Mutex::new(browser),
            handler,
        })
    }
}

#[async_trait]
impl Renderer for ChromeRenderer {
    async fn new_context(&self) -> Result<Box<dyn RenderContext>> {
        let page = self
            .browser
            .lock()
            .await
            .new_page("about:blank")
            .await
            .context("opening tab")?;
        Ok(Box::new(ChromeContext { page }))
    }

    fn name(&self) -> &str {
        "chromium"
    }

    async fn shutdown(&self) -> Result<()> {
        let mut browser = self.browser.lock().await;
        browser.close().await.context("closing browser")?;
        browser.wait().await.context("waiting for browser exit")?;
        self.handler.abort();
        info!("headless Chromium closed");
        Ok(())
    }
}

/// One tab plus any popups it spawns.
pub struct ChromeContext {
    page: Page,
}

impl ChromeContext {
    /// Targets of type `page` opened by this tab.
    async fn popup_targets(&self) -> Result<Vec<TargetId>> {
        let own = self.page.target_id().clone();
        let resp = self
            .page
            .execute(GetTargetsParams::default())
            .await
            .context("listing targets")?;
        Ok(resp
            .result
            .target_infos
            .iter()
            .filter(|t| t.r#type == "page" && t.opener_id.as_ref() == Some(&own))
            .map(|t| t.target_id.clone())
            .collect())
    }
}

#[async_trait]
impl RenderContext for ChromeContext {
    async fn navigate(&mut self, url: &str, timeout_ms: u64) -> Result<NavigationResult> {
        let start = Instant::now();
        tokio::time::timeout(Duration::from_millis(timeout_ms), self.page.goto(url))
            .await
            .map_err(|_| anyhow!("page load of {url} exceeded {timeout_ms} ms"))?
            .with_context(|| format!("navigating to {url}"))?;
        let load_time_ms = start.elapsed().as_millis() as u64;

        let final_url = self
            .page
            .url()
            .await
            .context("reading final URL")?
            .unwrap_or_else(|| url.to_string());

        let status = self
            .execute_js(
                "(() => { try { const n = performance.getEntriesByType('navigation')[0]; \
                 return n ? n.responseStatus || 0 : 0; } catch (e) { return 0; } })()",
            )
            .await
            .ok()
            .and_then(|v| v.as_u64())
            .and_then(|s| u16::try_from(s).ok())
            .unwrap_or(0);

        let redirect_chain = if final_url != url {
            vec![url.to_string()]
        } else {
            Vec::new()
        };

        debug!("navigated to {final_url} in {load_time_ms} ms");
        Ok(NavigationResult {
            final_url,
            status,
            redirect_chain,
            load_time_ms,
        })
    }

    async fn wait_for(&self, selector: &str, timeout_ms: u64) -> Result<bool> {
        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        loop {
            if self.page.find_element(selector).await.is_ok() {
                return Ok(true);
            }
            if Instant::now() >= deadline {
                return Ok(false);
            }
            tokio::time::sleep(WAIT_POLL).await;
        }
    }

    async fn execute_js(&self, script: &str) -> Result<serde_json::Value> {
        let result = self
            .page
            .evaluate(script)
            .await
            .context("evaluating script")?;
        Ok(result.value().cloned().unwrap_or(serde_json::Value::Null))
    }

    async fn window_count(&self) -> Result<usize> {
        Ok(1 + self.popup_targets().await?.len())
    }

    async fn close(self: Box<Self>) -> Result<()> {
        match self.popup_targets().await {
            Ok(popups) => {
                for target in popups {
                    if let Err(e) = self.page.execute(CloseTargetParams::new(target)).await {
                        warn!("failed to close popup: {e}");
                    }
                }
            }
            Err(e) => warn!("could not list popups before close: {e:#}"),
        }
        self.page.close().await.context("closing tab")?;
        Ok(())
    }
}
