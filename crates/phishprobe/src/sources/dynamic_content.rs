//! Rendered-DOM features.
//!
//! Loads the page in a pooled browser context, waits for a minimal readiness
//! signal, lets the DOM settle, then runs one probe script. The script
//! computes each raw fact inside its own `try`, so a throwing query only
//! loses its own field; the Rust side turns the facts into flags and treats
//! any missing field as 0.

use super::{FeatureSource, SourceError};
use crate::pipeline::ScanContext;
use crate::pool::RenderPool;
use crate::renderer::{NavigationResult, RenderContext};
use crate::schema::{Feature, FeaturePartial, Source};
use crate::urlparts::{resolve, UrlParts};
use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Social platforms; an anchor host equal to one of these or a subdomain of
/// it counts as a social-media link.
pub const SOCIAL_DOMAINS: &[&str] = &[
    "facebook.com",
    "twitter.com",
    "x.com",
    "instagram.com",
    "linkedin.com",
    "pinterest.com",
    "youtube.com",
    "tiktok.com",
];

/// Collects raw DOM facts. Each field is filled in its own `try`; a field
/// that throws is left out of the result.
const PROBE_SCRIPT: &str = r#"
(function() {
    var out = {};
    try {
        out.viewport = document.querySelectorAll('meta[name="viewport" i]').length > 0;
    } catch (e) {}
    try {
        out.iframes = document.getElementsByTagName('iframe').length;
    } catch (e) {}
    try {
        out.formActions = [];
        var forms = document.getElementsByTagName('form');
        for (var i = 0; i < forms.length; i++) {
            try {
                var action = forms[i].getAttribute('action');
                if (action) out.formActions.push(action);
            } catch (e) {}
        }
    } catch (e) { delete out.formActions; }
    try {
        out.anchors = [];
        var anchors = document.getElementsByTagName('a');
        for (var j = 0; j < anchors.length; j++) {
            try {
                var href = anchors[j].getAttribute('href');
                if (href) out.anchors.push(anchors[j].href || href);
            } catch (e) {}
        }
    } catch (e) { delete out.anchors; }
    try {
        out.submit = document.querySelectorAll('input[type="submit"], button[type="submit"]').length;
    } catch (e) {}
    try {
        out.hidden = document.querySelectorAll('input[type="hidden"]').length;
    } catch (e) {}
    try {
        out.password = document.querySelectorAll('input[type="password"]').length;
    } catch (e) {}
    return out;
})()
"#;

/// Timings for one render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderTimings {
    pub page_load: Duration,
    pub readiness: Duration,
    pub settle: Duration,
    /// Allowance for the probe script and window count.
    pub probe: Duration,
}

impl Default for RenderTimings {
    fn default() -> Self {
        Self {
            page_load: Duration::from_secs(30),
            readiness: Duration::from_secs(10),
            settle: Duration::from_secs(1),
            probe: Duration::from_secs(5),
        }
    }
}

impl RenderTimings {
    /// Longest a render can take before the probe finishes.
    pub fn budget(&self) -> Duration {
        // two readiness waits: title, then viewport
        self.page_load + self.readiness * 2 + self.settle + self.probe
    }
}

/// Flags derived from the rendered page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DynamicReport {
    pub is_responsive: bool,
    pub is_url_redirects: bool,
    pub is_self_redirects: bool,
    pub has_popup: bool,
    pub has_iframe: bool,
    pub is_form_submit_external: bool,
    pub has_social_media_page: bool,
    pub has_submit_button: bool,
    pub has_hidden_fields: bool,
    pub has_password_fields: bool,
    /// Resolved off-site links, sorted and de-duplicated.
    pub external_links: Vec<String>,
}

impl DynamicReport {
    pub fn into_partial(self) -> FeaturePartial {
        let mut partial = FeaturePartial::new(Source::DynamicContent);
        partial
            .set(Feature::IsResponsive, self.is_responsive)
            .set(Feature::IsUrlRedirects, self.is_url_redirects)
            .set(Feature::IsSelfRedirects, self.is_self_redirects)
            .set(Feature::HasPopup, self.has_popup)
            .set(Feature::HasIFrame, self.has_iframe)
            .set(Feature::IsFormSubmitExternal, self.is_form_submit_external)
            .set(Feature::HasSocialMediaPage, self.has_social_media_page)
            .set(Feature::HasSubmitButton, self.has_submit_button)
            .set(Feature::HasHiddenFields, self.has_hidden_fields)
            .set(Feature::HasPasswordFields, self.has_password_fields);
        partial.set_external_links(self.external_links);
        partial
    }
}

/// Path with the empty path read as `/`.
fn canonical_path(parts: &UrlParts) -> &str {
    if parts.path.is_empty() {
        "/"
    } else {
        &parts.path
    }
}

/// URL compared case-insensitively with a leading `www.` dropped and an
/// empty path read as `/`.
fn comparable(parts: &UrlParts) -> String {
    let mut out = format!(
        "{}://{}{}",
        parts.scheme,
        parts.site(),
        canonical_path(parts).to_lowercase()
    );
    if !parts.query.is_empty() {
        out.push('?');
        out.push_str(&parts.query.to_lowercase());
    }
    if !parts.fragment.is_empty() {
        out.push('#');
        out.push_str(&parts.fragment.to_lowercase());
    }
    out
}

fn strings(probe: &serde_json::Value, key: &str) -> Vec<String> {
    probe
        .get(key)
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

fn positive(probe: &serde_json::Value, key: &str) -> bool {
    probe.get(key).and_then(|v| v.as_u64()).unwrap_or(0) > 0
}

fn is_within(host: &str, domain: &str) -> bool {
    host == domain
        || host
            .strip_suffix(domain)
            .is_some_and(|prefix| prefix.ends_with('.'))
}

fn authority_of(url: &str) -> String {
    UrlParts::parse(url).site()
}

/// Turn navigation facts and probe output into flags.
///
/// `window_count` is `None` when the browser could not report it.
pub fn evaluate(
    requested: &str,
    nav: &NavigationResult,
    probe: &serde_json::Value,
    window_count: Option<usize>,
) -> DynamicReport {
    let original = UrlParts::parse(requested);
    let current = UrlParts::parse(&nav.final_url);
    let site = original.site();

    let is_url_redirects = comparable(&original) != comparable(&current);
    let is_self_redirects = site == current.site()
        && canonical_path(&original) != canonical_path(&current);

    let is_form_submit_external = strings(probe, "formActions").iter().any(|action| {
        let absolute = resolve(requested, action).unwrap_or_else(|| action.clone());
        let auth = authority_of(&absolute);
        !auth.is_empty() && auth != site
    });

    let anchors = strings(probe, "anchors");
    let has_social_media_page = anchors.iter().any(|href| {
        let auth = authority_of(href);
        SOCIAL_DOMAINS.iter().any(|social| is_within(&auth, social))
    });

    let mut external: BTreeSet<String> = BTreeSet::new();
    for href in &anchors {
        let href = href.trim();
        let lower = href.to_ascii_lowercase();
        if lower.starts_with("javascript:") || lower.starts_with("mailto:") {
            continue;
        }
        let Some(absolute) = resolve(requested, href) else {
            continue;
        };
        let auth = authority_of(&absolute);
        if !auth.is_empty() && auth != site {
            external.insert(absolute);
        }
    }

    DynamicReport {
        is_responsive: probe
            .get("viewport")
            .and_then(|v| v.as_bool())
            .unwrap_or(false),
        is_url_redirects,
        is_self_redirects,
        has_popup: window_count.is_some_and(|n| n > 1),
        has_iframe: positive(probe, "iframes"),
        is_form_submit_external,
        has_social_media_page,
        has_submit_button: positive(probe, "submit"),
        has_hidden_fields: positive(probe, "hidden"),
        has_password_fields: positive(probe, "password"),
        external_links: external.into_iter().collect(),
    }
}

/// Drive one context through load, readiness, settle and probe.
pub async fn render_and_probe(
    context: &mut dyn RenderContext,
    url: &str,
    timings: RenderTimings,
) -> Result<DynamicReport, SourceError> {
    let nav = context
        .navigate(url, timings.page_load.as_millis() as u64)
        .await
        .map_err(|e| SourceError::Browser(format!("{e:#}")))?;

    let readiness_ms = timings.readiness.as_millis() as u64;
    // absence of either element is normal; only the wait is bounded
    if !context.wait_for("title", readiness_ms).await.unwrap_or(false) {
        debug!("{url}: no <title> within readiness timeout");
    }
    let _ = context
        .wait_for("meta[name='viewport']", readiness_ms)
        .await;
    tokio::time::sleep(timings.settle).await;

    let probe = match context.execute_js(PROBE_SCRIPT).await {
        Ok(value) => value,
        Err(e) => {
            warn!("{url}: DOM probe failed: {e:#}");
            serde_json::Value::Null
        }
    };
    let windows = match context.window_count().await {
        Ok(n) => Some(n),
        Err(e) => {
            warn!("{url}: could not count windows: {e:#}");
            None
        }
    };

    Ok(evaluate(url, &nav, &probe, windows))
}

/// Dynamic content source backed by a render pool.
pub struct DynamicContentSource {
    pool: Arc<RenderPool>,
    timings: RenderTimings,
}

impl DynamicContentSource {
    pub fn new(pool: Arc<RenderPool>, timings: RenderTimings) -> Self {
        Self { pool, timings }
    }
}

/// Slack left after the render budget for closing the context.
const CLOSE_SLACK: Duration = Duration::from_secs(3);

#[async_trait]
impl FeatureSource for DynamicContentSource {
    fn source(&self) -> Source {
        Source::DynamicContent
    }

    fn timeout(&self) -> Duration {
        self.timings.budget() + CLOSE_SLACK
    }

    async fn collect(&self, ctx: &ScanContext) -> Result<FeaturePartial, SourceError> {
        debug!(
            "{} free render slot(s) for {}",
            self.pool.available(),
            ctx.url
        );
        let mut handle = self
            .pool
            .acquire()
            .await
            .map_err(|e| SourceError::Browser(format!("{e:#}")))?;

        // finish early enough that the context can still be closed
        let budget = self
            .timings
            .budget()
            .min(ctx.remaining().saturating_sub(CLOSE_SLACK));
        let result = tokio::time::timeout(
            budget,
            render_and_probe(handle.context_mut(), &ctx.url, self.timings),
        )
        .await
        .unwrap_or_else(|_| {
            Err(SourceError::TimedOut(format!(
                "render of {} exceeded {} ms",
                ctx.url,
                budget.as_millis()
            )))
        });

        if let Err(e) = handle.close().await {
            warn!("closing browser context for {}: {e:#}", ctx.url);
        }

        result.map(DynamicReport::into_partial)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::Renderer;
    use crate::schema::FeatureValue;
    use anyhow::Result;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn nav(final_url: &str) -> NavigationResult {
        NavigationResult {
            final_url: final_url.to_string(),
            status: 200,
            ..Default::default()
        }
    }

    #[test]
    fn test_evaluate_full_probe() {
        let probe = json!({
            "viewport": true,
            "iframes": 2,
            "formActions": ["https://collect.evil.example/post"],
            "anchors": [
                "https://www.facebook.com/brand",
                "https://example.com/about",
                "https://other.example/page",
                "https://other.example/page",
                "javascript:void(0)",
                "mailto:help@example.com"
            ],
            "submit": 1,
            "hidden": 0,
            "password": 1
        });
        let report = evaluate(
            "https://example.com/login",
            &nav("https://example.com/login"),
            &probe,
            Some(1),
        );
        assert!(report.is_responsive);
        assert!(!report.is_url_redirects);
        assert!(!report.is_self_redirects);
        assert!(!report.has_popup);
        assert!(report.has_iframe);
        assert!(report.is_form_submit_external);
        assert!(report.has_social_media_page);
        assert!(report.has_submit_button);
        assert!(!report.has_hidden_fields);
        assert!(report.has_password_fields);
        assert_eq!(
            report.external_links,
            vec![
                "https://other.example/page".to_string(),
                "https://www.facebook.com/brand".to_string(),
            ]
        );
    }

    #[test]
    fn test_missing_probe_fields_default_to_zero() {
        let report = evaluate(
            "https://example.com/",
            &nav("https://example.com/"),
            &json!({"iframes": 1}),
            None,
        );
        assert!(report.has_iframe);
        assert!(!report.is_responsive);
        assert!(!report.has_popup);
        assert!(!report.has_password_fields);
        assert!(report.external_links.is_empty());

        let empty = evaluate(
            "https://example.com/",
            &nav("https://example.com/"),
            &serde_json::Value::Null,
            Some(1),
        );
        assert_eq!(empty.clone().into_partial().len(), 10);
        assert!(!empty.has_iframe);
    }

    #[test]
    fn test_redirect_flags() {
        let same = evaluate("http://Example.com", &nav("http://www.example.com/"), &json!({}), None);
        assert!(!same.is_url_redirects);
        assert!(!same.is_self_redirects);

        let self_redirect = evaluate(
            "https://example.com/a",
            &nav("https://www.example.com/b"),
            &json!({}),
            None,
        );
        assert!(self_redirect.is_url_redirects);
        assert!(self_redirect.is_self_redirects);

        let offsite = evaluate(
            "https://example.com/a",
            &nav("https://landing.example.net/a"),
            &json!({}),
            None,
        );
        assert!(offsite.is_url_redirects);
        assert!(!offsite.is_self_redirects);
    }

    #[test]
    fn test_social_match_is_by_domain() {
        assert!(is_within("m.facebook.com", "facebook.com"));
        assert!(is_within("x.com", "x.com"));
        assert!(!is_within("box.com", "x.com"));
    }

    #[test]
    fn test_relative_form_action_is_not_external() {
        let report = evaluate(
            "https://example.com/login",
            &nav("https://example.com/login"),
            &json!({"formActions": ["/session", "https://www.example.com/x"]}),
            Some(2),
        );
        assert!(!report.is_form_submit_external);
        assert!(report.has_popup);
    }

    #[derive(Clone, Copy)]
    enum Behaviour {
        Normal,
        FailNavigate,
        Hang,
    }

    struct FakeRenderer {
        behaviour: Behaviour,
        closed: Arc<AtomicUsize>,
    }

    struct FakeContext {
        behaviour: Behaviour,
        closed: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Renderer for FakeRenderer {
        async fn new_context(&self) -> Result<Box<dyn RenderContext>> {
            Ok(Box::new(FakeContext {
                behaviour: self.behaviour,
                closed: Arc::clone(&self.closed),
            }))
        }

        fn name(&self) -> &str {
            "fake"
        }
    }

    #[async_trait]
    impl RenderContext for FakeContext {
        async fn navigate(&mut self, url: &str, _timeout_ms: u64) -> Result<NavigationResult> {
            match self.behaviour {
                Behaviour::Normal => Ok(nav(url)),
                Behaviour::FailNavigate => anyhow::bail!("net::ERR_NAME_NOT_RESOLVED"),
                Behaviour::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok(nav(url))
                }
            }
        }

        async fn wait_for(&self, selector: &str, _timeout_ms: u64) -> Result<bool> {
            Ok(selector == "title")
        }

        async fn execute_js(&self, _script: &str) -> Result<serde_json::Value> {
            Ok(json!({"viewport": true, "password": 2}))
        }

        async fn window_count(&self) -> Result<usize> {
            anyhow::bail!("target listing unsupported")
        }

        async fn close(self: Box<Self>) -> Result<()> {
            self.closed.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn source(behaviour: Behaviour) -> (DynamicContentSource, Arc<AtomicUsize>) {
        let closed = Arc::new(AtomicUsize::new(0));
        let renderer = Arc::new(FakeRenderer {
            behaviour,
            closed: Arc::clone(&closed),
        });
        let timings = RenderTimings {
            page_load: Duration::from_millis(100),
            readiness: Duration::from_millis(10),
            settle: Duration::from_millis(1),
            probe: Duration::from_millis(50),
        };
        let pool = Arc::new(RenderPool::new(renderer, 1));
        (DynamicContentSource::new(pool, timings), closed)
    }

    #[tokio::test]
    async fn test_collect_closes_context_on_success() {
        let (source, closed) = source(Behaviour::Normal);
        let ctx = ScanContext::new("https://example.com/", Duration::from_secs(60));
        let partial = source.collect(&ctx).await.unwrap();
        assert_eq!(partial.get(Feature::IsResponsive), Some(&FeatureValue::Int(1)));
        assert_eq!(partial.get(Feature::HasPasswordFields), Some(&FeatureValue::Int(1)));
        // window count failure degrades only the popup flag
        assert_eq!(partial.get(Feature::HasPopup), Some(&FeatureValue::Int(0)));
        assert_eq!(closed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_collect_closes_context_on_error() {
        let (source, closed) = source(Behaviour::FailNavigate);
        let ctx = ScanContext::new("https://nowhere.invalid/", Duration::from_secs(60));
        let err = source.collect(&ctx).await.unwrap_err();
        assert!(matches!(err, SourceError::Browser(_)));
        assert_eq!(closed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_collect_closes_context_on_timeout() {
        let (source, closed) = source(Behaviour::Hang);
        let ctx = ScanContext::new("https://slow.example/", Duration::from_secs(60));
        let err = source.collect(&ctx).await.unwrap_err();
        assert!(matches!(err, SourceError::TimedOut(_)));
        assert_eq!(closed.load(Ordering::SeqCst), 1);
    }
}
