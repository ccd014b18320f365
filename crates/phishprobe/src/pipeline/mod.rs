//! Scan orchestration.
//!
//! [`Pipeline::scan`] fans a URL out to every configured [`FeatureSource`]
//! concurrently, bounds each by its own timeout and by the per-URL deadline,
//! merges the partials, applies failure fallbacks and defaults, and returns
//! a complete record with per-source diagnostics.

pub mod merge;

pub use merge::Merger;

use crate::acquisition::http_client::DEFAULT_USER_AGENT;
use crate::acquisition::HttpClient;
use crate::config::ProbeConfig;
use crate::derivation;
use crate::error::{ProbeError, Result};
use crate::pool::RenderPool;
use crate::renderer::chrome::{ChromeOptions, ChromeRenderer};
use crate::renderer::Renderer;
use crate::schema::{validate, Feature, FeatureRecord, Source, Validation};
use crate::sources::{
    DomainParts, DomainSource, DynamicContentSource, FeatureSource, GeolocationSource,
    SocialSource, SourceError, SourceOutcome, StaticContentSource, TlsSource, UrlStructureSource,
};
use crate::urlparts::UrlParts;
use futures::future::join_all;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Everything sources know about the URL being scanned.
#[derive(Debug, Clone)]
pub struct ScanContext {
    /// The input URL, unmodified.
    pub url: String,
    pub parts: UrlParts,
    pub domain: DomainParts,
    deadline: Instant,
}

impl ScanContext {
    /// Split `url` once and start its deadline clock.
    pub fn new(url: &str, deadline: Duration) -> Self {
        let parts = UrlParts::parse(url);
        let domain = DomainParts::from_url(&parts);
        Self {
            url: url.to_string(),
            parts,
            domain,
            deadline: Instant::now() + deadline,
        }
    }

    /// Time left before the per-URL deadline.
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }
}

/// How a source fared in one scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceStatus {
    Ok,
    Failed,
    Disabled,
}

/// Diagnostics line for one source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceReport {
    pub source: &'static str,
    pub status: SourceStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub elapsed_ms: u64,
}

/// Per-scan diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostics {
    pub sources: Vec<SourceReport>,
    /// Keys produced by sources, extras included.
    pub total_features: usize,
    pub validation: Validation,
    pub elapsed_ms: u64,
}

impl Diagnostics {
    pub fn failed(&self) -> impl Iterator<Item = &SourceReport> {
        self.sources
            .iter()
            .filter(|r| r.status == SourceStatus::Failed)
    }
}

/// Output of one scan.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub url: String,
    pub record: FeatureRecord,
    pub diagnostics: Diagnostics,
    /// Off-site links seen while rendering; not part of the record.
    pub external_links: Vec<String>,
}

/// The feature extraction pipeline.
pub struct Pipeline {
    sources: Vec<Arc<dyn FeatureSource>>,
    disabled: Vec<(Source, String)>,
    deadline: Duration,
    renderer: Option<Arc<dyn Renderer>>,
}

impl Pipeline {
    /// A pipeline with only the pure URL sources.
    ///
    /// Network sources are added with [`Pipeline::with_source`].
    pub fn new(deadline: Duration) -> Self {
        Self {
            sources: vec![Arc::new(UrlStructureSource)],
            disabled: Vec::new(),
            deadline,
            renderer: None,
        }
    }

    /// Build the full pipeline described by `config`.
    ///
    /// Launches Chromium when dynamic rendering is enabled. A browser that
    /// fails to start disables the dynamic source instead of failing.
    pub async fn from_config(config: &ProbeConfig) -> Result<Self> {
        config.validate()?;
        let t = &config.timeouts;
        let ua = config.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT);
        let client = HttpClient::new(ua).map_err(|e| ProbeError::Config(format!("{e:#}")))?;

        let mut domain = DomainSource::new(t.whois(), t.dns());
        if config.passive_dns {
            domain = domain.with_passive_dns(client.clone(), config.doh_endpoint.clone());
        }

        let mut pipeline = Self::new(t.deadline())
            .with_source(Arc::new(domain))
            .with_source(Arc::new(StaticContentSource::new(client.clone(), t.http())));

        pipeline = match TlsSource::new(t.tls()) {
            Ok(tls) => pipeline.with_source(Arc::new(tls)),
            Err(e) => {
                warn!("TLS source unavailable: {e}");
                pipeline.with_disabled(Source::Tls, e.to_string())
            }
        };

        if config.social {
            pipeline = pipeline.with_source(Arc::new(SocialSource::new(client.clone(), t.http())));
        }

        if config.geolocation {
            let mut geo = GeolocationSource::new(client, t.dns(), t.http())
                .with_token(config.geolocation_token.clone());
            if let Some(endpoint) = &config.geolocation_endpoint {
                geo = geo.with_endpoint(endpoint.as_str());
            }
            pipeline = pipeline.with_source(Arc::new(geo));
        }

        if config.dynamic {
            let options = ChromeOptions {
                executable: config.chromium_path.clone(),
                user_agent: config.user_agent.clone(),
            };
            pipeline = match ChromeRenderer::launch(&options).await {
                Ok(renderer) => {
                    let renderer: Arc<dyn Renderer> = Arc::new(renderer);
                    let pool = Arc::new(RenderPool::new(Arc::clone(&renderer), config.concurrency));
                    info!(
                        "render pool: {} with {} context(s)",
                        pool.renderer_name(),
                        pool.max_contexts()
                    );
                    pipeline
                        .with_renderer(renderer)
                        .with_source(Arc::new(DynamicContentSource::new(pool, t.render())))
                }
                Err(e) => {
                    warn!("dynamic content disabled: {e:#}");
                    pipeline.with_disabled(Source::DynamicContent, format!("{e:#}"))
                }
            };
        } else {
            pipeline = pipeline.with_disabled(Source::DynamicContent, "disabled by configuration");
        }

        info!(
            "pipeline ready with {} source(s), {} disabled",
            pipeline.sources.len(),
            pipeline.disabled.len()
        );
        Ok(pipeline)
    }

    /// Add a source. Third-party feeds plug in here.
    pub fn with_source(mut self, source: Arc<dyn FeatureSource>) -> Self {
        self.sources.push(source);
        self
    }

    /// Record a source that will not run, with the reason shown in
    /// diagnostics.
    pub fn with_disabled(mut self, source: Source, reason: impl Into<String>) -> Self {
        self.disabled.push((source, reason.into()));
        self
    }

    /// Keep the browser behind the dynamic source so [`Pipeline::shutdown`]
    /// can stop it.
    pub fn with_renderer(mut self, renderer: Arc<dyn Renderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    /// Drop every source and stop the browser, if one was launched.
    pub async fn shutdown(self) -> anyhow::Result<()> {
        let Self {
            sources, renderer, ..
        } = self;
        drop(sources);
        match renderer {
            Some(renderer) => renderer.shutdown().await,
            None => Ok(()),
        }
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Tags of the sources that run on every scan.
    pub fn sources(&self) -> Vec<Source> {
        self.sources.iter().map(|s| s.source()).collect()
    }

    /// Scan one URL.
    ///
    /// Source failures never surface here; they degrade to defaults and
    /// show up in the diagnostics. An error means a source broke the schema.
    pub async fn scan(&self, url: &str) -> Result<ScanReport> {
        let started = Instant::now();
        let ctx = ScanContext::new(url, self.deadline);
        debug!("scanning {url} (domain {:?})", ctx.domain.registrable);

        let runs = join_all(self.sources.iter().map(|s| run_source(s.as_ref(), &ctx))).await;

        let mut merger = Merger::new();
        let mut reports = Vec::with_capacity(runs.len() + self.disabled.len() + 1);

        let derive_start = Instant::now();
        merger.absorb(Source::Derived, derivation::derive(url).into_partial())?;
        reports.push(SourceReport {
            source: Source::Derived.name(),
            status: SourceStatus::Ok,
            reason: None,
            elapsed_ms: elapsed_ms(derive_start),
        });

        for run in runs {
            let (status, reason) = match run.outcome {
                SourceOutcome::Success(partial) => {
                    merger.absorb(run.source, partial)?;
                    (SourceStatus::Ok, None)
                }
                SourceOutcome::Failure(e) => {
                    warn!("{} failed for {url}: {e}", run.source);
                    apply_fallback(&mut merger, run.source, &ctx)?;
                    (SourceStatus::Failed, Some(e.to_string()))
                }
            };
            reports.push(SourceReport {
                source: run.source.name(),
                status,
                reason,
                elapsed_ms: run.elapsed_ms,
            });
        }

        for (source, reason) in &self.disabled {
            if *source == Source::Tls {
                apply_fallback(&mut merger, *source, &ctx)?;
            }
            reports.push(SourceReport {
                source: source.name(),
                status: SourceStatus::Disabled,
                reason: Some(reason.clone()),
                elapsed_ms: 0,
            });
        }

        let (record, external_links) = merger.finish()?;
        let validation = validate(&record, Feature::required());
        if !validation.is_valid {
            debug!(
                "{url}: {} required feature(s) defaulted",
                validation.missing.len()
            );
        }

        let diagnostics = Diagnostics {
            sources: reports,
            total_features: validation.total,
            validation,
            elapsed_ms: elapsed_ms(started),
        };
        info!(
            "scanned {url} in {} ms ({} features produced)",
            diagnostics.elapsed_ms, diagnostics.total_features
        );

        Ok(ScanReport {
            url: url.to_string(),
            record,
            diagnostics,
            external_links,
        })
    }

    /// Scan many URLs, at most `limit` at a time. Results keep input order.
    ///
    /// Each URL gets its own deadline, so a slow URL never shortens another.
    pub async fn scan_many(&self, urls: &[String], limit: usize) -> Vec<Result<ScanReport>> {
        let mut results: Vec<(usize, Result<ScanReport>)> = stream::iter(urls.iter().enumerate())
            .map(|(i, url)| async move { (i, self.scan(url).await) })
            .buffer_unordered(limit.max(1))
            .collect()
            .await;
        results.sort_by_key(|(i, _)| *i);
        results.into_iter().map(|(_, r)| r).collect()
    }
}

struct SourceRun {
    source: Source,
    outcome: SourceOutcome,
    elapsed_ms: u64,
}

async fn run_source(source: &dyn FeatureSource, ctx: &ScanContext) -> SourceRun {
    let tag = source.source();
    let started = Instant::now();
    let limit = source.timeout().min(ctx.remaining());

    let outcome = match tokio::time::timeout(limit, source.collect(ctx)).await {
        Ok(result) => SourceOutcome::from(result),
        Err(_) => SourceOutcome::Failure(SourceError::TimedOut(format!(
            "{tag} after {} ms",
            limit.as_millis()
        ))),
    };

    SourceRun {
        source: tag,
        outcome,
        elapsed_ms: elapsed_ms(started),
    }
}

/// Stand-in values for a failed source.
fn apply_fallback(merger: &mut Merger, source: Source, ctx: &ScanContext) -> Result<()> {
    match source {
        // computed locally, so these count as produced
        Source::Domain => merger.absorb(Source::Domain, ctx.domain.structural_partial())?,
        Source::Tls => merger.fill(Feature::HasSsl, false),
        Source::StaticContent => merger.fill(Feature::IsUnreachable, true),
        _ => {}
    }
    Ok(())
}

fn elapsed_ms(since: Instant) -> u64 {
    since.elapsed().as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::RenderContext;
    use crate::schema::{FeaturePartial, FeatureValue};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Failing(Source);

    #[async_trait]
    impl FeatureSource for Failing {
        fn source(&self) -> Source {
            self.0
        }

        fn timeout(&self) -> Duration {
            Duration::from_secs(1)
        }

        async fn collect(&self, _ctx: &ScanContext) -> std::result::Result<FeaturePartial, SourceError> {
            Err(SourceError::Unreachable("test".into()))
        }
    }

    struct Sleepy;

    #[async_trait]
    impl FeatureSource for Sleepy {
        fn source(&self) -> Source {
            Source::External("sleepy")
        }

        fn timeout(&self) -> Duration {
            Duration::from_secs(30)
        }

        async fn collect(&self, _ctx: &ScanContext) -> std::result::Result<FeaturePartial, SourceError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(FeaturePartial::new(self.source()))
        }
    }

    struct Rogue;

    #[async_trait]
    impl FeatureSource for Rogue {
        fn source(&self) -> Source {
            Source::StaticContent
        }

        fn timeout(&self) -> Duration {
            Duration::from_secs(1)
        }

        async fn collect(&self, _ctx: &ScanContext) -> std::result::Result<FeaturePartial, SourceError> {
            let mut partial = FeaturePartial::new(Source::StaticContent);
            partial.set(Feature::HasSsl, true);
            Ok(partial)
        }
    }

    struct StoppableRenderer(Arc<AtomicUsize>);

    #[async_trait]
    impl Renderer for StoppableRenderer {
        async fn new_context(&self) -> anyhow::Result<Box<dyn RenderContext>> {
            anyhow::bail!("no contexts")
        }

        fn name(&self) -> &str {
            "stoppable"
        }

        async fn shutdown(&self) -> anyhow::Result<()> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn test_context_splits_once() {
        let ctx = ScanContext::new("https://login.example.co.uk/a?b=1", Duration::from_secs(5));
        assert_eq!(ctx.parts.query, "b=1");
        assert_eq!(ctx.domain.registrable, "example.co.uk");
        assert!(ctx.remaining() <= Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_pure_pipeline_record_is_complete() {
        let report = Pipeline::new(Duration::from_secs(5))
            .scan("https://example.com/path?x=1#top")
            .await
            .unwrap();
        assert_eq!(report.record.iter().count(), crate::schema::CATALOG.len());
        assert_eq!(report.record.get(Feature::HavingQuery), &FeatureValue::Int(1));
        assert!(report.record.was_produced(Feature::ShannonEntropy));
        assert!(!report.diagnostics.validation.is_valid);
    }

    #[tokio::test]
    async fn test_fallbacks_for_failed_sources() {
        let report = Pipeline::new(Duration::from_secs(5))
            .with_source(Arc::new(Failing(Source::Domain)))
            .with_source(Arc::new(Failing(Source::Tls)))
            .with_source(Arc::new(Failing(Source::StaticContent)))
            .scan("https://www.example.com/")
            .await
            .unwrap();

        let record = &report.record;
        assert_eq!(record.get(Feature::Tld), &FeatureValue::Text("com".into()));
        assert!(record.was_produced(Feature::DomainLengthOfUrl));
        assert_eq!(record.get(Feature::HasSsl), &FeatureValue::Int(0));
        assert_eq!(record.get(Feature::IsUnreachable), &FeatureValue::Int(1));
        assert_eq!(report.diagnostics.failed().count(), 3);
        assert!(report
            .diagnostics
            .validation
            .missing
            .contains(&"HasSSL"));
    }

    #[tokio::test]
    async fn test_deadline_bounds_slow_source() {
        let started = std::time::Instant::now();
        let report = Pipeline::new(Duration::from_millis(100))
            .with_source(Arc::new(Sleepy))
            .scan("https://example.com/")
            .await
            .unwrap();
        assert!(started.elapsed() < Duration::from_secs(5));
        let sleepy = report
            .diagnostics
            .sources
            .iter()
            .find(|r| r.source == "sleepy")
            .unwrap();
        assert_eq!(sleepy.status, SourceStatus::Failed);
        assert!(sleepy.reason.as_deref().unwrap().starts_with("timed out"));
    }

    #[tokio::test]
    async fn test_foreign_key_aborts_scan() {
        let result = Pipeline::new(Duration::from_secs(5))
            .with_source(Arc::new(Rogue))
            .scan("https://example.com/")
            .await;
        assert!(matches!(result, Err(ProbeError::SchemaViolation { .. })));
    }

    #[tokio::test]
    async fn test_disabled_source_in_diagnostics() {
        let report = Pipeline::new(Duration::from_secs(5))
            .with_disabled(Source::DynamicContent, "off")
            .scan("https://example.com/")
            .await
            .unwrap();
        let entry = report.diagnostics.sources.last().unwrap();
        assert_eq!(entry.source, "dynamic_content");
        assert_eq!(entry.status, SourceStatus::Disabled);
    }

    #[tokio::test]
    async fn test_scan_many_keeps_order() {
        let pipeline = Pipeline::new(Duration::from_secs(5));
        let urls: Vec<String> = (0..6).map(|i| format!("https://site{i}.com/")).collect();
        let reports = pipeline.scan_many(&urls, 3).await;
        let got: Vec<_> = reports.iter().map(|r| r.as_ref().unwrap().url.clone()).collect();
        assert_eq!(got, urls);
    }

    #[tokio::test]
    async fn test_shutdown_stops_renderer() {
        let stopped = Arc::new(AtomicUsize::new(0));
        let pipeline = Pipeline::new(Duration::from_secs(5))
            .with_renderer(Arc::new(StoppableRenderer(Arc::clone(&stopped))));
        pipeline.scan("https://example.com/").await.unwrap();
        pipeline.shutdown().await.unwrap();
        assert_eq!(stopped.load(Ordering::SeqCst), 1);

        assert!(Pipeline::new(Duration::from_secs(5)).shutdown().await.is_ok());
    }
}
