//! Social presence check.
//!
//! Checks whether the brand handle (the registrable domain's first label)
//! has a page on the major platforms. Contributes non-catalog keys
//! `Has{Platform}Page`, so it plugs in like any third-party source. Off by
//! default: it sends five requests to third parties per scan.

use super::{FeatureSource, SourceError};
use crate::acquisition::HttpClient;
use crate::pipeline::ScanContext;
use crate::schema::{FeaturePartial, Source};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// Platform name and profile URL template.
pub const DEFAULT_TEMPLATES: &[(&str, &str)] = &[
    ("Facebook", "https://www.facebook.com/{handle}"),
    ("Twitter", "https://twitter.com/{handle}"),
    ("LinkedIn", "https://www.linkedin.com/company/{handle}"),
    ("Instagram", "https://www.instagram.com/{handle}"),
    ("YouTube", "https://www.youtube.com/{handle}"),
];

pub struct SocialSource {
    client: HttpClient,
    timeout: Duration,
    templates: Vec<(String, String)>,
}

impl SocialSource {
    pub fn new(client: HttpClient, timeout: Duration) -> Self {
        Self {
            client,
            timeout,
            templates: DEFAULT_TEMPLATES
                .iter()
                .map(|(p, t)| (p.to_string(), t.to_string()))
                .collect(),
        }
    }

    pub fn with_templates(mut self, templates: Vec<(String, String)>) -> Self {
        self.templates = templates;
        self
    }
}

#[async_trait]
impl FeatureSource for SocialSource {
    fn source(&self) -> Source {
        Source::External("social")
    }

    fn timeout(&self) -> Duration {
        self.timeout + Duration::from_secs(1)
    }

    async fn collect(&self, ctx: &ScanContext) -> Result<FeaturePartial, SourceError> {
        let handle = ctx.domain.label();
        if handle.is_empty() || ctx.domain.is_ip {
            return Err(SourceError::Resolution("no brand handle in domain".into()));
        }

        let urls: Vec<String> = self
            .templates
            .iter()
            .map(|(_, t)| t.replace("{handle}", handle))
            .collect();
        let responses = self
            .client
            .head_many(&urls, urls.len(), self.timeout.as_millis() as u64)
            .await;

        let mut partial = FeaturePartial::new(self.source());
        for ((platform, _), resp) in self.templates.iter().zip(responses) {
            let exists = matches!(resp, Ok(ref r) if r.status == 200);
            debug!("{platform} page for {handle}: {exists}");
            partial.set_extra(format!("Has{platform}Page"), exists);
        }
        Ok(partial)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::http_client::DEFAULT_USER_AGENT;
    use crate::pipeline::Pipeline;
    use crate::schema::FeatureValue;
    use std::sync::Arc;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_probe_marks_existing_pages() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/fb/acme"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("HEAD"))
            .and(path("/tw/acme"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let templates = vec![
            ("Facebook".to_string(), format!("{}/fb/{{handle}}", server.uri())),
            ("Twitter".to_string(), format!("{}/tw/{{handle}}", server.uri())),
        ];
        let source = SocialSource::new(
            HttpClient::new(DEFAULT_USER_AGENT).unwrap(),
            Duration::from_secs(5),
        )
        .with_templates(templates);

        let ctx = ScanContext::new("https://shop.acme.com/", Duration::from_secs(30));
        let partial = source.collect(&ctx).await.unwrap();
        assert_eq!(partial.extra()["HasFacebookPage"], FeatureValue::Int(1));
        assert_eq!(partial.extra()["HasTwitterPage"], FeatureValue::Int(0));
        assert!(partial.values().next().is_none());
    }

    #[tokio::test]
    async fn test_runs_on_spawned_pipeline_scan() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/yt/acme"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let source = SocialSource::new(
            HttpClient::new(DEFAULT_USER_AGENT).unwrap(),
            Duration::from_secs(5),
        )
        .with_templates(vec![(
            "YouTube".to_string(),
            format!("{}/yt/{{handle}}", server.uri()),
        )]);
        let pipeline =
            Arc::new(Pipeline::new(Duration::from_secs(30)).with_source(Arc::new(source)));

        // spawning requires the whole scan future, social lookups included, to be Send
        let scan = tokio::spawn({
            let pipeline = Arc::clone(&pipeline);
            async move { pipeline.scan("https://www.acme.com/").await }
        });
        let report = scan.await.unwrap().unwrap();
        assert_eq!(
            report.record.extra().get("HasYouTubePage"),
            Some(&FeatureValue::Int(1))
        );
    }

    #[tokio::test]
    async fn test_ip_host_has_no_handle() {
        let source = SocialSource::new(
            HttpClient::new(DEFAULT_USER_AGENT).unwrap(),
            Duration::from_secs(1),
        );
        let ctx = ScanContext::new("http://10.0.0.1/", Duration::from_secs(30));
        assert!(matches!(
            source.collect(&ctx).await,
            Err(SourceError::Resolution(_))
        ));
    }
}
