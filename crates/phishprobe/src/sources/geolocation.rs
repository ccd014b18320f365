//! Hosting geolocation.
//!
//! Resolves the domain and asks an ipinfo-style JSON service where the
//! first address is hosted. Contributes non-catalog keys only
//! (`HostingCountry`, `HostingOrg`, `HostingASN`, ...). Off by default; the
//! service usually wants an API token.

use super::dns;
use super::{FeatureSource, SourceError};
use crate::acquisition::HttpClient;
use crate::pipeline::ScanContext;
use crate::schema::{FeaturePartial, Source};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

/// Default geolocation service; queried as `{endpoint}/{ip}/json`.
pub const DEFAULT_GEOLOCATION_ENDPOINT: &str = "https://ipinfo.io";

/// Where an address is hosted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HostingInfo {
    pub ip: String,
    pub country: Option<String>,
    pub region: Option<String>,
    pub city: Option<String>,
    pub org: Option<String>,
    /// First word of `org` (`AS15169` for `AS15169 Google LLC`).
    pub asn: Option<String>,
}

impl HostingInfo {
    /// Read an ipinfo JSON body. Empty strings count as absent.
    pub fn from_json(ip: &str, body: &serde_json::Value) -> Self {
        let field = |key: &str| {
            body.get(key)
                .and_then(|v| v.as_str())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };
        let org = field("org");
        let asn = org
            .as_deref()
            .and_then(|o| o.split_whitespace().next())
            .map(str::to_string);
        Self {
            ip: ip.to_string(),
            country: field("country"),
            region: field("region"),
            city: field("city"),
            org,
            asn,
        }
    }
}

/// Geolocation source.
pub struct GeolocationSource {
    client: HttpClient,
    endpoint: String,
    token: Option<String>,
    dns_timeout: Duration,
    http_timeout: Duration,
}

impl GeolocationSource {
    pub fn new(client: HttpClient, dns_timeout: Duration, http_timeout: Duration) -> Self {
        Self {
            client,
            endpoint: DEFAULT_GEOLOCATION_ENDPOINT.to_string(),
            token: None,
            dns_timeout,
            http_timeout,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    /// Bearer token sent with every lookup.
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.is_empty());
        self
    }

    /// Look up one address.
    pub async fn locate(&self, ip: &str) -> Result<HostingInfo, SourceError> {
        let url = format!("{}/{ip}/json", self.endpoint);
        let bearer = self.token.as_ref().map(|t| format!("Bearer {t}"));
        let headers: Vec<(&str, &str)> = bearer
            .as_deref()
            .map(|b| vec![("authorization", b)])
            .unwrap_or_default();
        let body = self
            .client
            .get_json(&url, &[], &headers, self.http_timeout.as_millis() as u64)
            .await
            .map_err(|e| SourceError::Unreachable(format!("{e:#}")))?;
        Ok(HostingInfo::from_json(ip, &body))
    }
}

#[async_trait]
impl FeatureSource for GeolocationSource {
    fn source(&self) -> Source {
        Source::External("geolocation")
    }

    fn timeout(&self) -> Duration {
        self.dns_timeout + self.http_timeout + Duration::from_secs(1)
    }

    async fn collect(&self, ctx: &ScanContext) -> Result<FeaturePartial, SourceError> {
        let target = ctx.domain.lookup_host();
        if target.is_empty() {
            return Err(SourceError::Resolution(format!("no host in {:?}", ctx.url)));
        }
        let ips = dns::resolve_ips(target, self.dns_timeout)
            .await
            .map_err(|e| SourceError::Resolution(format!("{e:#}")))?;
        let Some(first) = ips.first() else {
            return Err(SourceError::Resolution(format!("{target} has no addresses")));
        };

        let info = self.locate(&first.to_string()).await?;
        debug!("{target} hosted at {:?} ({:?})", info.country, info.org);

        let mut partial = FeaturePartial::new(self.source());
        partial
            .set_extra("HostingIPCount", ips.len())
            .set_extra("HostingIP", info.ip);
        for (key, value) in [
            ("HostingCountry", info.country),
            ("HostingRegion", info.region),
            ("HostingCity", info.city),
            ("HostingOrg", info.org),
            ("HostingASN", info.asn),
        ] {
            if let Some(value) = value {
                partial.set_extra(key, value);
            }
        }
        Ok(partial)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::http_client::DEFAULT_USER_AGENT;
    use crate::schema::FeatureValue;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn source(endpoint: &str, token: Option<&str>) -> GeolocationSource {
        GeolocationSource::new(
            HttpClient::new(DEFAULT_USER_AGENT).unwrap(),
            Duration::from_secs(2),
            Duration::from_secs(5),
        )
        .with_endpoint(endpoint)
        .with_token(token.map(str::to_string))
    }

    #[test]
    fn test_asn_is_first_word_of_org() {
        let info = HostingInfo::from_json(
            "8.8.8.8",
            &serde_json::json!({"country": "US", "city": "", "org": "AS15169 Google LLC"}),
        );
        assert_eq!(info.asn.as_deref(), Some("AS15169"));
        assert_eq!(info.country.as_deref(), Some("US"));
        assert_eq!(info.city, None);
        assert_eq!(info.region, None);
    }

    #[tokio::test]
    async fn test_collect_with_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/127.0.0.1/json"))
            .and(header("authorization", "Bearer secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "ip": "127.0.0.1",
                "country": "NL",
                "region": "North Holland",
                "city": "Amsterdam",
                "org": "AS14061 DigitalOcean, LLC"
            })))
            .mount(&server)
            .await;

        let ctx = ScanContext::new("http://127.0.0.1/login", Duration::from_secs(30));
        let partial = source(&server.uri(), Some("secret"))
            .collect(&ctx)
            .await
            .unwrap();
        let extra = partial.extra();
        assert_eq!(extra["HostingIP"], FeatureValue::Text("127.0.0.1".into()));
        assert_eq!(extra["HostingIPCount"], FeatureValue::Int(1));
        assert_eq!(extra["HostingCountry"], FeatureValue::Text("NL".into()));
        assert_eq!(extra["HostingASN"], FeatureValue::Text("AS14061".into()));
        assert!(partial.values().next().is_none());
    }

    #[tokio::test]
    async fn test_service_error_fails_source() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
                "error": {"title": "Unknown token"}
            })))
            .mount(&server)
            .await;

        let ctx = ScanContext::new("http://127.0.0.1/", Duration::from_secs(30));
        let result = source(&server.uri(), None).collect(&ctx).await;
        assert!(matches!(result, Err(SourceError::Unreachable(_))));
    }

    #[tokio::test]
    async fn test_no_host_is_resolution_error() {
        let ctx = ScanContext::new("", Duration::from_secs(30));
        let result = source("http://127.0.0.1:1", None).collect(&ctx).await;
        assert!(matches!(result, Err(SourceError::Resolution(_))));
    }
}
