//! TLS certificate inspection.
//!
//! Connects to port 443 with certificate verification on, so an invalid or
//! self-signed chain is a failure just like a refused connection.

use super::{format_age, FeatureSource, SourceError};
use crate::pipeline::ScanContext;
use crate::schema::{Feature, FeaturePartial, Source};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rustls::pki_types::ServerName;
use rustls::{ClientConfig, RootCertStore};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tracing::debug;

/// The leaf certificate facts we report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CertSummary {
    pub issuer: String,
    pub not_before: DateTime<Utc>,
    pub not_after: DateTime<Utc>,
}

impl CertSummary {
    /// Parse a DER-encoded X.509 certificate.
    pub fn from_der(der: &[u8]) -> Result<Self, SourceError> {
        let (_, cert) = x509_parser::parse_x509_certificate(der)
            .map_err(|e| SourceError::Parse(format!("certificate: {e}")))?;
        let validity = cert.validity();
        let not_before = DateTime::from_timestamp(validity.not_before.timestamp(), 0)
            .ok_or_else(|| SourceError::Parse("notBefore out of range".into()))?;
        let not_after = DateTime::from_timestamp(validity.not_after.timestamp(), 0)
            .ok_or_else(|| SourceError::Parse("notAfter out of range".into()))?;
        Ok(Self {
            issuer: cert.issuer().to_string(),
            not_before,
            not_after,
        })
    }

    /// Whole days until `notAfter`, truncated toward zero.
    pub fn days_until_expiry(&self, now: DateTime<Utc>) -> i64 {
        (self.not_after - now).num_days()
    }

    pub fn into_partial(self, now: DateTime<Utc>) -> FeaturePartial {
        let days = self.days_until_expiry(now);
        let mut partial = FeaturePartial::new(Source::Tls);
        partial
            .set(Feature::HasSsl, true)
            .set(Feature::CertIssuer, self.issuer)
            .set(
                Feature::CertValidFrom,
                self.not_before.to_rfc3339_opts(SecondsFormat::Secs, true),
            )
            .set(
                Feature::CertValidTo,
                self.not_after.to_rfc3339_opts(SecondsFormat::Secs, true),
            )
            .set(Feature::DaysUntilExpiry, days)
            .set(Feature::ValidityPeriod, format_age(days));
        partial
    }
}

/// Certificate source.
pub struct TlsSource {
    connector: TlsConnector,
    timeout: Duration,
    port: u16,
}

impl TlsSource {
    /// Build a verifying connector over the bundled webpki roots.
    pub fn new(timeout: Duration) -> Result<Self, SourceError> {
        let mut roots = RootCertStore::empty();
        roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

        let provider = Arc::new(rustls::crypto::ring::default_provider());
        let config = ClientConfig::builder_with_provider(provider)
            .with_safe_default_protocol_versions()
            .map_err(|e| SourceError::Tls(e.to_string()))?
            .with_root_certificates(roots)
            .with_no_client_auth();

        Ok(Self {
            connector: TlsConnector::from(Arc::new(config)),
            timeout,
            port: 443,
        })
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Handshake with `host` and summarize the peer's leaf certificate.
    pub async fn inspect(&self, host: &str) -> Result<CertSummary, SourceError> {
        let name = ServerName::try_from(host.to_string())
            .map_err(|e| SourceError::Tls(format!("invalid server name {host}: {e}")))?;

        let handshake = async {
            let tcp = TcpStream::connect((host, self.port))
                .await
                .map_err(|e| SourceError::Unreachable(format!("{host}:{}: {e}", self.port)))?;
            self.connector
                .connect(name, tcp)
                .await
                .map_err(|e| SourceError::Tls(format!("handshake with {host}: {e}")))
        };

        let stream = tokio::time::timeout(self.timeout, handshake)
            .await
            .map_err(|_| SourceError::TimedOut(format!("TLS handshake with {host}")))??;

        let (_, conn) = stream.get_ref();
        let leaf = conn
            .peer_certificates()
            .and_then(|chain| chain.first())
            .ok_or_else(|| SourceError::Tls(format!("{host} sent no certificate")))?;
        CertSummary::from_der(leaf.as_ref())
    }
}

#[async_trait]
impl FeatureSource for TlsSource {
    fn source(&self) -> Source {
        Source::Tls
    }

    fn timeout(&self) -> Duration {
        self.timeout + Duration::from_secs(1)
    }

    async fn collect(&self, ctx: &ScanContext) -> Result<FeaturePartial, SourceError> {
        let host = ctx.domain.lookup_host();
        if host.is_empty() {
            return Err(SourceError::Resolution("no host to connect to".into()));
        }
        let summary = self.inspect(host).await?;
        debug!("certificate for {host} issued by {}", summary.issuer);
        Ok(summary.into_partial(Utc::now()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FeatureValue;
    use chrono::TimeZone;

    fn summary() -> CertSummary {
        CertSummary {
            issuer: "C=US, O=Let's Encrypt, CN=R3".into(),
            not_before: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            not_after: Utc.with_ymd_and_hms(2025, 2, 5, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_days_until_expiry_truncates() {
        let now = Utc.with_ymd_and_hms(2025, 2, 3, 18, 0, 0).unwrap();
        assert_eq!(summary().days_until_expiry(now), 1);
        let after = Utc.with_ymd_and_hms(2025, 2, 6, 12, 0, 0).unwrap();
        assert_eq!(summary().days_until_expiry(after), -1);
    }

    #[test]
    fn test_partial_fields() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let partial = summary().into_partial(now);
        assert_eq!(partial.get(Feature::HasSsl), Some(&FeatureValue::Int(1)));
        assert_eq!(partial.get(Feature::DaysUntilExpiry), Some(&FeatureValue::Int(401)));
        assert_eq!(
            partial.get(Feature::ValidityPeriod),
            Some(&FeatureValue::Text("1 years, 1 months, 6 days".into()))
        );
        assert_eq!(
            partial.get(Feature::CertValidTo),
            Some(&FeatureValue::Text("2025-02-05T00:00:00Z".into()))
        );
        assert!(partial.values().all(|(f, _)| f.spec().source == Source::Tls));
    }

    #[test]
    fn test_garbage_der_is_parse_error() {
        assert!(matches!(
            CertSummary::from_der(b"not a certificate"),
            Err(SourceError::Parse(_))
        ));
    }

    #[tokio::test]
    async fn test_refused_connection_fails() {
        let source = TlsSource::new(Duration::from_secs(2)).unwrap().with_port(1);
        let err = source.inspect("127.0.0.1").await.unwrap_err();
        assert!(matches!(
            err,
            SourceError::Unreachable(_) | SourceError::TimedOut(_)
        ));
    }
}
