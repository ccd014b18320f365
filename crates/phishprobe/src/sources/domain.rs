//! Registrable domain, DNS and WHOIS features.
//!
//! [`DomainParts`] is computed once per URL by the pipeline and shared with
//! every source. The structural features it yields (length, TLD, subdomain
//! count, IP flag) need no network; the pipeline falls back to them when
//! [`DomainSource`] fails.

use super::dns::{self, DEFAULT_DOH_ENDPOINT};
use super::whois::WhoisClient;
use super::{format_age, FeatureSource, SourceError};
use crate::acquisition::HttpClient;
use crate::pipeline::ScanContext;
use crate::schema::{Feature, FeaturePartial, Source};
use crate::urlparts::{host_of, UrlParts};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use std::net::{IpAddr, Ipv6Addr};
use std::time::Duration;
use tracing::{debug, warn};

/// Host split into subdomain, registrable domain and public suffix.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DomainParts {
    /// Lower-cased host the split was computed from.
    pub host: String,
    /// Registrable domain (label + public suffix), or the IP itself.
    pub registrable: String,
    /// Public suffix; empty for IPs and unknown suffixes.
    pub suffix: String,
    /// Labels left of the registrable domain.
    pub subdomain: String,
    pub is_ip: bool,
}

impl DomainParts {
    /// Split the host of a URL.
    ///
    /// Scheme-less input such as `example.com/login` takes its host from
    /// the first path segment.
    pub fn from_url(parts: &UrlParts) -> Self {
        let host = if parts.authority.is_empty() {
            let first = parts.path.split('/').next().unwrap_or("");
            if first.contains('.') && !first.contains(char::is_whitespace) {
                host_of(first)
            } else {
                String::new()
            }
        } else {
            parts.host()
        };
        Self::from_host(&host)
    }

    /// Split a bare host using the public suffix list's longest match.
    pub fn from_host(host: &str) -> Self {
        let host = host.trim().trim_end_matches('.').to_ascii_lowercase();
        if host.is_empty() {
            return Self::default();
        }

        if host.parse::<IpAddr>().is_ok() {
            return Self {
                registrable: host.clone(),
                is_ip: true,
                host,
                ..Self::default()
            };
        }

        let (registrable, suffix) = match psl::domain(host.as_bytes()) {
            Some(domain) if domain.suffix().is_known() => (
                String::from_utf8_lossy(domain.as_bytes()).into_owned(),
                String::from_utf8_lossy(domain.suffix().as_bytes()).into_owned(),
            ),
            _ => match psl::suffix(host.as_bytes()) {
                // the host is itself a public suffix
                Some(suffix) if suffix.is_known() && suffix.as_bytes() == host.as_bytes() => {
                    (host.clone(), host.clone())
                }
                // unknown suffix: the last label stands in for the domain
                _ => (
                    host.rsplit('.').next().unwrap_or(&host).to_string(),
                    String::new(),
                ),
            },
        };

        let subdomain = host
            .strip_suffix(registrable.as_str())
            .map(|s| s.trim_end_matches('.').to_string())
            .unwrap_or_default();
        let is_ip = all_numeric_segments(&registrable);

        Self {
            host,
            registrable,
            suffix,
            subdomain,
            is_ip,
        }
    }

    /// Non-empty dot-separated labels in the subdomain.
    pub fn subdomain_count(&self) -> usize {
        self.subdomain.split('.').filter(|s| !s.is_empty()).count()
    }

    /// First label of the registrable domain (`example` for `example.co.uk`).
    pub fn label(&self) -> &str {
        if self.is_ip {
            return &self.registrable;
        }
        self.registrable.split('.').next().unwrap_or("")
    }

    /// Host used for network lookups: the registrable domain if known,
    /// otherwise the raw host.
    pub fn lookup_host(&self) -> &str {
        if self.registrable.is_empty() {
            &self.host
        } else {
            &self.registrable
        }
    }

    /// Features computable without any network access.
    pub fn structural_partial(&self) -> FeaturePartial {
        let mut partial = FeaturePartial::new(Source::Domain);
        partial
            .set(Feature::Domain, self.registrable.as_str())
            .set(Feature::DomainLengthOfUrl, self.registrable.chars().count())
            .set(Feature::IsDomainIp, self.is_ip)
            .set(Feature::Tld, self.suffix.as_str())
            .set(Feature::TldLength, self.suffix.chars().count())
            .set(Feature::NumberOfSubdomains, self.subdomain_count());
        partial
    }
}

fn all_numeric_segments(domain: &str) -> bool {
    if domain.parse::<Ipv6Addr>().is_ok() {
        return true;
    }
    domain
        .split('.')
        .all(|seg| !seg.is_empty() && seg.chars().all(|c| c.is_ascii_digit()))
}

fn rfc3339(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Domain, DNS and WHOIS source.
pub struct DomainSource {
    whois: WhoisClient,
    dns_timeout: Duration,
    timeout: Duration,
    passive: Option<(HttpClient, String)>,
}

impl DomainSource {
    pub fn new(whois_timeout: Duration, dns_timeout: Duration) -> Self {
        Self {
            whois: WhoisClient::new(whois_timeout),
            dns_timeout,
            timeout: whois_timeout * 2 + dns_timeout * 2,
            passive: None,
        }
    }

    /// Also collect A-record TTL statistics from a DoH endpoint.
    pub fn with_passive_dns(mut self, client: HttpClient, endpoint: Option<String>) -> Self {
        self.passive = Some((
            client,
            endpoint.unwrap_or_else(|| DEFAULT_DOH_ENDPOINT.to_string()),
        ));
        self
    }
}

#[async_trait]
impl FeatureSource for DomainSource {
    fn source(&self) -> Source {
        Source::Domain
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn collect(&self, ctx: &ScanContext) -> Result<FeaturePartial, SourceError> {
        let parts = &ctx.domain;
        if parts.host.is_empty() {
            return Err(SourceError::Resolution(format!(
                "no host in {:?}",
                ctx.url
            )));
        }

        let mut partial = parts.structural_partial();

        let target = parts.lookup_host();
        let ips = dns::resolve_ips(target, self.dns_timeout)
            .await
            .map_err(|e| SourceError::Resolution(format!("{e:#}")))?;
        let ips: Vec<String> = ips.iter().map(ToString::to_string).collect();
        debug!("{target} resolved to {} address(es)", ips.len());
        partial.set(Feature::IpAddresses, ips);

        if !parts.is_ip {
            match self.whois.lookup(&parts.registrable).await {
                Ok(record) => {
                    let now = Utc::now();
                    if let Some(registrar) = &record.registrar {
                        partial.set(Feature::Registrar, registrar.as_str());
                    }
                    if let Some(created) = &record.creation_date {
                        partial.set(Feature::CreationDate, rfc3339(created));
                    }
                    if let Some(expires) = &record.expiration_date {
                        partial.set(Feature::ExpirationDate, rfc3339(expires));
                    }
                    if let Some(updated) = &record.updated_date {
                        partial.set(Feature::UpdatedDate, rfc3339(updated));
                    }
                    if let Some(days) = record.age_days(now) {
                        partial
                            .set(Feature::DomainAgeDays, days)
                            .set(Feature::DomainAge, format_age(days));
                    }
                    if !record.status.is_empty() {
                        partial.set(Feature::DomainStatus, record.status.clone());
                    }
                    if !record.name_servers.is_empty() {
                        partial.set(Feature::NameServers, record.name_servers.clone());
                    }
                    if let Some(dnssec) = &record.dnssec {
                        partial.set(Feature::Dnssec, dnssec.as_str());
                    }
                    if let Some(registrant) = &record.registrant {
                        partial.set(Feature::Registrant, registrant.as_str());
                    }
                    if let Some(country) = &record.country {
                        partial.set(Feature::Country, country.as_str());
                    }
                }
                Err(e) => warn!("WHOIS lookup for {} failed: {e}", parts.registrable),
            }
        }

        if let Some((client, endpoint)) = &self.passive {
            match dns::passive_dns(client, endpoint, parts.lookup_host(), self.dns_timeout).await {
                Ok(stats) => {
                    partial
                        .set(Feature::ARecordCount, stats.count())
                        .set(Feature::AvgTtl, stats.avg_ttl)
                        .set(Feature::MinTtl, i64::from(stats.min_ttl))
                        .set(Feature::MaxTtl, i64::from(stats.max_ttl));
                }
                Err(e) => warn!("passive DNS for {} failed: {e:#}", parts.lookup_host()),
            }
        }

        Ok(partial)
    }
}
