//! Name resolution and passive DNS statistics.

use crate::acquisition::HttpClient;
use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeSet;
use std::net::IpAddr;
use std::time::Duration;

/// Default DNS-over-HTTPS JSON endpoint.
pub const DEFAULT_DOH_ENDPOINT: &str = "https://dns.google/resolve";

/// Resolve a host to its unique addresses, sorted.
pub async fn resolve_ips(host: &str, timeout: Duration) -> Result<Vec<IpAddr>> {
    if let Ok(ip) = host.parse::<IpAddr>() {
        return Ok(vec![ip]);
    }
    let addrs = tokio::time::timeout(timeout, tokio::net::lookup_host((host, 0)))
        .await
        .with_context(|| format!("resolving {host} timed out"))?
        .with_context(|| format!("resolving {host}"))?;
    let unique: BTreeSet<IpAddr> = addrs.map(|a| a.ip()).collect();
    Ok(unique.into_iter().collect())
}

/// A records and TTL statistics from a DoH resolver.
///
/// Records without a TTL count toward the record total but not the TTL
/// statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PassiveDns {
    pub records: Vec<(String, Option<u32>)>,
    pub avg_ttl: f64,
    pub min_ttl: u32,
    pub max_ttl: u32,
}

impl PassiveDns {
    pub fn count(&self) -> usize {
        self.records.len()
    }
}

/// Query a DoH JSON endpoint for A records of `name`.
pub async fn passive_dns(
    client: &HttpClient,
    endpoint: &str,
    name: &str,
    timeout: Duration,
) -> Result<PassiveDns> {
    let body = client
        .get_json(
            endpoint,
            &[("name", name), ("type", "A")],
            &[],
            timeout.as_millis() as u64,
        )
        .await
        .context("passive DNS query")?;
    Ok(parse_doh_answer(&body))
}

/// Extract A records from a DoH JSON response body.
///
/// Answers with an explicit non-A type (CNAME chains) are skipped.
pub fn parse_doh_answer(body: &serde_json::Value) -> PassiveDns {
    let records: Vec<(String, Option<u32>)> = body
        .get("Answer")
        .and_then(|a| a.as_array())
        .map(|answers| {
            answers
                .iter()
                .filter(|a| a.get("type").and_then(|t| t.as_u64()).map_or(true, |t| t == 1))
                .filter_map(|a| {
                    let data = a.get("data")?.as_str()?.to_string();
                    let ttl = a
                        .get("TTL")
                        .and_then(|t| t.as_u64())
                        .map(|t| u32::try_from(t).unwrap_or(u32::MAX));
                    Some((data, ttl))
                })
                .collect()
        })
        .unwrap_or_default();

    let ttls: Vec<u32> = records.iter().filter_map(|(_, ttl)| *ttl).collect();
    let avg_ttl = if ttls.is_empty() {
        0.0
    } else {
        ttls.iter().map(|&t| t as f64).sum::<f64>() / ttls.len() as f64
    };

    PassiveDns {
        avg_ttl,
        min_ttl: ttls.iter().copied().min().unwrap_or(0),
        max_ttl: ttls.iter().copied().max().unwrap_or(0),
        records,
    }
}
