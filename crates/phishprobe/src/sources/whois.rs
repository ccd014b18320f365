//! WHOIS client (RFC 3912, TCP port 43).
//!
//! Picks a server from a small TLD table, falling back to an IANA referral
//! for anything else, and follows one `Registrar WHOIS Server` referral so
//! thin registries (`.com`, `.net`) still yield registrant details.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;

const WHOIS_PORT: u16 = 43;
const IANA_SERVER: &str = "whois.iana.org";
/// Responses larger than this are truncated.
const MAX_RESPONSE: usize = 256 * 1024;

/// Parsed registration record.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WhoisRecord {
    pub registrar: Option<String>,
    pub creation_date: Option<DateTime<Utc>>,
    pub expiration_date: Option<DateTime<Utc>>,
    pub updated_date: Option<DateTime<Utc>>,
    pub status: Vec<String>,
    pub name_servers: Vec<String>,
    pub dnssec: Option<String>,
    pub registrant: Option<String>,
    pub country: Option<String>,
    /// Server named by a `Registrar WHOIS Server` or `refer` line.
    pub referral: Option<String>,
}

impl WhoisRecord {
    /// Whole days since creation, if the creation date is known.
    pub fn age_days(&self, now: DateTime<Utc>) -> Option<i64> {
        self.creation_date.map(|created| (now - created).num_days())
    }

    fn merge_missing(&mut self, other: WhoisRecord) {
        fn fill<T>(slot: &mut Option<T>, value: Option<T>) {
            if slot.is_none() {
                *slot = value;
            }
        }
        fill(&mut self.registrar, other.registrar);
        fill(&mut self.creation_date, other.creation_date);
        fill(&mut self.expiration_date, other.expiration_date);
        fill(&mut self.updated_date, other.updated_date);
        fill(&mut self.dnssec, other.dnssec);
        fill(&mut self.registrant, other.registrant);
        fill(&mut self.country, other.country);
        if self.status.is_empty() {
            self.status = other.status;
        }
        if self.name_servers.is_empty() {
            self.name_servers = other.name_servers;
        }
    }
}

/// Async WHOIS client.
#[derive(Debug, Clone)]
pub struct WhoisClient {
    timeout: Duration,
    port: u16,
}

impl Default for WhoisClient {
    fn default() -> Self {
        Self::new(Duration::from_secs(10))
    }
}

impl WhoisClient {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            port: WHOIS_PORT,
        }
    }

    /// Use a non-standard port for every server.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Look up a registrable domain.
    pub async fn lookup(&self, domain: &str) -> std::io::Result<WhoisRecord> {
        let server = match server_for(domain) {
            Some(server) => server.to_string(),
            None => self.iana_referral(domain).await?,
        };
        self.lookup_at(&server, domain).await
    }

    /// Query `server` and follow at most one registrar referral.
    pub async fn lookup_at(&self, server: &str, domain: &str) -> std::io::Result<WhoisRecord> {
        let raw = self.query(server, domain).await?;
        let mut record = parse_response(&raw);

        if let Some(referral) = record.referral.clone() {
            if !referral.eq_ignore_ascii_case(server) {
                debug!("following WHOIS referral {server} -> {referral}");
                // the thin record stands if the registrar server is unreachable
                if let Ok(raw) = self.query(&referral, domain).await {
                    let detailed = parse_response(&raw);
                    let thin = std::mem::replace(&mut record, detailed);
                    record.merge_missing(thin);
                }
            }
        }
        Ok(record)
    }

    async fn iana_referral(&self, domain: &str) -> std::io::Result<String> {
        let tld = domain.rsplit('.').next().unwrap_or(domain);
        let raw = self.query(IANA_SERVER, tld).await?;
        Ok(parse_response(&raw)
            .referral
            .unwrap_or_else(|| IANA_SERVER.to_string()))
    }

    /// Send one query line and read the whole response.
    pub async fn query(&self, server: &str, query: &str) -> std::io::Result<String> {
        let exchange = async {
            let mut stream = TcpStream::connect((server, self.port)).await?;
            stream.write_all(format!("{query}\r\n").as_bytes()).await?;

            let mut buf = Vec::new();
            let mut chunk = [0u8; 8192];
            loop {
                let n = stream.read(&mut chunk).await?;
                if n == 0 || buf.len() >= MAX_RESPONSE {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
            }
            Ok::<_, std::io::Error>(String::from_utf8_lossy(&buf).into_owned())
        };

        tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| {
                std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    format!("WHOIS query to {server} timed out"),
                )
            })?
    }
}

/// Authoritative server for well-known TLDs.
pub fn server_for(domain: &str) -> Option<&'static str> {
    let tld = domain.rsplit('.').next()?.to_ascii_lowercase();
    let server = match tld.as_str() {
        "com" | "net" => "whois.verisign-grs.com",
        "org" => "whois.pir.org",
        "info" => "whois.afilias.net",
        "io" => "whois.nic.io",
        "ai" => "whois.nic.ai",
        "co" => "whois.nic.co",
        "dev" | "app" => "whois.nic.google",
        "xyz" => "whois.nic.xyz",
        "top" => "whois.nic.top",
        "uk" => "whois.nic.uk",
        "de" => "whois.denic.de",
        "fr" => "whois.nic.fr",
        "nl" => "whois.domain-registry.nl",
        "br" => "whois.registro.br",
        "jp" => "whois.jprs.jp",
        "cn" => "whois.cnnic.cn",
        "ru" => "whois.tcinet.ru",
        "in" => "whois.registry.in",
        "au" => "whois.auda.org.au",
        _ => return None,
    };
    Some(server)
}

/// Parse a free-form `key: value` WHOIS response.
///
/// The first occurrence of each scalar field wins; status and name server
/// lines accumulate without duplicates.
pub fn parse_response(raw: &str) -> WhoisRecord {
    let mut record = WhoisRecord::default();

    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('%') || line.starts_with('#') || line.starts_with(">>>")
        {
            continue;
        }
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim().to_ascii_lowercase();
        let value = value.trim();
        if value.is_empty() {
            continue;
        }

        match key.as_str() {
            "registrar" | "sponsoring registrar" | "registrar name" => {
                record.registrar.get_or_insert_with(|| value.to_string());
            }
            "creation date" | "created" | "created on" | "registered on" | "registration time"
            | "domain registration date" => {
                if record.creation_date.is_none() {
                    record.creation_date = parse_date(value);
                }
            }
            "registry expiry date"
            | "registrar registration expiration date"
            | "expiration date"
            | "expiry date"
            | "expires"
            | "expires on"
            | "paid-till"
            | "expiration time" => {
                if record.expiration_date.is_none() {
                    record.expiration_date = parse_date(value);
                }
            }
            "updated date" | "last updated" | "last-update" | "last modified" | "changed" => {
                if record.updated_date.is_none() {
                    record.updated_date = parse_date(value);
                }
            }
            "name server" | "nserver" | "nameserver" => {
                let ns = value
                    .split_whitespace()
                    .next()
                    .unwrap_or(value)
                    .trim_end_matches('.')
                    .to_ascii_lowercase();
                if !record.name_servers.contains(&ns) {
                    record.name_servers.push(ns);
                }
            }
            "domain status" | "status" => {
                // "clientTransferProhibited https://icann.org/epp#..."
                let status = value.split_whitespace().next().unwrap_or(value).to_string();
                if !record.status.contains(&status) {
                    record.status.push(status);
                }
            }
            "dnssec" => {
                record.dnssec.get_or_insert_with(|| value.to_string());
            }
            "registrant organization" | "registrant organisation" | "org" | "organisation" => {
                record.registrant.get_or_insert_with(|| value.to_string());
            }
            "registrant country" | "country" => {
                record.country.get_or_insert_with(|| value.to_string());
            }
            "registrar whois server" | "refer" | "whois" => {
                if record.referral.is_none() && !value.contains(' ') {
                    let server = value
                        .trim_start_matches("whois://")
                        .trim_end_matches('/')
                        .to_ascii_lowercase();
                    record.referral = Some(server);
                }
            }
            _ => {}
        }
    }

    record
}

/// Parse the date formats registries actually use.
pub fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    // drop trailing zone names like "UTC" or "(JST)"
    let head = value.split_whitespace().take(2).collect::<Vec<_>>().join(" ");
    for candidate in [value, head.as_str()] {
        for fmt in [
            "%Y-%m-%dT%H:%M:%SZ",
            "%Y-%m-%dT%H:%M:%S%.fZ",
            "%Y-%m-%dT%H:%M:%S",
            "%Y-%m-%d %H:%M:%S",
            "%Y.%m.%d %H:%M:%S",
            "%d-%b-%Y %H:%M:%S",
        ] {
            if let Ok(naive) = NaiveDateTime::parse_from_str(candidate, fmt) {
                return Some(naive.and_utc());
            }
        }
    }
    let first = value.split_whitespace().next().unwrap_or(value);
    for fmt in ["%Y-%m-%d", "%d-%b-%Y", "%Y.%m.%d", "%d.%m.%Y", "%Y/%m/%d", "%Y%m%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(first, fmt) {
            return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tokio::net::TcpListener;

    const VERISIGN: &str = "\
   Domain Name: EXAMPLE.COM
   Registry Domain ID: 2336799_DOMAIN_COM-VRSN
   Registrar WHOIS Server: whois.iana.org
   Updated Date: 2024-08-14T07:01:34Z
   Creation Date: 1995-08-14T04:00:00Z
   Registry Expiry Date: 2025-08-13T04:00:00Z
   Registrar: RESERVED-Internet Assigned Numbers Authority
   Domain Status: clientDeleteProhibited https://icann.org/epp#clientDeleteProhibited
   Domain Status: clientTransferProhibited https://icann.org/epp#clientTransferProhibited
   Name Server: A.IANA-SERVERS.NET
   Name Server: B.IANA-SERVERS.NET
   DNSSEC: signedDelegation
>>> Last update of whois database: 2024-09-01T00:00:00Z <<<
";

    #[test]
    fn test_parse_verisign_response() {
        let record = parse_response(VERISIGN);
        assert_eq!(
            record.registrar.as_deref(),
            Some("RESERVED-Internet Assigned Numbers Authority")
        );
        assert_eq!(
            record.creation_date,
            Some(Utc.with_ymd_and_hms(1995, 8, 14, 4, 0, 0).unwrap())
        );
        assert_eq!(
            record.expiration_date,
            Some(Utc.with_ymd_and_hms(2025, 8, 13, 4, 0, 0).unwrap())
        );
        assert!(record.updated_date.is_some());
        assert_eq!(
            record.name_servers,
            vec!["a.iana-servers.net", "b.iana-servers.net"]
        );
        assert_eq!(
            record.status,
            vec!["clientDeleteProhibited", "clientTransferProhibited"]
        );
        assert_eq!(record.dnssec.as_deref(), Some("signedDelegation"));
        assert_eq!(record.referral.as_deref(), Some("whois.iana.org"));
    }

    #[test]
    fn test_parse_iana_refer() {
        let record = parse_response("refer:        whois.nic.xyz\n\ndomain:       XYZ\n");
        assert_eq!(record.referral.as_deref(), Some("whois.nic.xyz"));
    }

    #[test]
    fn test_parse_dates() {
        let expected = Utc.with_ymd_and_hms(2020, 1, 2, 0, 0, 0).unwrap();
        assert_eq!(parse_date("2020-01-02"), Some(expected));
        assert_eq!(parse_date("02-Jan-2020"), Some(expected));
        assert_eq!(parse_date("2020.01.02 00:00:00"), Some(expected));
        assert_eq!(parse_date("2020-01-02T00:00:00+00:00"), Some(expected));
        assert_eq!(parse_date("not a date"), None);
    }

    #[test]
    fn test_age_days() {
        let record = WhoisRecord {
            creation_date: Some(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap()),
            ..Default::default()
        };
        let now = Utc.with_ymd_and_hms(2021, 2, 5, 12, 0, 0).unwrap();
        assert_eq!(record.age_days(now), Some(401));
    }

    #[test]
    fn test_server_table() {
        assert_eq!(server_for("example.com"), Some("whois.verisign-grs.com"));
        assert_eq!(server_for("example.ORG"), Some("whois.pir.org"));
        assert_eq!(server_for("example.zz"), None);
    }

    #[tokio::test]
    async fn test_query_against_local_server() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 256];
            let n = socket.read(&mut buf).await.unwrap();
            assert_eq!(&buf[..n], b"example.test\r\n");
            socket
                .write_all(b"Registrar: Test Registrar\r\nCreation Date: 2001-02-03\r\n")
                .await
                .unwrap();
        });

        let client = WhoisClient::new(Duration::from_secs(5)).with_port(port);
        let record = client.lookup_at("127.0.0.1", "example.test").await.unwrap();
        assert_eq!(record.registrar.as_deref(), Some("Test Registrar"));
        assert!(record.creation_date.is_some());
    }
}
