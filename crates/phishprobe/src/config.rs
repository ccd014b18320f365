//! Probe configuration.
//!
//! Layered: built-in defaults, then an optional JSON file (explicit path or
//! `~/.phishprobe/config.json`), then `PHISHPROBE_*` environment variables.
//! The CLI applies its own flags last.

use crate::error::{ProbeError, Result};
use crate::sources::dynamic_content::RenderTimings;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Per-operation timeouts, in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    pub http_ms: u64,
    pub dns_ms: u64,
    pub whois_ms: u64,
    pub tls_ms: u64,
    pub page_load_ms: u64,
    pub readiness_ms: u64,
    pub settle_ms: u64,
    /// Whole-URL deadline; no source outlives it.
    pub deadline_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            http_ms: 10_000,
            dns_ms: 5_000,
            whois_ms: 10_000,
            tls_ms: 5_000,
            page_load_ms: 30_000,
            readiness_ms: 10_000,
            settle_ms: 1_000,
            deadline_ms: 60_000,
        }
    }
}

impl Timeouts {
    pub fn http(&self) -> Duration {
        Duration::from_millis(self.http_ms)
    }

    pub fn dns(&self) -> Duration {
        Duration::from_millis(self.dns_ms)
    }

    pub fn whois(&self) -> Duration {
        Duration::from_millis(self.whois_ms)
    }

    pub fn tls(&self) -> Duration {
        Duration::from_millis(self.tls_ms)
    }

    pub fn deadline(&self) -> Duration {
        Duration::from_millis(self.deadline_ms)
    }

    pub fn render(&self) -> RenderTimings {
        RenderTimings {
            page_load: Duration::from_millis(self.page_load_ms),
            readiness: Duration::from_millis(self.readiness_ms),
            settle: Duration::from_millis(self.settle_ms),
            ..RenderTimings::default()
        }
    }
}

/// Everything the pipeline builder needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    pub timeouts: Timeouts,
    /// Render pages in headless Chromium.
    pub dynamic: bool,
    /// Browser contexts and URLs processed at once.
    pub concurrency: usize,
    pub chromium_path: Option<PathBuf>,
    /// Query A-record TTLs over DNS-over-HTTPS.
    pub passive_dns: bool,
    pub doh_endpoint: Option<String>,
    /// Probe social platforms for a page named after the domain.
    pub social: bool,
    /// Look up where the domain's first address is hosted.
    pub geolocation: bool,
    pub geolocation_endpoint: Option<String>,
    /// Bearer token for the geolocation service.
    pub geolocation_token: Option<String>,
    pub user_agent: Option<String>,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeouts: Timeouts::default(),
            dynamic: true,
            concurrency: 4,
            chromium_path: None,
            passive_dns: false,
            doh_endpoint: None,
            social: false,
            geolocation: false,
            geolocation_endpoint: None,
            geolocation_token: None,
            user_agent: None,
        }
    }
}

/// Directory holding the default config file (`~/.phishprobe/`).
///
/// `PHISHPROBE_HOME` overrides it.
pub fn phishprobe_home() -> PathBuf {
    if let Ok(p) = std::env::var("PHISHPROBE_HOME") {
        return PathBuf::from(p);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join(".phishprobe")
}

impl ProbeConfig {
    /// Load defaults, a config file and environment overrides.
    ///
    /// An explicit `path` must exist; the default file is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => {
                let default = phishprobe_home().join("config.json");
                if default.exists() {
                    Self::from_file(&default)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Parse a JSON config file. Missing fields keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)
            .map_err(|e| ProbeError::Config(format!("{}: {e}", path.display())))?;
        debug!("loaded config from {}", path.display());
        Ok(config)
    }

    /// Apply `PHISHPROBE_*` overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from any key lookup. Unparseable values are ignored.
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(secs) = lookup("PHISHPROBE_TIMEOUT").and_then(|v| v.parse::<u64>().ok()) {
            self.timeouts.deadline_ms = secs * 1000;
        }
        if let Some(n) = lookup("PHISHPROBE_CONCURRENCY").and_then(|v| v.parse().ok()) {
            self.concurrency = n;
        }
        if lookup("PHISHPROBE_NO_DYNAMIC").is_some() {
            self.dynamic = false;
        }
        if let Some(p) = lookup("PHISHPROBE_CHROMIUM_PATH") {
            self.chromium_path = Some(PathBuf::from(p));
        }
        if let Some(v) = lookup("PHISHPROBE_PASSIVE_DNS") {
            self.passive_dns = is_truthy(&v);
        }
        if let Some(v) = lookup("PHISHPROBE_SOCIAL") {
            self.social = is_truthy(&v);
        }
        if let Some(v) = lookup("PHISHPROBE_GEOLOCATION") {
            self.geolocation = is_truthy(&v);
        }
        if let Some(endpoint) = lookup("PHISHPROBE_GEOLOCATION_ENDPOINT") {
            self.geolocation_endpoint = Some(endpoint);
        }
        if let Some(token) = lookup("PHISHPROBE_IPINFO_TOKEN") {
            self.geolocation_token = Some(token);
        }
        if let Some(endpoint) = lookup("PHISHPROBE_DOH_ENDPOINT") {
            self.doh_endpoint = Some(endpoint);
        }
        if let Some(ua) = lookup("PHISHPROBE_USER_AGENT") {
            self.user_agent = Some(ua);
        }
    }

    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(ProbeError::Config("concurrency must be at least 1".into()));
        }
        if self.timeouts.deadline_ms == 0 {
            return Err(ProbeError::Config("deadline must be positive".into()));
        }
        let t = &self.timeouts;
        if [t.http_ms, t.dns_ms, t.whois_ms, t.tls_ms, t.page_load_ms]
            .iter()
            .any(|&ms| ms == 0)
        {
            return Err(ProbeError::Config("network timeouts must be positive".into()));
        }
        Ok(())
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
