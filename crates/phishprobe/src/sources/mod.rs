//! Feature sources.
//!
//! Each source owns a disjoint set of catalog features and reports them as a
//! [`FeaturePartial`]. Sources never panic and never abort the pipeline: any
//! failure comes back as a [`SourceError`] that the orchestrator turns into
//! defaults.

pub mod dns;
pub mod domain;
pub mod dynamic_content;
pub mod geolocation;
pub mod social;
pub mod static_content;
pub mod tls;
pub mod url_structure;
pub mod whois;

pub use domain::{DomainParts, DomainSource};
pub use dynamic_content::DynamicContentSource;
pub use geolocation::GeolocationSource;
pub use social::SocialSource;
pub use static_content::StaticContentSource;
pub use tls::TlsSource;
pub use url_structure::UrlStructureSource;

use crate::pipeline::ScanContext;
use crate::schema::{FeaturePartial, Source};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// Why a source could not produce its features.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", content = "reason", rename_all = "snake_case")]
pub enum SourceError {
    #[error("unreachable: {0}")]
    Unreachable(String),
    #[error("timed out: {0}")]
    TimedOut(String),
    #[error("name resolution failed: {0}")]
    Resolution(String),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("TLS failure: {0}")]
    Tls(String),
    #[error("browser failure: {0}")]
    Browser(String),
    #[error("disabled: {0}")]
    Disabled(String),
}

/// Result of running one source.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceOutcome {
    Success(FeaturePartial),
    Failure(SourceError),
}

impl SourceOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SourceOutcome::Success(_))
    }
}

impl From<Result<FeaturePartial, SourceError>> for SourceOutcome {
    fn from(result: Result<FeaturePartial, SourceError>) -> Self {
        match result {
            Ok(partial) => SourceOutcome::Success(partial),
            Err(e) => SourceOutcome::Failure(e),
        }
    }
}

/// A pluggable producer of features for one URL.
///
/// Built-in sources and third-party feeds implement the same trait.
/// Implementations should bound their own network calls; the pipeline
/// additionally cancels `collect` once [`FeatureSource::timeout`] or the
/// per-URL deadline elapses.
#[async_trait]
pub trait FeatureSource: Send + Sync {
    /// The source tag every produced feature must belong to.
    fn source(&self) -> Source;

    /// Upper bound on how long `collect` may run.
    fn timeout(&self) -> Duration;

    /// Produce this source's features for the URL in `ctx`.
    async fn collect(&self, ctx: &ScanContext) -> Result<FeaturePartial, SourceError>;
}

/// Render a day count as `"{y} years, {m} months, {d} days"`.
///
/// Uses 365-day years and 30-day months, so the result is an
/// approximation. Years use floor division, so a negative span (an expired
/// certificate) reads as `-1 years, 11 months, 4 days` for -31 days.
pub fn format_age(days: i64) -> String {
    let years = days.div_euclid(365);
    let rem = days.rem_euclid(365);
    format!("{years} years, {} months, {} days", rem / 30, rem % 30)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_age() {
        assert_eq!(format_age(400), "1 years, 1 months, 5 days");
        assert_eq!(format_age(0), "0 years, 0 months, 0 days");
        assert_eq!(format_age(364), "0 years, 12 months, 4 days");
        assert_eq!(format_age(-31), "-1 years, 11 months, 4 days");
        assert_eq!(format_age(-365), "-1 years, 0 months, 0 days");
    }

    #[test]
    fn test_outcome_from_result() {
        let ok: SourceOutcome = Ok(FeaturePartial::new(Source::Url)).into();
        assert!(ok.is_success());
        let err: SourceOutcome = Err(SourceError::Disabled("off".into())).into();
        assert_eq!(err, SourceOutcome::Failure(SourceError::Disabled("off".into())));
    }

    #[test]
    fn test_source_error_display() {
        let e = SourceError::TimedOut("static_content after 10s".into());
        assert_eq!(e.to_string(), "timed out: static_content after 10s");
    }
}
