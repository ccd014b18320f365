//! Feature schema: names, categories, owning sources, and the merged record.
//!
//! The catalog in [`catalog`] is the single, read-only description of every
//! feature the pipeline knows about. Sources write into [`FeaturePartial`]s
//! keyed by the [`Feature`] enum, so a misspelled key is a compile error
//! rather than a silently missing column.

pub mod catalog;
pub mod record;

pub use catalog::{spec, FeatureSpec, CATALOG};
pub use record::{validate, FeaturePartial, FeatureRecord, Validation};

use serde::{Serialize, Serializer};
use std::fmt;

/// The data source that owns a feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    /// Pure URL-structure features.
    Url,
    /// Registrable domain, DNS and WHOIS.
    Domain,
    /// TLS certificate inspection.
    Tls,
    /// Static HTML fetch.
    StaticContent,
    /// Rendered DOM inspection.
    DynamicContent,
    /// Statistical derivation on the URL string.
    Derived,
    /// Pluggable third-party source; owns no catalog features.
    External(&'static str),
}

impl Source {
    pub fn name(&self) -> &'static str {
        match self {
            Source::Url => "url",
            Source::Domain => "domain_whois",
            Source::Tls => "ssl_hosting",
            Source::StaticContent => "static_content",
            Source::DynamicContent => "dynamic_content",
            Source::Derived => "derived",
            Source::External(name) => *name,
        }
    }

    /// Whether this source needs network access.
    pub fn is_network(&self) -> bool {
        !matches!(self, Source::Url | Source::Derived)
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Reporting category of a feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Features computed from the URL and its domain.
    DomainUrl,
    /// Features from the static HTML document.
    ContentStatic,
    /// Features from the rendered DOM.
    ContentDynamic,
    /// Certificate features.
    Ssl,
    /// Statistical metrics on the URL string.
    Advanced,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::DomainUrl,
        Category::ContentStatic,
        Category::ContentDynamic,
        Category::Ssl,
        Category::Advanced,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Category::DomainUrl => "URL & Domain",
            Category::ContentStatic => "Static Content",
            Category::ContentDynamic => "Dynamic Content",
            Category::Ssl => "SSL",
            Category::Advanced => "Advanced Metrics",
        }
    }
}

/// Every feature the pipeline can produce.
///
/// Declaration order is catalog order; the first 59 variants are the
/// classifier's required inputs in the order it expects them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Feature {
    LengthOfUrl,
    UrlComplexity,
    CharacterComplexity,
    DomainLengthOfUrl,
    IsDomainIp,
    Tld,
    TldLength,
    LetterCntInUrl,
    UrlLetterRatio,
    DigitCntInUrl,
    UrlDigitRatio,
    EqualCharCntInUrl,
    QuesMarkCntInUrl,
    AmpCharCntInUrl,
    OtherSpclCharCntInUrl,
    UrlOtherSpclCharRatio,
    NumberOfHashtags,
    NumberOfSubdomains,
    HavingPath,
    PathLength,
    HavingQuery,
    HavingFragment,
    HavingAnchor,
    HasSsl,
    IsUnreachable,
    LineOfCode,
    LongestLineLength,
    HasTitle,
    HasFavicon,
    HasRobotsBlocked,
    IsResponsive,
    IsUrlRedirects,
    IsSelfRedirects,
    HasDescription,
    HasPopup,
    HasIFrame,
    IsFormSubmitExternal,
    HasSocialMediaPage,
    HasSubmitButton,
    HasHiddenFields,
    HasPasswordFields,
    HasBankingKey,
    HasPaymentKey,
    HasCryptoKey,
    HasCopyrightInfoKey,
    CntImages,
    CntFilesCss,
    CntFilesJs,
    CntSelfHRef,
    CntEmptyRef,
    CntExternalRef,
    CntPopup,
    CntIFrame,
    UniqueFeatureCnt,
    ShannonEntropy,
    FractalDimension,
    KolmogorovComplexity,
    HexPatternCnt,
    Base64PatternCnt,

    // auxiliary, reported but not fed to the classifier
    Url,
    Domain,
    IpAddresses,
    Registrar,
    CreationDate,
    ExpirationDate,
    UpdatedDate,
    DomainAge,
    DomainAgeDays,
    DomainStatus,
    NameServers,
    Dnssec,
    Registrant,
    Country,
    ARecordCount,
    AvgTtl,
    MinTtl,
    MaxTtl,
    CertIssuer,
    CertValidFrom,
    CertValidTo,
    DaysUntilExpiry,
    ValidityPeriod,
}

impl Feature {
    /// Wire name of the feature, as consumed by the classifier and reports.
    pub fn name(&self) -> &'static str {
        spec(*self).name
    }

    pub fn spec(&self) -> &'static FeatureSpec {
        spec(*self)
    }

    /// Look a feature up by its wire name.
    pub fn from_name(name: &str) -> Option<Feature> {
        CATALOG.iter().find(|s| s.name == name).map(|s| s.feature)
    }

    /// Required features in classifier order.
    pub fn required() -> impl Iterator<Item = Feature> {
        CATALOG.iter().filter(|s| s.required).map(|s| s.feature)
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for Feature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// Kind of value a feature holds; determines its sentinel default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Int,
    Float,
    Text,
    List,
}

/// A single feature value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<String>),
}

impl FeatureValue {
    /// Sentinel default for a value kind: `0`, `0.0`, `""` or `[]`.
    pub fn default_for(kind: ValueKind) -> Self {
        match kind {
            ValueKind::Int => FeatureValue::Int(0),
            ValueKind::Float => FeatureValue::Float(0.0),
            ValueKind::Text => FeatureValue::Text(String::new()),
            ValueKind::List => FeatureValue::List(Vec::new()),
        }
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            FeatureValue::Int(_) => ValueKind::Int,
            FeatureValue::Float(_) => ValueKind::Float,
            FeatureValue::Text(_) => ValueKind::Text,
            FeatureValue::List(_) => ValueKind::List,
        }
    }

    /// Numeric view; text and lists have none.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FeatureValue::Int(v) => Some(*v as f64),
            FeatureValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FeatureValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FeatureValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureValue::Int(v) => write!(f, "{v}"),
            FeatureValue::Float(v) => write!(f, "{v:.3}"),
            FeatureValue::Text(s) => f.write_str(s),
            FeatureValue::List(items) => f.write_str(&items.join(", ")),
        }
    }
}

impl From<i64> for FeatureValue {
    fn from(v: i64) -> Self {
        FeatureValue::Int(v)
    }
}

impl From<usize> for FeatureValue {
    fn from(v: usize) -> Self {
        FeatureValue::Int(i64::try_from(v).unwrap_or(i64::MAX))
    }
}

impl From<bool> for FeatureValue {
    fn from(v: bool) -> Self {
        FeatureValue::Int(i64::from(v))
    }
}

impl From<f64> for FeatureValue {
    fn from(v: f64) -> Self {
        FeatureValue::Float(v)
    }
}

impl From<String> for FeatureValue {
    fn from(v: String) -> Self {
        FeatureValue::Text(v)
    }
}

impl From<&str> for FeatureValue {
    fn from(v: &str) -> Self {
        FeatureValue::Text(v.to_string())
    }
}

impl From<Vec<String>> for FeatureValue {
    fn from(v: Vec<String>) -> Self {
        FeatureValue::List(v)
    }
}
