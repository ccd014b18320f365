//! The static feature catalog.
//!
//! One row per [`Feature`], in declaration order. The table is the source of
//! truth for wire names, reporting categories, owning sources, whether the
//! classifier requires the feature, and the kind of sentinel default used
//! when the owning source fails.

use super::{Category, Feature, Source, ValueKind};

/// Static description of one feature.
#[derive(Debug, Clone, Copy)]
pub struct FeatureSpec {
    pub feature: Feature,
    pub name: &'static str,
    pub kind: ValueKind,
    pub category: Category,
    pub source: Source,
    pub required: bool,
    pub definition: &'static str,
}

/// Look up the catalog row of a feature.
pub fn spec(feature: Feature) -> &'static FeatureSpec {
    &CATALOG[feature as usize]
}

pub static CATALOG: &[FeatureSpec] = &[
    FeatureSpec {
        feature: Feature::LengthOfUrl,
        name: "LengthOfURL",
        kind: ValueKind::Int,
        category: Category::DomainUrl,
        source: Source::Url,
        required: true,
        definition: "Length of the URL in characters.",
    },
    FeatureSpec {
        feature: Feature::UrlComplexity,
        name: "URLComplexity",
        kind: ValueKind::Float,
        category: Category::DomainUrl,
        source: Source::Derived,
        required: true,
        definition: "Distinct characters divided by URL length.",
    },
    FeatureSpec {
        feature: Feature::CharacterComplexity,
        name: "CharacterComplexity",
        kind: ValueKind::Float,
        category: Category::DomainUrl,
        source: Source::Derived,
        required: true,
        definition: "Mean absolute difference between consecutive character code points.",
    },
    FeatureSpec {
        feature: Feature::DomainLengthOfUrl,
        name: "DomainLengthOfURL",
        kind: ValueKind::Int,
        category: Category::DomainUrl,
        source: Source::Domain,
        required: true,
        definition: "Length of the registrable domain.",
    },
    FeatureSpec {
        feature: Feature::IsDomainIp,
        name: "IsDomainIP",
        kind: ValueKind::Int,
        category: Category::DomainUrl,
        source: Source::Domain,
        required: true,
        definition: "1 if the domain is an IP address.",
    },
    FeatureSpec {
        feature: Feature::Tld,
        name: "TLD",
        kind: ValueKind::Text,
        category: Category::DomainUrl,
        source: Source::Domain,
        required: true,
        definition: "Public suffix of the domain.",
    },
    FeatureSpec {
        feature: Feature::TldLength,
        name: "TLDLength",
        kind: ValueKind::Int,
        category: Category::DomainUrl,
        source: Source::Domain,
        required: true,
        definition: "Length of the public suffix.",
    },
    FeatureSpec {
        feature: Feature::LetterCntInUrl,
        name: "LetterCntInURL",
        kind: ValueKind::Int,
        category: Category::DomainUrl,
        source: Source::Derived,
        required: true,
        definition: "Count of letters in the URL.",
    },
    FeatureSpec {
        feature: Feature::UrlLetterRatio,
        name: "URLLetterRatio",
        kind: ValueKind::Float,
        category: Category::DomainUrl,
        source: Source::Derived,
        required: true,
        definition: "Letters divided by URL length.",
    },
    FeatureSpec {
        feature: Feature::DigitCntInUrl,
        name: "DigitCntInURL",
        kind: ValueKind::Int,
        category: Category::DomainUrl,
        source: Source::Derived,
        required: true,
        definition: "Count of digits in the URL.",
    },
    FeatureSpec {
        feature: Feature::UrlDigitRatio,
        name: "URLDigitRatio",
        kind: ValueKind::Float,
        category: Category::DomainUrl,
        source: Source::Derived,
        required: true,
        definition: "Digits divided by URL length.",
    },
    FeatureSpec {
        feature: Feature::EqualCharCntInUrl,
        name: "EqualCharCntInURL",
        kind: ValueKind::Int,
        category: Category::DomainUrl,
        source: Source::Derived,
        required: true,
        definition: "Count of '=' characters in the URL.",
    },
    FeatureSpec {
        feature: Feature::QuesMarkCntInUrl,
        name: "QuesMarkCntInURL",
        kind: ValueKind::Int,
        category: Category::DomainUrl,
        source: Source::Derived,
        required: true,
        definition: "Count of '?' characters in the URL.",
    },
    FeatureSpec {
        feature: Feature::AmpCharCntInUrl,
        name: "AmpCharCntInURL",
        kind: ValueKind::Int,
        category: Category::DomainUrl,
        source: Source::Derived,
        required: true,
        definition: "Count of '&' characters in the URL.",
    },
    FeatureSpec {
        feature: Feature::OtherSpclCharCntInUrl,
        name: "OtherSpclCharCntInURL",
        kind: ValueKind::Int,
        category: Category::DomainUrl,
        source: Source::Derived,
        required: true,
        definition: "Count of other non-alphanumeric characters.",
    },
    FeatureSpec {
        feature: Feature::UrlOtherSpclCharRatio,
        name: "URLOtherSpclCharRatio",
        kind: ValueKind::Float,
        category: Category::DomainUrl,
        source: Source::Derived,
        required: true,
        definition: "Other special characters divided by URL length.",
    },
    FeatureSpec {
        feature: Feature::NumberOfHashtags,
        name: "NumberOfHashtags",
        kind: ValueKind::Int,
        category: Category::DomainUrl,
        source: Source::Derived,
        required: true,
        definition: "Count of '#' characters in the URL.",
    },
    FeatureSpec {
        feature: Feature::NumberOfSubdomains,
        name: "NumberOfSubdomains",
        kind: ValueKind::Int,
        category: Category::DomainUrl,
        source: Source::Domain,
        required: true,
        definition: "Number of subdomain labels.",
    },
    FeatureSpec {
        feature: Feature::HavingPath,
        name: "HavingPath",
        kind: ValueKind::Int,
        category: Category::DomainUrl,
        source: Source::Url,
        required: true,
        definition: "1 if the URL has a path other than '/'.",
    },
    FeatureSpec {
        feature: Feature::PathLength,
        name: "PathLength",
        kind: ValueKind::Int,
        category: Category::DomainUrl,
        source: Source::Url,
        required: true,
        definition: "Length of the URL path.",
    },
    FeatureSpec {
        feature: Feature::HavingQuery,
        name: "HavingQuery",
        kind: ValueKind::Int,
        category: Category::DomainUrl,
        source: Source::Url,
        required: true,
        definition: "1 if the URL has a query string.",
    },
    FeatureSpec {
        feature: Feature::HavingFragment,
        name: "HavingFragment",
        kind: ValueKind::Int,
        category: Category::DomainUrl,
        source: Source::Url,
        required: true,
        definition: "1 if the URL has a fragment.",
    },
    FeatureSpec {
        feature: Feature::HavingAnchor,
        name: "HavingAnchor",
        kind: ValueKind::Int,
        category: Category::DomainUrl,
        source: Source::Url,
        required: true,
        definition: "1 if the URL has an anchor (same as fragment).",
    },
    FeatureSpec {
        feature: Feature::HasSsl,
        name: "HasSSL",
        kind: ValueKind::Int,
        category: Category::Ssl,
        source: Source::Tls,
        required: true,
        definition: "1 if a verified TLS certificate was served on port 443.",
    },
    FeatureSpec {
        feature: Feature::IsUnreachable,
        name: "IsUnreachable",
        kind: ValueKind::Int,
        category: Category::ContentStatic,
        source: Source::StaticContent,
        required: true,
        definition: "1 if the page could not be fetched.",
    },
    FeatureSpec {
        feature: Feature::LineOfCode,
        name: "LineOfCode",
        kind: ValueKind::Int,
        category: Category::ContentStatic,
        source: Source::StaticContent,
        required: true,
        definition: "Number of lines in the HTML source.",
    },
    FeatureSpec {
        feature: Feature::LongestLineLength,
        name: "LongestLineLength",
        kind: ValueKind::Int,
        category: Category::ContentStatic,
        source: Source::StaticContent,
        required: true,
        definition: "Length of the longest HTML source line.",
    },
    FeatureSpec {
        feature: Feature::HasTitle,
        name: "HasTitle",
        kind: ValueKind::Int,
        category: Category::ContentStatic,
        source: Source::StaticContent,
        required: true,
        definition: "1 if a title tag is present.",
    },
    FeatureSpec {
        feature: Feature::HasFavicon,
        name: "HasFavicon",
        kind: ValueKind::Int,
        category: Category::ContentStatic,
        source: Source::StaticContent,
        required: true,
        definition: "1 if a favicon link is present.",
    },
    FeatureSpec {
        feature: Feature::HasRobotsBlocked,
        name: "HasRobotsBlocked",
        kind: ValueKind::Int,
        category: Category::ContentStatic,
        source: Source::StaticContent,
        required: true,
        definition: "1 if a robots meta tag contains noindex.",
    },
    FeatureSpec {
        feature: Feature::IsResponsive,
        name: "IsResponsive",
        kind: ValueKind::Int,
        category: Category::ContentDynamic,
        source: Source::DynamicContent,
        required: true,
        definition: "1 if the rendered page has a viewport meta tag.",
    },
    FeatureSpec {
        feature: Feature::IsUrlRedirects,
        name: "IsURLRedirects",
        kind: ValueKind::Int,
        category: Category::ContentDynamic,
        source: Source::DynamicContent,
        required: true,
        definition: "1 if the final URL differs from the requested URL.",
    },
    FeatureSpec {
        feature: Feature::IsSelfRedirects,
        name: "IsSelfRedirects",
        kind: ValueKind::Int,
        category: Category::ContentDynamic,
        source: Source::DynamicContent,
        required: true,
        definition: "1 if redirected within the same site to another path.",
    },
    FeatureSpec {
        feature: Feature::HasDescription,
        name: "HasDescription",
        kind: ValueKind::Int,
        category: Category::ContentStatic,
        source: Source::StaticContent,
        required: true,
        definition: "1 if a meta description is present.",
    },
    FeatureSpec {
        feature: Feature::HasPopup,
        name: "HasPopup",
        kind: ValueKind::Int,
        category: Category::ContentDynamic,
        source: Source::DynamicContent,
        required: true,
        definition: "1 if more than one window was open after load.",
    },
    FeatureSpec {
        feature: Feature::HasIFrame,
        name: "HasIFrame",
        kind: ValueKind::Int,
        category: Category::ContentDynamic,
        source: Source::DynamicContent,
        required: true,
        definition: "1 if the rendered page contains an iframe.",
    },
    FeatureSpec {
        feature: Feature::IsFormSubmitExternal,
        name: "IsFormSubmitExternal",
        kind: ValueKind::Int,
        category: Category::ContentDynamic,
        source: Source::DynamicContent,
        required: true,
        definition: "1 if a form submits to another site.",
    },
    FeatureSpec {
        feature: Feature::HasSocialMediaPage,
        name: "HasSocialMediaPage",
        kind: ValueKind::Int,
        category: Category::ContentDynamic,
        source: Source::DynamicContent,
        required: true,
        definition: "1 if the page links to a social platform.",
    },
    FeatureSpec {
        feature: Feature::HasSubmitButton,
        name: "HasSubmitButton",
        kind: ValueKind::Int,
        category: Category::ContentDynamic,
        source: Source::DynamicContent,
        required: true,
        definition: "1 if a submit button is present.",
    },
    FeatureSpec {
        feature: Feature::HasHiddenFields,
        name: "HasHiddenFields",
        kind: ValueKind::Int,
        category: Category::ContentDynamic,
        source: Source::DynamicContent,
        required: true,
        definition: "1 if hidden inputs are present.",
    },
    FeatureSpec {
        feature: Feature::HasPasswordFields,
        name: "HasPasswordFields",
        kind: ValueKind::Int,
        category: Category::ContentDynamic,
        source: Source::DynamicContent,
        required: true,
        definition: "1 if password inputs are present.",
    },
    FeatureSpec {
        feature: Feature::HasBankingKey,
        name: "HasBankingKey",
        kind: ValueKind::Int,
        category: Category::ContentStatic,
        source: Source::StaticContent,
        required: true,
        definition: "1 if banking keywords appear in the page.",
    },
    FeatureSpec {
        feature: Feature::HasPaymentKey,
        name: "HasPaymentKey",
        kind: ValueKind::Int,
        category: Category::ContentStatic,
        source: Source::StaticContent,
        required: true,
        definition: "1 if payment keywords appear in the page.",
    },
    FeatureSpec {
        feature: Feature::HasCryptoKey,
        name: "HasCryptoKey",
        kind: ValueKind::Int,
        category: Category::ContentStatic,
        source: Source::StaticContent,
        required: true,
        definition: "1 if cryptocurrency keywords appear in the page.",
    },
    FeatureSpec {
        feature: Feature::HasCopyrightInfoKey,
        name: "HasCopyrightInfoKey",
        kind: ValueKind::Int,
        category: Category::ContentStatic,
        source: Source::StaticContent,
        required: true,
        definition: "1 if copyright information appears in the page.",
    },
    FeatureSpec {
        feature: Feature::CntImages,
        name: "CntImages",
        kind: ValueKind::Int,
        category: Category::ContentStatic,
        source: Source::StaticContent,
        required: true,
        definition: "Count of img elements.",
    },
    FeatureSpec {
        feature: Feature::CntFilesCss,
        name: "CntFilesCSS",
        kind: ValueKind::Int,
        category: Category::ContentStatic,
        source: Source::StaticContent,
        required: true,
        definition: "Count of linked stylesheets.",
    },
    FeatureSpec {
        feature: Feature::CntFilesJs,
        name: "CntFilesJS",
        kind: ValueKind::Int,
        category: Category::ContentStatic,
        source: Source::StaticContent,
        required: true,
        definition: "Count of external scripts.",
    },
    FeatureSpec {
        feature: Feature::CntSelfHRef,
        name: "CntSelfHRef",
        kind: ValueKind::Int,
        category: Category::ContentStatic,
        source: Source::StaticContent,
        required: true,
        definition: "Count of anchors pointing at the same site.",
    },
    FeatureSpec {
        feature: Feature::CntEmptyRef,
        name: "CntEmptyRef",
        kind: ValueKind::Int,
        category: Category::ContentStatic,
        source: Source::StaticContent,
        required: true,
        definition: "Count of anchors with an empty or '#' href.",
    },
    FeatureSpec {
        feature: Feature::CntExternalRef,
        name: "CntExternalRef",
        kind: ValueKind::Int,
        category: Category::ContentStatic,
        source: Source::StaticContent,
        required: true,
        definition: "Count of anchors pointing at another site.",
    },
    FeatureSpec {
        feature: Feature::CntPopup,
        name: "CntPopup",
        kind: ValueKind::Int,
        category: Category::ContentStatic,
        source: Source::StaticContent,
        required: true,
        definition: "Count of anchors that open a popup window.",
    },
    FeatureSpec {
        feature: Feature::CntIFrame,
        name: "CntIFrame",
        kind: ValueKind::Int,
        category: Category::ContentStatic,
        source: Source::StaticContent,
        required: true,
        definition: "Count of iframe elements.",
    },
    FeatureSpec {
        feature: Feature::UniqueFeatureCnt,
        name: "UniqueFeatureCnt",
        kind: ValueKind::Int,
        category: Category::ContentStatic,
        source: Source::StaticContent,
        required: true,
        definition: "Number of keyword groups present (0-4).",
    },
    FeatureSpec {
        feature: Feature::ShannonEntropy,
        name: "ShannonEntropy",
        kind: ValueKind::Float,
        category: Category::Advanced,
        source: Source::Derived,
        required: true,
        definition: "Shannon entropy of the URL characters.",
    },
    FeatureSpec {
        feature: Feature::FractalDimension,
        name: "FractalDimension",
        kind: ValueKind::Float,
        category: Category::Advanced,
        source: Source::Derived,
        required: true,
        definition: "Higuchi fractal dimension of the URL code points.",
    },
    FeatureSpec {
        feature: Feature::KolmogorovComplexity,
        name: "KolmogorovComplexity",
        kind: ValueKind::Float,
        category: Category::Advanced,
        source: Source::Derived,
        required: true,
        definition: "Compressed size divided by original size.",
    },
    FeatureSpec {
        feature: Feature::HexPatternCnt,
        name: "HexPatternCnt",
        kind: ValueKind::Int,
        category: Category::Advanced,
        source: Source::Derived,
        required: true,
        definition: "Count of hexadecimal tokens of six or more digits.",
    },
    FeatureSpec {
        feature: Feature::Base64PatternCnt,
        name: "Base64PatternCnt",
        kind: ValueKind::Int,
        category: Category::Advanced,
        source: Source::Derived,
        required: true,
        definition: "Count of Base64-like substrings.",
    },
    FeatureSpec {
        feature: Feature::Url,
        name: "URL",
        kind: ValueKind::Text,
        category: Category::DomainUrl,
        source: Source::Url,
        required: false,
        definition: "The full URL string.",
    },
    FeatureSpec {
        feature: Feature::Domain,
        name: "Domain",
        kind: ValueKind::Text,
        category: Category::DomainUrl,
        source: Source::Domain,
        required: false,
        definition: "Registrable domain extracted from the URL.",
    },
    FeatureSpec {
        feature: Feature::IpAddresses,
        name: "IPAddresses",
        kind: ValueKind::List,
        category: Category::DomainUrl,
        source: Source::Domain,
        required: false,
        definition: "Unique addresses the domain resolves to.",
    },
    FeatureSpec {
        feature: Feature::Registrar,
        name: "Registrar",
        kind: ValueKind::Text,
        category: Category::DomainUrl,
        source: Source::Domain,
        required: false,
        definition: "Registrar from the WHOIS record.",
    },
    FeatureSpec {
        feature: Feature::CreationDate,
        name: "CreationDate",
        kind: ValueKind::Text,
        category: Category::DomainUrl,
        source: Source::Domain,
        required: false,
        definition: "Domain creation timestamp.",
    },
    FeatureSpec {
        feature: Feature::ExpirationDate,
        name: "ExpirationDate",
        kind: ValueKind::Text,
        category: Category::DomainUrl,
        source: Source::Domain,
        required: false,
        definition: "Domain expiry timestamp.",
    },
    FeatureSpec {
        feature: Feature::UpdatedDate,
        name: "UpdatedDate",
        kind: ValueKind::Text,
        category: Category::DomainUrl,
        source: Source::Domain,
        required: false,
        definition: "Last WHOIS update timestamp.",
    },
    FeatureSpec {
        feature: Feature::DomainAge,
        name: "DomainAge",
        kind: ValueKind::Text,
        category: Category::DomainUrl,
        source: Source::Domain,
        required: false,
        definition: "Domain age as years, months and days (365/30-day approximation).",
    },
    FeatureSpec {
        feature: Feature::DomainAgeDays,
        name: "DomainAgeDays",
        kind: ValueKind::Int,
        category: Category::DomainUrl,
        source: Source::Domain,
        required: false,
        definition: "Domain age in days.",
    },
    FeatureSpec {
        feature: Feature::DomainStatus,
        name: "DomainStatus",
        kind: ValueKind::List,
        category: Category::DomainUrl,
        source: Source::Domain,
        required: false,
        definition: "WHOIS status codes.",
    },
    FeatureSpec {
        feature: Feature::NameServers,
        name: "NameServers",
        kind: ValueKind::List,
        category: Category::DomainUrl,
        source: Source::Domain,
        required: false,
        definition: "Authoritative name servers.",
    },
    FeatureSpec {
        feature: Feature::Dnssec,
        name: "DNSSEC",
        kind: ValueKind::Text,
        category: Category::DomainUrl,
        source: Source::Domain,
        required: false,
        definition: "DNSSEC status from the WHOIS record.",
    },
    FeatureSpec {
        feature: Feature::Registrant,
        name: "Registrant",
        kind: ValueKind::Text,
        category: Category::DomainUrl,
        source: Source::Domain,
        required: false,
        definition: "Registrant organization.",
    },
    FeatureSpec {
        feature: Feature::Country,
        name: "Country",
        kind: ValueKind::Text,
        category: Category::DomainUrl,
        source: Source::Domain,
        required: false,
        definition: "Registrant country.",
    },
    FeatureSpec {
        feature: Feature::ARecordCount,
        name: "ARecordCount",
        kind: ValueKind::Int,
        category: Category::DomainUrl,
        source: Source::Domain,
        required: false,
        definition: "Number of A records from passive DNS.",
    },
    FeatureSpec {
        feature: Feature::AvgTtl,
        name: "AvgTTL",
        kind: ValueKind::Float,
        category: Category::DomainUrl,
        source: Source::Domain,
        required: false,
        definition: "Average A record TTL.",
    },
    FeatureSpec {
        feature: Feature::MinTtl,
        name: "MinTTL",
        kind: ValueKind::Int,
        category: Category::DomainUrl,
        source: Source::Domain,
        required: false,
        definition: "Minimum A record TTL.",
    },
    FeatureSpec {
        feature: Feature::MaxTtl,
        name: "MaxTTL",
        kind: ValueKind::Int,
        category: Category::DomainUrl,
        source: Source::Domain,
        required: false,
        definition: "Maximum A record TTL.",
    },
    FeatureSpec {
        feature: Feature::CertIssuer,
        name: "CertIssuer",
        kind: ValueKind::Text,
        category: Category::Ssl,
        source: Source::Tls,
        required: false,
        definition: "Issuer of the leaf certificate.",
    },
    FeatureSpec {
        feature: Feature::CertValidFrom,
        name: "CertValidFrom",
        kind: ValueKind::Text,
        category: Category::Ssl,
        source: Source::Tls,
        required: false,
        definition: "Certificate notBefore.",
    },
    FeatureSpec {
        feature: Feature::CertValidTo,
        name: "CertValidTo",
        kind: ValueKind::Text,
        category: Category::Ssl,
        source: Source::Tls,
        required: false,
        definition: "Certificate notAfter.",
    },
    FeatureSpec {
        feature: Feature::DaysUntilExpiry,
        name: "DaysUntilExpiry",
        kind: ValueKind::Int,
        category: Category::Ssl,
        source: Source::Tls,
        required: false,
        definition: "Whole days until the certificate expires.",
    },
    FeatureSpec {
        feature: Feature::ValidityPeriod,
        name: "ValidityPeriod",
        kind: ValueKind::Text,
        category: Category::Ssl,
        source: Source::Tls,
        required: false,
        definition: "Remaining validity as years, months and days (365/30-day approximation).",
    },
];
