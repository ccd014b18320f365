//! Shared URL splitting.
//!
//! Every source splits the input URL through [`UrlParts`] so that scheme,
//! authority, path, query and fragment are derived with one set of rules.
//! The splitter is deliberately lenient: it never rejects input and never
//! normalizes the path, because path and length features are computed on
//! the raw text.

use serde::Serialize;

/// The five generic components of a URL, split without normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UrlParts {
    pub scheme: String,
    pub authority: String,
    pub path: String,
    pub query: String,
    pub fragment: String,
}

impl UrlParts {
    /// Split `url` into `scheme://authority/path?query#fragment`.
    ///
    /// Input without `//` after the scheme has an empty authority and the
    /// remainder is treated as a path, so `example.com/login` yields
    /// path `example.com/login`.
    pub fn parse(url: &str) -> Self {
        let url = url.trim();
        let (scheme, rest) = split_scheme(url);

        let (authority, rest) = match rest.strip_prefix("//") {
            Some(after) => {
                let end = after.find(['/', '?', '#']).unwrap_or(after.len());
                (&after[..end], &after[end..])
            }
            None => ("", rest),
        };

        let (rest, fragment) = match rest.split_once('#') {
            Some((before, frag)) => (before, frag),
            None => (rest, ""),
        };
        let (path, query) = match rest.split_once('?') {
            Some((before, q)) => (before, q),
            None => (rest, ""),
        };

        Self {
            scheme: scheme.to_ascii_lowercase(),
            authority: authority.to_string(),
            path: path.to_string(),
            query: query.to_string(),
            fragment: fragment.to_string(),
        }
    }

    /// Host portion of the authority: userinfo and port removed, lower-cased.
    pub fn host(&self) -> String {
        host_of(&self.authority)
    }

    pub fn has_path(&self) -> bool {
        !self.path.is_empty() && self.path != "/"
    }

    pub fn has_query(&self) -> bool {
        !self.query.is_empty()
    }

    pub fn has_fragment(&self) -> bool {
        !self.fragment.is_empty()
    }

    /// Authority used for same-site comparisons.
    pub fn site(&self) -> String {
        normalize_authority(&self.authority)
    }
}

fn split_scheme(url: &str) -> (&str, &str) {
    let Some(colon) = url.find(':') else {
        return ("", url);
    };
    let candidate = &url[..colon];
    let valid = candidate
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic())
        && candidate
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    if valid {
        (candidate, &url[colon + 1..])
    } else {
        ("", url)
    }
}

/// Strip userinfo and port from an authority and lower-case the host.
pub fn host_of(authority: &str) -> String {
    let hostport = authority.rsplit_once('@').map_or(authority, |(_, h)| h);
    let host = if let Some(inner) = hostport.strip_prefix('[') {
        // IPv6 literal
        inner.split(']').next().unwrap_or(inner)
    } else {
        hostport.split(':').next().unwrap_or(hostport)
    };
    host.trim_end_matches('.').to_ascii_lowercase()
}

/// Lower-case an authority and drop a leading `www.`.
pub fn normalize_authority(authority: &str) -> String {
    let lower = authority.trim().to_ascii_lowercase();
    match lower.strip_prefix("www.") {
        Some(rest) => rest.to_string(),
        None => lower,
    }
}

/// Authority of an `href`, or `None` when the reference has no network
/// location (relative paths, `mailto:`, `javascript:` and the like).
pub fn href_authority(href: &str) -> Option<String> {
    let parts = UrlParts::parse(href);
    if parts.authority.is_empty() {
        None
    } else {
        Some(parts.authority)
    }
}

/// Resolve `href` against `base` the way a browser would.
pub fn resolve(base: &str, href: &str) -> Option<String> {
    let base = url::Url::parse(base).ok()?;
    base.join(href.trim()).ok().map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_full_url() {
        let parts = UrlParts::parse("https://example.com/path/page?id=1234&param=test#section");
        assert_eq!(parts.scheme, "https");
        assert_eq!(parts.authority, "example.com");
        assert_eq!(parts.path, "/path/page");
        assert_eq!(parts.query, "id=1234&param=test");
        assert_eq!(parts.fragment, "section");
        assert!(parts.has_path());
        assert!(parts.has_query());
        assert!(parts.has_fragment());
    }

    #[test]
    fn test_split_without_scheme() {
        let parts = UrlParts::parse("example.com/login");
        assert_eq!(parts.scheme, "");
        assert_eq!(parts.authority, "");
        assert_eq!(parts.path, "example.com/login");
    }

    #[test]
    fn test_root_path_is_not_a_path() {
        assert!(!UrlParts::parse("https://example.com/").has_path());
        assert!(!UrlParts::parse("https://example.com").has_path());
        assert!(!UrlParts::parse("https://example.com/?").has_query());
    }

    #[test]
    fn test_host_strips_userinfo_and_port() {
        assert_eq!(host_of("user:pw@Example.COM:8443"), "example.com");
        assert_eq!(host_of("[::1]:8080"), "::1");
        assert_eq!(host_of("101.200.220.118:8090"), "101.200.220.118");
    }

    #[test]
    fn test_href_authority() {
        assert_eq!(href_authority("/about"), None);
        assert_eq!(href_authority("mailto:a@b.com"), None);
        assert_eq!(href_authority("javascript:void(0)"), None);
        assert_eq!(
            href_authority("//cdn.example.net/x.js").as_deref(),
            Some("cdn.example.net")
        );
        assert_eq!(
            href_authority("https://other.org/page").as_deref(),
            Some("other.org")
        );
    }

    #[test]
    fn test_normalize_authority() {
        assert_eq!(normalize_authority("WWW.Example.com"), "example.com");
        assert_eq!(normalize_authority("shop.example.com"), "shop.example.com");
    }

    #[test]
    fn test_resolve_relative() {
        assert_eq!(
            resolve("https://example.com/a/b", "../login").as_deref(),
            Some("https://example.com/login")
        );
        assert_eq!(resolve("not a url", "/x"), None);
    }
}
