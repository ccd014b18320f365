//! Static HTML content features.
//!
//! One GET, no script execution. A fetch failure is reported as a
//! successful outcome with `IsUnreachable=1` and zeroed content metrics,
//! because being unreachable is itself a signal.

use super::url_structure::UrlStructure;
use super::{FeatureSource, SourceError};
use crate::acquisition::HttpClient;
use crate::pipeline::ScanContext;
use crate::schema::{Feature, FeaturePartial, Source};
use crate::urlparts::{href_authority, normalize_authority};
use async_trait::async_trait;
use scraper::{Html, Selector};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

const BANKING_KEYWORDS: &[&str] = &["bank", "banking", "financial"];
const PAYMENT_KEYWORDS: &[&str] = &["payment", "paypal", "credit card", "checkout"];
const CRYPTO_KEYWORDS: &[&str] = &["crypto", "cryptocurrency", "bitcoin", "ethereum", "blockchain"];
const COPYRIGHT_KEYWORDS: &[&str] = &["copyright", "©"];

/// Keyword-category hits in the decoded document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct KeywordFlags {
    pub banking: bool,
    pub payment: bool,
    pub crypto: bool,
    pub copyright: bool,
}

impl KeywordFlags {
    /// Scan entity-decoded, lower-cased HTML.
    pub fn scan(html: &str) -> Self {
        let text = html_escape::decode_html_entities(html).to_lowercase();
        let any = |words: &[&str]| words.iter().any(|w| text.contains(w));
        Self {
            banking: any(BANKING_KEYWORDS),
            payment: any(PAYMENT_KEYWORDS),
            crypto: any(CRYPTO_KEYWORDS),
            copyright: any(COPYRIGHT_KEYWORDS),
        }
    }

    /// Number of categories present (0-4).
    pub fn unique_count(&self) -> usize {
        [self.banking, self.payment, self.crypto, self.copyright]
            .iter()
            .filter(|&&b| b)
            .count()
    }
}

/// Anchor classification counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AnchorCounts {
    pub self_refs: usize,
    pub empty_refs: usize,
    pub external_refs: usize,
    pub popups: usize,
}

/// Metrics computed from a fetched document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContentMetrics {
    pub line_count: usize,
    pub longest_line: usize,
    pub has_title: bool,
    pub has_favicon: bool,
    pub has_description: bool,
    pub has_robots_blocked: bool,
    pub images: usize,
    pub stylesheets: usize,
    pub scripts: usize,
    pub iframes: usize,
    pub anchors: AnchorCounts,
    pub keywords: KeywordFlags,
}

/// Everything the static source observed for one URL.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StaticReport {
    pub structure: UrlStructure,
    pub unreachable: bool,
    pub content: ContentMetrics,
}

impl StaticReport {
    pub fn unreachable(structure: UrlStructure) -> Self {
        Self {
            structure,
            unreachable: true,
            content: ContentMetrics::default(),
        }
    }

    /// Features owned by the static source. URL-structure values stay in the
    /// report; the URL source owns them in the merged record.
    pub fn into_partial(self) -> FeaturePartial {
        let c = &self.content;
        let mut partial = FeaturePartial::new(Source::StaticContent);
        partial
            .set(Feature::IsUnreachable, self.unreachable)
            .set(Feature::LineOfCode, c.line_count)
            .set(Feature::LongestLineLength, c.longest_line)
            .set(Feature::HasTitle, c.has_title)
            .set(Feature::HasFavicon, c.has_favicon)
            .set(Feature::HasDescription, c.has_description)
            .set(Feature::HasRobotsBlocked, c.has_robots_blocked)
            .set(Feature::CntImages, c.images)
            .set(Feature::CntFilesCss, c.stylesheets)
            .set(Feature::CntFilesJs, c.scripts)
            .set(Feature::CntIFrame, c.iframes)
            .set(Feature::CntSelfHRef, c.anchors.self_refs)
            .set(Feature::CntEmptyRef, c.anchors.empty_refs)
            .set(Feature::CntExternalRef, c.anchors.external_refs)
            .set(Feature::CntPopup, c.anchors.popups)
            .set(Feature::HasBankingKey, c.keywords.banking)
            .set(Feature::HasPaymentKey, c.keywords.payment)
            .set(Feature::HasCryptoKey, c.keywords.crypto)
            .set(Feature::HasCopyrightInfoKey, c.keywords.copyright)
            .set(Feature::UniqueFeatureCnt, c.keywords.unique_count());
        partial
    }
}

/// Line count and longest line (in characters) of a raw body.
///
/// Breaks on `\n`, `\r\n`, lone `\r` and the other Unicode line separators;
/// a trailing separator does not start an extra empty line.
pub fn line_metrics(body: &str) -> (usize, usize) {
    let mut count = 0;
    let mut longest = 0;
    let mut current = 0;
    let mut open = false;
    let mut chars = body.chars().peekable();

    while let Some(ch) = chars.next() {
        let is_break = matches!(
            ch,
            '\n' | '\r' | '\x0b' | '\x0c' | '\x1c' | '\x1d' | '\x1e' | '\u{85}' | '\u{2028}' | '\u{2029}'
        );
        if is_break {
            if ch == '\r' && chars.peek() == Some(&'\n') {
                chars.next();
            }
            count += 1;
            longest = longest.max(current);
            current = 0;
            open = false;
        } else {
            current += 1;
            open = true;
        }
    }
    if open {
        count += 1;
        longest = longest.max(current);
    }
    (count, longest)
}

fn count(doc: &Html, css: &str) -> usize {
    match Selector::parse(css) {
        Ok(sel) => doc.select(&sel).count(),
        Err(_) => 0,
    }
}

fn rel_contains(doc: &Html, needle: &str) -> usize {
    let Ok(sel) = Selector::parse("link[rel]") else {
        return 0;
    };
    doc.select(&sel)
        .filter(|el| {
            el.value()
                .attr("rel")
                .is_some_and(|rel| rel.to_ascii_lowercase().contains(needle))
        })
        .count()
}

fn meta_named<'a>(doc: &'a Html, name: &str) -> Option<scraper::ElementRef<'a>> {
    let sel = Selector::parse("meta[name]").ok()?;
    doc.select(&sel).find(|el| {
        el.value()
            .attr("name")
            .is_some_and(|n| n.trim().eq_ignore_ascii_case(name))
    })
}

/// Classify every anchor that has an `href`.
///
/// `page_site` is the page's authority, lower-cased with `www.` stripped.
pub fn classify_anchors(doc: &Html, page_site: &str) -> AnchorCounts {
    let mut counts = AnchorCounts::default();
    let Ok(sel) = Selector::parse("a[href]") else {
        return counts;
    };

    for a in doc.select(&sel) {
        let href = a.value().attr("href").unwrap_or("").trim();
        if href.is_empty() || href == "#" {
            counts.empty_refs += 1;
            continue;
        }

        match href_authority(href) {
            None => counts.self_refs += 1,
            Some(auth) if normalize_authority(&auth) == page_site => counts.self_refs += 1,
            Some(_) => counts.external_refs += 1,
        }

        let new_context = a
            .value()
            .attr("target")
            .is_some_and(|t| t.trim().eq_ignore_ascii_case("_blank"));
        let opens_window = a
            .value()
            .attr("onclick")
            .is_some_and(|js| js.contains("window.open"));
        if new_context && opens_window {
            counts.popups += 1;
        }
    }
    counts
}

/// Compute every content metric for a fetched body.
pub fn analyze_html(body: &str, page_site: &str) -> ContentMetrics {
    let (line_count, longest_line) = line_metrics(body);
    let doc = Html::parse_document(body);

    let has_robots_blocked = meta_named(&doc, "robots")
        .and_then(|m| m.value().attr("content"))
        .is_some_and(|c| c.to_ascii_lowercase().contains("noindex"));

    ContentMetrics {
        line_count,
        longest_line,
        has_title: count(&doc, "title") > 0,
        has_favicon: rel_contains(&doc, "icon") > 0,
        has_description: meta_named(&doc, "description").is_some(),
        has_robots_blocked,
        images: count(&doc, "img"),
        stylesheets: rel_contains(&doc, "stylesheet"),
        scripts: count(&doc, "script[src]"),
        iframes: count(&doc, "iframe"),
        anchors: classify_anchors(&doc, page_site),
        keywords: KeywordFlags::scan(body),
    }
}

/// Static HTML source.
pub struct StaticContentSource {
    client: HttpClient,
    timeout: Duration,
}

impl StaticContentSource {
    pub fn new(client: HttpClient, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    /// Fetch and analyze a URL; never fails.
    pub async fn report(&self, ctx: &ScanContext) -> StaticReport {
        let structure = UrlStructure::of(&ctx.url, &ctx.parts);
        match self
            .client
            .get(&ctx.url, self.timeout.as_millis() as u64)
            .await
        {
            Ok(resp) => {
                debug!(
                    "fetched {} ({} bytes, status {})",
                    resp.final_url,
                    resp.body.len(),
                    resp.status
                );
                StaticReport {
                    structure,
                    unreachable: false,
                    content: analyze_html(&resp.body, &ctx.parts.site()),
                }
            }
            Err(e) => {
                warn!("{} unreachable: {e:#}", ctx.url);
                StaticReport::unreachable(structure)
            }
        }
    }
}

#[async_trait]
impl FeatureSource for StaticContentSource {
    fn source(&self) -> Source {
        Source::StaticContent
    }

    fn timeout(&self) -> Duration {
        // body parsing happens after the request timeout
        self.timeout + Duration::from_secs(5)
    }

    async fn collect(&self, ctx: &ScanContext) -> Result<FeaturePartial, SourceError> {
        Ok(self.report(ctx).await.into_partial())
    }
}
