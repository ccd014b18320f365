//! Encoded-payload pattern counts.

use regex::Regex;
use std::sync::LazyLock;

static HEX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[0-9A-Fa-f]{6,}\b").expect("hex regex is valid"));
static BASE64_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z0-9+/]{8,}(?:==|=)?").expect("base64 regex is valid"));

/// Non-overlapping runs of six or more hex digits bounded by word breaks.
pub fn count_hex_patterns(url: &str) -> usize {
    HEX_RE.find_iter(url).count()
}

/// Non-overlapping runs of eight or more Base64 alphabet characters,
/// optionally followed by `=` or `==` padding.
pub fn count_base64_patterns(url: &str) -> usize {
    BASE64_RE.find_iter(url).count()
}
