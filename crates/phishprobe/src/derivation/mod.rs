//! Statistical derivation engine.
//!
//! Pure functions of the URL string: composition counts and ratios,
//! complexity and entropy measures, and encoded-pattern counts. Nothing here
//! touches the network or holds state, so the same URL always yields the
//! same metrics.

pub mod complexity;
pub mod composition;
pub mod patterns;

pub use complexity::{
    character_complexity, higuchi_fractal_dimension, kolmogorov_complexity, shannon_entropy,
    url_complexity,
};
pub use composition::Composition;
pub use patterns::{count_base64_patterns, count_hex_patterns};

use crate::schema::{Feature, FeaturePartial, Source};
use serde::Serialize;

/// Every metric derived from the URL string.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedMetrics {
    pub composition: Composition,
    pub url_complexity: f64,
    pub character_complexity: f64,
    pub shannon_entropy: f64,
    pub kolmogorov_complexity: f64,
    pub fractal_dimension: f64,
    pub hex_pattern_count: usize,
    pub base64_pattern_count: usize,
}

/// Compute all derived metrics for a URL.
pub fn derive(url: &str) -> DerivedMetrics {
    DerivedMetrics {
        composition: Composition::of(url),
        url_complexity: url_complexity(url),
        character_complexity: character_complexity(url),
        shannon_entropy: shannon_entropy(url),
        kolmogorov_complexity: kolmogorov_complexity(url),
        fractal_dimension: higuchi_fractal_dimension(url, complexity::HIGUCHI_KMAX),
        hex_pattern_count: count_hex_patterns(url),
        base64_pattern_count: count_base64_patterns(url),
    }
}

impl DerivedMetrics {
    pub fn into_partial(self) -> FeaturePartial {
        let c = &self.composition;
        let mut partial = FeaturePartial::new(Source::Derived);
        partial
            .set(Feature::UrlComplexity, self.url_complexity)
            .set(Feature::CharacterComplexity, self.character_complexity)
            .set(Feature::LetterCntInUrl, c.letters)
            .set(Feature::UrlLetterRatio, c.letter_ratio)
            .set(Feature::DigitCntInUrl, c.digits)
            .set(Feature::UrlDigitRatio, c.digit_ratio)
            .set(Feature::EqualCharCntInUrl, c.equals)
            .set(Feature::QuesMarkCntInUrl, c.question_marks)
            .set(Feature::AmpCharCntInUrl, c.ampersands)
            .set(Feature::OtherSpclCharCntInUrl, c.other_special)
            .set(Feature::UrlOtherSpclCharRatio, c.other_special_ratio)
            .set(Feature::NumberOfHashtags, c.hashtags)
            .set(Feature::ShannonEntropy, self.shannon_entropy)
            .set(Feature::KolmogorovComplexity, self.kolmogorov_complexity)
            .set(Feature::FractalDimension, self.fractal_dimension)
            .set(Feature::HexPatternCnt, self.hex_pattern_count)
            .set(Feature::Base64PatternCnt, self.base64_pattern_count);
        partial
    }
}
