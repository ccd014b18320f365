//! URL structural features.

use super::{FeatureSource, SourceError};
use crate::pipeline::ScanContext;
use crate::schema::{Feature, FeaturePartial, Source};
use crate::urlparts::UrlParts;
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

/// Path, query and fragment facts about a URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UrlStructure {
    pub url: String,
    pub length: usize,
    pub having_path: bool,
    pub path_length: usize,
    pub having_query: bool,
    pub having_fragment: bool,
}

impl UrlStructure {
    pub fn of(url: &str, parts: &UrlParts) -> Self {
        Self {
            url: url.to_string(),
            length: url.chars().count(),
            having_path: parts.has_path(),
            path_length: parts.path.chars().count(),
            having_query: parts.has_query(),
            having_fragment: parts.has_fragment(),
        }
    }

    pub fn into_partial(self) -> FeaturePartial {
        let mut partial = FeaturePartial::new(Source::Url);
        partial
            .set(Feature::Url, self.url)
            .set(Feature::LengthOfUrl, self.length)
            .set(Feature::HavingPath, self.having_path)
            .set(Feature::PathLength, self.path_length)
            .set(Feature::HavingQuery, self.having_query)
            .set(Feature::HavingFragment, self.having_fragment)
            // an anchor is the fragment
            .set(Feature::HavingAnchor, self.having_fragment);
        partial
    }
}

/// Pure source; never fails.
#[derive(Debug, Default)]
pub struct UrlStructureSource;

#[async_trait]
impl FeatureSource for UrlStructureSource {
    fn source(&self) -> Source {
        Source::Url
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(1)
    }

    async fn collect(&self, ctx: &ScanContext) -> Result<FeaturePartial, SourceError> {
        Ok(UrlStructure::of(&ctx.url, &ctx.parts).into_partial())
    }
}
