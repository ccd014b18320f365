//! Merging partials into one record.

use crate::error::{ProbeError, Result};
use crate::schema::{Feature, FeaturePartial, FeatureRecord, FeatureValue, Source, CATALOG};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Accumulates partials for one URL.
#[derive(Debug, Default)]
pub struct Merger {
    values: BTreeMap<Feature, FeatureValue>,
    produced: BTreeSet<Feature>,
    extra: BTreeMap<String, FeatureValue>,
    external_links: BTreeSet<String>,
}

impl Merger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a partial reported by the source tagged `owner`.
    ///
    /// Every catalog key must belong to `owner`; external sources own none.
    pub fn absorb(&mut self, owner: Source, partial: FeaturePartial) -> Result<()> {
        let parts = partial.into_parts();
        if parts.source != owner {
            if let Some(feature) = parts.values.keys().next() {
                return Err(ProbeError::SchemaViolation {
                    owner,
                    feature: feature.name(),
                });
            }
        }
        for (feature, value) in parts.values {
            if feature.spec().source != owner {
                return Err(ProbeError::SchemaViolation {
                    owner,
                    feature: feature.name(),
                });
            }
            self.values.insert(feature, value);
            self.produced.insert(feature);
        }
        for (key, value) in parts.extra {
            if Feature::from_name(&key).is_some() {
                debug!("{owner} set catalog name {key} as an extra key; ignored");
                continue;
            }
            self.extra.insert(key, value);
        }
        self.external_links.extend(parts.external_links);
        Ok(())
    }

    /// Set a sentinel for a feature no source produced.
    ///
    /// Does not mark the feature produced and never overwrites a real value.
    pub fn fill(&mut self, feature: Feature, value: impl Into<FeatureValue>) {
        self.values.entry(feature).or_insert_with(|| value.into());
    }

    /// Default every remaining catalog feature and check completeness.
    pub fn finish(mut self) -> Result<(FeatureRecord, Vec<String>)> {
        for row in CATALOG {
            self.values
                .entry(row.feature)
                .or_insert_with(|| FeatureValue::default_for(row.kind));
        }
        let missing: Vec<&'static str> = Feature::required()
            .filter(|f| !self.values.contains_key(f))
            .map(|f| f.name())
            .collect();
        if !missing.is_empty() {
            return Err(ProbeError::MissingRequired(missing));
        }
        let record = FeatureRecord::from_merged(self.values, self.produced, self.extra);
        Ok((record, self.external_links.into_iter().collect()))
    }
}
