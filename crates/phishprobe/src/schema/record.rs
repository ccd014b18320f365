//! Partial results, the merged record, and schema validation.

use super::{spec, Feature, FeatureValue, Source, CATALOG};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Features produced by one source.
///
/// Catalog keys go through [`FeaturePartial::set`]; anything outside the
/// catalog (pluggable sources) goes into `extra`, which is reported but never
/// fed to the classifier. External links found while rendering travel
/// alongside and end up in the scan report, not the record.
#[derive(Debug, Clone, PartialEq)]
pub struct FeaturePartial {
    source: Source,
    values: BTreeMap<Feature, FeatureValue>,
    extra: BTreeMap<String, FeatureValue>,
    external_links: Vec<String>,
}

/// A partial taken apart for merging.
pub(crate) struct PartialParts {
    pub source: Source,
    pub values: BTreeMap<Feature, FeatureValue>,
    pub extra: BTreeMap<String, FeatureValue>,
    pub external_links: Vec<String>,
}

impl FeaturePartial {
    pub fn new(source: Source) -> Self {
        Self {
            source,
            values: BTreeMap::new(),
            extra: BTreeMap::new(),
            external_links: Vec::new(),
        }
    }

    pub fn source(&self) -> Source {
        self.source
    }

    /// Set a catalog feature.
    pub fn set(&mut self, feature: Feature, value: impl Into<FeatureValue>) -> &mut Self {
        self.values.insert(feature, value.into());
        self
    }

    /// Set a non-catalog key.
    pub fn set_extra(&mut self, name: impl Into<String>, value: impl Into<FeatureValue>) -> &mut Self {
        self.extra.insert(name.into(), value.into());
        self
    }

    pub fn set_external_links(&mut self, links: Vec<String>) -> &mut Self {
        self.external_links = links;
        self
    }

    pub fn get(&self, feature: Feature) -> Option<&FeatureValue> {
        self.values.get(&feature)
    }

    pub fn external_links(&self) -> &[String] {
        &self.external_links
    }

    pub fn values(&self) -> impl Iterator<Item = (Feature, &FeatureValue)> {
        self.values.iter().map(|(k, v)| (*k, v))
    }

    pub fn extra(&self) -> &BTreeMap<String, FeatureValue> {
        &self.extra
    }

    pub fn len(&self) -> usize {
        self.values.len() + self.extra.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.extra.is_empty()
    }

    pub(crate) fn into_parts(self) -> PartialParts {
        PartialParts {
            source: self.source,
            values: self.values,
            extra: self.extra,
            external_links: self.external_links,
        }
    }
}

/// The merged feature record for one URL.
///
/// Holds a value for every catalog feature. `produced` remembers which keys
/// came from a source rather than from a sentinel default.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRecord {
    values: BTreeMap<Feature, FeatureValue>,
    produced: BTreeSet<Feature>,
    extra: BTreeMap<String, FeatureValue>,
}

impl FeatureRecord {
    pub(crate) fn from_merged(
        values: BTreeMap<Feature, FeatureValue>,
        produced: BTreeSet<Feature>,
        extra: BTreeMap<String, FeatureValue>,
    ) -> Self {
        Self {
            values,
            produced,
            extra,
        }
    }

    /// Build a record from explicit values; every other catalog feature is
    /// defaulted and counts as not produced.
    pub fn from_values(values: impl IntoIterator<Item = (Feature, FeatureValue)>) -> Self {
        let mut merged = BTreeMap::new();
        let mut produced = BTreeSet::new();
        for (feature, value) in values {
            produced.insert(feature);
            merged.insert(feature, value);
        }
        for row in CATALOG {
            merged
                .entry(row.feature)
                .or_insert_with(|| FeatureValue::default_for(row.kind));
        }
        Self::from_merged(merged, produced, BTreeMap::new())
    }

    /// Value of a catalog feature.
    pub fn get(&self, feature: Feature) -> &FeatureValue {
        match self.values.get(&feature) {
            Some(v) => v,
            None => unreachable!("record holds every catalog feature; {feature} missing"),
        }
    }

    /// Numeric value of a feature; text features read as `0.0`.
    pub fn number(&self, feature: Feature) -> f64 {
        self.get(feature).as_f64().unwrap_or(0.0)
    }

    pub fn was_produced(&self, feature: Feature) -> bool {
        self.produced.contains(&feature)
    }

    pub fn produced(&self) -> &BTreeSet<Feature> {
        &self.produced
    }

    pub fn extra(&self) -> &BTreeMap<String, FeatureValue> {
        &self.extra
    }

    /// All values in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = (Feature, &FeatureValue)> {
        self.values.iter().map(|(k, v)| (*k, v))
    }

    /// Flat `name -> value` view including extra keys.
    pub fn to_flat_map(&self) -> BTreeMap<String, FeatureValue> {
        let mut flat: BTreeMap<String, FeatureValue> = self
            .values
            .iter()
            .map(|(k, v)| (k.name().to_string(), v.clone()))
            .collect();
        for (k, v) in &self.extra {
            flat.entry(k.clone()).or_insert_with(|| v.clone());
        }
        flat
    }
}

impl Serialize for FeatureRecord {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_flat_map().serialize(serializer)
    }
}

/// Result of checking a record against the required feature list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Validation {
    pub is_valid: bool,
    /// Required features no source produced (they hold defaults).
    pub missing: Vec<&'static str>,
    /// Number of keys sources actually produced, extras included.
    pub total: usize,
}

/// Check which required features were produced by a source.
///
/// The record is always complete after defaulting; this is a diagnostic of
/// how much of it is real data.
pub fn validate(record: &FeatureRecord, required: impl IntoIterator<Item = Feature>) -> Validation {
    let missing: Vec<&'static str> = required
        .into_iter()
        .filter(|f| !record.was_produced(*f))
        .map(|f| spec(f).name)
        .collect();
    Validation {
        is_valid: missing.is_empty(),
        missing,
        total: record.produced.len() + record.extra.len(),
    }
}
