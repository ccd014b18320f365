//! Reporting views over a feature record.

use crate::pipeline::{Diagnostics, SourceStatus};
use crate::schema::{Category, FeatureRecord, FeatureValue, CATALOG};
use serde::Serialize;

/// One feature as shown in a report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportEntry {
    pub feature: &'static str,
    pub value: FeatureValue,
    pub definition: &'static str,
    /// Name of the source that owns the feature.
    pub source: &'static str,
    /// False when the value is a default standing in for a failed source.
    pub produced: bool,
}

/// Entries of one category, in catalog order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryGroup {
    pub category: Category,
    pub title: &'static str,
    pub entries: Vec<ReportEntry>,
}

/// Group every catalog feature of `record` by reporting category.
///
/// Categories with no entries are omitted.
pub fn group_by_category(record: &FeatureRecord) -> Vec<CategoryGroup> {
    Category::ALL
        .iter()
        .map(|&category| CategoryGroup {
            category,
            title: category.title(),
            entries: CATALOG
                .iter()
                .filter(|spec| spec.category == category)
                .map(|spec| ReportEntry {
                    feature: spec.name,
                    value: record.get(spec.feature).clone(),
                    definition: spec.definition,
                    source: spec.source.name(),
                    produced: record.was_produced(spec.feature),
                })
                .collect(),
        })
        .filter(|group| !group.entries.is_empty())
        .collect()
}

/// One-line status like the web front end showed above its tables.
pub fn summary_line(diagnostics: &Diagnostics) -> String {
    let v = &diagnostics.validation;
    let failed: Vec<&str> = diagnostics
        .sources
        .iter()
        .filter(|s| s.status == SourceStatus::Failed)
        .map(|s| s.source)
        .collect();
    let mut line = if v.is_valid {
        format!("Collected {} features", v.total)
    } else {
        format!("Collected {} features (missing: {})", v.total, v.missing.len())
    };
    if !failed.is_empty() {
        line.push_str(&format!("; failed sources: {}", failed.join(", ")));
    }
    line
}
