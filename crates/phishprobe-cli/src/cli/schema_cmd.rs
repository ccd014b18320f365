//! `phishprobe schema`: print the feature catalog.

use crate::cli::output::{self, Styled};
use anyhow::Result;
use phishprobe::schema::{Category, FeatureSpec, CATALOG};
use serde::Serialize;

#[derive(Serialize)]
struct CatalogRow {
    name: &'static str,
    category: Category,
    source: &'static str,
    required: bool,
    definition: &'static str,
}

fn rows(required_only: bool) -> Vec<CatalogRow> {
    CATALOG
        .iter()
        .filter(|spec: &&FeatureSpec| !required_only || spec.required)
        .map(|spec| CatalogRow {
            name: spec.name,
            category: spec.category,
            source: spec.source.name(),
            required: spec.required,
            definition: spec.definition,
        })
        .collect()
}

pub fn run(required_only: bool, json: bool) -> Result<()> {
    let rows = rows(required_only);
    if json || output::is_json() {
        output::print_json(&rows);
        return Ok(());
    }

    let s = Styled::new();
    for category in Category::ALL {
        let in_category: Vec<&CatalogRow> =
            rows.iter().filter(|r| r.category == category).collect();
        if in_category.is_empty() {
            continue;
        }
        output::print_section(&s, category.title());
        for row in in_category {
            let marker = if row.required { "*" } else { " " };
            println!(
                "    {marker} {:<26} {:<16} {}",
                row.name,
                s.dim(row.source),
                row.definition
            );
        }
    }
    println!();
    println!("  {}", s.dim("* consumed by the classifier"));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_rows() {
        let required = rows(true);
        assert_eq!(required.len(), 59);
        assert_eq!(required[0].name, "LengthOfURL");
        assert!(rows(false).len() > required.len());
    }
}
