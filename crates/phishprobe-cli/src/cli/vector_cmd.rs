//! `phishprobe vector`: the classifier's view of a URL.

use crate::cli::output::{self, Styled};
use crate::cli::{load_config, ProbeArgs};
use anyhow::{Context, Result};
use phishprobe::classifier::{FeatureVector, TldFrequencyTable};
use phishprobe::Pipeline;
use std::path::{Path, PathBuf};
use tracing::warn;

pub async fn run(
    url: &str,
    tld_freq: &Path,
    probe: &ProbeArgs,
    json: bool,
    config_path: Option<&PathBuf>,
) -> Result<()> {
    let table = TldFrequencyTable::load(tld_freq)
        .with_context(|| format!("loading TLD frequencies from {}", tld_freq.display()))?;
    let config = load_config(config_path, probe)?;
    let pipeline = Pipeline::from_config(&config)
        .await
        .context("building pipeline")?;
    let report = pipeline.scan(url).await;
    if let Err(e) = pipeline.shutdown().await {
        warn!("stopping browser: {e:#}");
    }
    let report = report.with_context(|| format!("scanning {url}"))?;

    let vector = FeatureVector::project(&report.record, &table);
    if json || output::is_json() {
        output::print_json(&vector);
        return Ok(());
    }

    let s = Styled::new();
    output::print_section(&s, &format!("Classifier input ({} features)", vector.len()));
    for (name, value) in vector.iter() {
        output::print_row(name, &format!("{value}"));
    }
    if !report.diagnostics.validation.is_valid {
        eprintln!();
        eprintln!(
            "  {} {} feature(s) defaulted: {}",
            s.warn_sym(),
            report.diagnostics.validation.missing.len(),
            s.yellow(&report.diagnostics.validation.missing.join(", "))
        );
    }
    Ok(())
}
