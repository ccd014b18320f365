//! `phishprobe derive`: URL statistics without touching the network.

use crate::cli::output::{self, Styled};
use anyhow::Result;
use phishprobe::derivation;

pub fn run(url: &str, json: bool) -> Result<()> {
    let metrics = derivation::derive(url);
    if json || output::is_json() {
        output::print_json(&metrics);
        return Ok(());
    }

    let s = Styled::new();
    output::print_section(&s, "Derived Metrics");
    for (feature, value) in metrics.into_partial().values() {
        output::print_row(feature.name(), &value.to_string());
    }
    Ok(())
}
