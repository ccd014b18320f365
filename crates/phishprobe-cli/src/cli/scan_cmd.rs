//! `phishprobe scan`: collect feature records.

use crate::cli::output::{self, Styled};
use crate::cli::{load_config, ScanArgs};
use anyhow::{bail, Context, Result};
use phishprobe::report::{group_by_category, summary_line};
use phishprobe::{Pipeline, ScanReport};
use std::path::PathBuf;
use tracing::warn;

pub async fn run(args: ScanArgs, config_path: Option<&PathBuf>) -> Result<()> {
    let config = load_config(config_path, &args.probe)?;
    let json = args.json || output::is_json();
    let s = Styled::new();

    if !json && !output::is_quiet() {
        output::print_header(&s);
    }

    let pipeline = Pipeline::from_config(&config)
        .await
        .context("building pipeline")?;
    let results = pipeline.scan_many(&args.urls, config.concurrency).await;
    if let Err(e) = pipeline.shutdown().await {
        warn!("stopping browser: {e:#}");
    }

    let mut reports = Vec::with_capacity(results.len());
    let mut failures = 0usize;
    for (url, result) in args.urls.iter().zip(results) {
        match result {
            Ok(report) => reports.push(report),
            Err(e) => {
                failures += 1;
                eprintln!("  {} {url}: {e}", s.fail_sym());
            }
        }
    }

    if json {
        if reports.len() == 1 {
            output::print_json(&reports[0]);
        } else {
            output::print_json(&reports);
        }
    } else {
        for report in &reports {
            print_report(&s, report);
        }
    }

    if failures > 0 {
        bail!("{failures} of {} scan(s) failed", args.urls.len());
    }
    Ok(())
}

fn print_report(s: &Styled, report: &ScanReport) {
    eprintln!("  {}", s.cyan(&report.url));
    output::print_diagnostics(s, &report.diagnostics);
    let summary = summary_line(&report.diagnostics);
    if report.diagnostics.validation.is_valid {
        eprintln!("  {} {summary}", s.ok_sym());
    } else {
        eprintln!("  {} {summary}", s.warn_sym());
    }

    for group in group_by_category(&report.record) {
        output::print_section(s, group.title);
        for entry in &group.entries {
            let value = output::truncate(&entry.value.to_string(), 60);
            let value = if entry.produced { value } else { s.dim(&value) };
            output::print_row(entry.feature, &value);
        }
    }

    if !report.record.extra().is_empty() {
        output::print_section(s, "Other Sources");
        for (name, value) in report.record.extra() {
            output::print_row(name, &value.to_string());
        }
    }

    if !report.external_links.is_empty() {
        output::print_section(s, "External Links");
        for link in &report.external_links {
            println!("    {link}");
        }
    }
    println!();
}
