//! CLI definition and subcommand implementations for the phishprobe binary.

pub mod derive_cmd;
pub mod output;
pub mod scan_cmd;
pub mod schema_cmd;
pub mod vector_cmd;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use phishprobe::ProbeConfig;
use std::path::PathBuf;
use tracing::debug;

#[derive(Parser, Debug)]
#[command(name = "phishprobe", version, about = "Extract phishing-classifier features from URLs")]
pub struct Cli {
    /// Config file (default: ~/.phishprobe/config.json)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Only print warnings and results
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Collect the full feature record for one or more URLs
    Scan(ScanArgs),
    /// Compute URL statistics only; no network access
    Derive {
        url: String,
        #[arg(long)]
        json: bool,
    },
    /// List the feature catalog
    Schema {
        /// Only the features the classifier consumes
        #[arg(long)]
        required: bool,
        #[arg(long)]
        json: bool,
    },
    /// Print the numeric vector the classifier would receive
    Vector {
        url: String,
        /// CSV of TLD frequencies (TLD,Frequency)
        #[arg(long)]
        tld_freq: PathBuf,
        #[command(flatten)]
        probe: ProbeArgs,
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug)]
pub struct ScanArgs {
    #[arg(required = true)]
    pub urls: Vec<String>,

    /// Print reports as JSON
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub probe: ProbeArgs,
}

/// Flags that override the loaded configuration.
#[derive(Args, Debug, Default, Clone)]
pub struct ProbeArgs {
    /// Skip headless browser rendering
    #[arg(long)]
    pub no_dynamic: bool,

    /// URLs and browser contexts processed at once
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Per-URL deadline in seconds
    #[arg(long)]
    pub timeout: Option<u64>,
}

impl ProbeArgs {
    pub fn apply(&self, config: &mut ProbeConfig) {
        if self.no_dynamic {
            config.dynamic = false;
        }
        if let Some(n) = self.concurrency {
            config.concurrency = n;
        }
        if let Some(secs) = self.timeout {
            config.timeouts.deadline_ms = secs * 1000;
        }
    }
}

/// Load the layered configuration and apply command-line overrides.
pub fn load_config(path: Option<&PathBuf>, args: &ProbeArgs) -> Result<ProbeConfig> {
    let mut config =
        ProbeConfig::load(path.map(PathBuf::as_path)).context("loading configuration")?;
    args.apply(&mut config);
    config.validate().context("invalid command-line overrides")?;
    debug!(
        dynamic = config.dynamic,
        concurrency = config.concurrency,
        deadline_ms = config.timeouts.deadline_ms,
        passive_dns = config.passive_dns,
        social = config.social,
        geolocation = config.geolocation,
        "effective configuration"
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scan() {
        let cli = Cli::try_parse_from([
            "phishprobe",
            "scan",
            "https://a.com",
            "https://b.com",
            "--no-dynamic",
            "--concurrency",
            "2",
            "--timeout",
            "30",
        ])
        .unwrap();
        match cli.command {
            Command::Scan(args) => {
                assert_eq!(args.urls.len(), 2);
                let mut config = ProbeConfig::default();
                args.probe.apply(&mut config);
                assert!(!config.dynamic);
                assert_eq!(config.concurrency, 2);
                assert_eq!(config.timeouts.deadline_ms, 30_000);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_scan_requires_url() {
        assert!(Cli::try_parse_from(["phishprobe", "scan"]).is_err());
    }

    #[test]
    fn test_vector_requires_table() {
        assert!(Cli::try_parse_from(["phishprobe", "vector", "https://a.com"]).is_err());
        let cli = Cli::try_parse_from([
            "phishprobe",
            "vector",
            "https://a.com",
            "--tld-freq",
            "tld.csv",
        ])
        .unwrap();
        assert!(matches!(cli.command, Command::Vector { .. }));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["phishprobe", "schema", "--log-json", "-q"]).unwrap();
        assert!(cli.log_json);
        assert!(cli.quiet);
    }

    #[test]
    fn test_flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"concurrency": 3, "social": true}"#).unwrap();

        let args = ProbeArgs {
            timeout: Some(15),
            ..Default::default()
        };
        let config = load_config(Some(&path), &args).unwrap();
        assert_eq!(config.timeouts.deadline_ms, 15_000);
        assert!(config.social);

        let zero = ProbeArgs {
            concurrency: Some(0),
            ..Default::default()
        };
        assert!(load_config(Some(&path), &zero).is_err());
    }
}
