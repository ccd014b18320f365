use anyhow::Result;
use clap::Parser;
use phishprobe_cli::cli::{self, Cli, Command};
use tracing_subscriber::EnvFilter;

fn init_tracing(json: bool, quiet: bool) {
    let default = if quiet { "phishprobe=warn" } else { "phishprobe=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    if args.no_color {
        std::env::set_var("PHISHPROBE_NO_COLOR", "1");
    }
    if args.quiet {
        std::env::set_var("PHISHPROBE_QUIET", "1");
    }
    init_tracing(args.log_json, args.quiet);

    let config = args.config.as_ref();
    match args.command {
        Command::Scan(scan) => cli::scan_cmd::run(scan, config).await,
        Command::Derive { url, json } => cli::derive_cmd::run(&url, json),
        Command::Schema { required, json } => cli::schema_cmd::run(required, json),
        Command::Vector {
            url,
            tld_freq,
            probe,
            json,
        } => cli::vector_cmd::run(&url, &tld_freq, &probe, json, config).await,
    }
}
