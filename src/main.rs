use anyhow::Result;
use clap::Parser;
use skusync::presentation::cli_summary::{
    print_error, print_layout, print_perf_summary, print_summary,
};
use skusync::{AppConfig, LogLevel, SearchCommand};
use std::path::PathBuf;

const DEFAULT_CONFIG: &str = "skusync.toml";

#[derive(Parser, Debug)]
#[command(
    name = "skusync",
    about = "Skusync: cache a CSV file, look up SKUs and publish the matches to a spreadsheet."
)]
struct Cli {
    /// Config file (defaults to ./skusync.toml when present).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// CSV file to import.
    #[arg(long, default_value = "")]
    csv: String,

    /// Comma-separated keys to look up, e.g. "A1, A3, Z9".
    #[arg(short, long, default_value = "")]
    keys: String,

    /// Spreadsheet id or output CSV path; overrides `[target] name`.
    #[arg(short, long)]
    target: Option<String>,

    /// Import and search, but do not publish.
    #[arg(long)]
    dry_run: bool,

    /// Print the run report as JSON instead of the summary.
    #[arg(long)]
    json: bool,

    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    skusync::init_tracing(match (cli.verbose, cli.quiet) {
        (true, _) => LogLevel::Debug,
        (_, true) => LogLevel::Error,
        _ => LogLevel::Info,
    });

    let config_path = cli
        .config
        .clone()
        .or_else(|| Some(PathBuf::from(DEFAULT_CONFIG)).filter(|p| p.exists()));
    let cfg = AppConfig::load(config_path.as_deref())?;

    let target_name = cli.target.clone().unwrap_or_else(|| cfg.target.name.clone());

    let outcome = match SearchCommand::new(&cli.csv, &target_name, &cli.keys) {
        Ok(command) if cli.dry_run => skusync::run_dry(&cfg, &command).await,
        Ok(command) => skusync::run(&cfg, &command).await,
        Err(e) => Err(e),
    };

    let report = match outcome {
        Ok(report) => report,
        Err(e) => {
            print_error(&e);
            std::process::exit(1);
        }
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_summary(&report);
    if cli.dry_run {
        print_layout(&skusync::layout(&cfg, &report));
    }
    if let Some(perf) = &report.perf {
        print_perf_summary(perf);
    }

    Ok(())
}
