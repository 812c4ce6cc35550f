//! goal-scraper binary: one pipeline run per invocation.
//!
//! Exit status is 0 on success (including "nothing new") and 1 on any fatal error.

use std::path::PathBuf;

use clap::Parser;
use goal_scraper::config;
use goal_scraper::PipelineError;
use goal_scraper::pipeline::{self, RunOptions};
use goal_scraper::scrape::fetch;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "goal-scraper", about = "Scrape new goals and merge them into the goal list")]
struct Cli {
    /// Compute and print the diff without writing the artifact
    #[arg(long)]
    dry_run: bool,

    /// Print the full error chain on failure and log at debug level
    #[arg(short, long)]
    verbose: bool,

    /// Log the structure of every table on the fetched page
    #[arg(long)]
    debug: bool,

    /// Path to a TOML or JSON config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Read the listing from a saved HTML file instead of fetching it
    #[arg(long)]
    from_file: Option<PathBuf>,

    /// Override the artifact path from config
    #[arg(long)]
    artifact: Option<PathBuf>,
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "goal_scraper=debug,info"
    } else {
        "goal_scraper=info,warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .init();
}

async fn run(cli: &Cli) -> anyhow::Result<()> {
    let mut cfg = config::load(cli.config.as_deref())?;
    if let Some(path) = &cli.artifact {
        cfg.artifact.path = path.clone();
    }

    let fetcher = fetch::from_config(&cfg.source, cli.from_file.as_deref());
    let opts = RunOptions {
        dry_run: cli.dry_run,
        debug: cli.debug,
    };
    let summary = pipeline::run(&cfg, fetcher.as_ref(), opts).await;
    drop(fetcher);

    print!("{}", summary?);
    Ok(())
}

#[tokio::main]
async fn main() {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(&cli).await {
        if let Some(dump) = e.downcast_ref::<PipelineError>().and_then(PipelineError::diagnostic) {
            eprintln!("{dump}");
        }
        if cli.verbose {
            eprintln!("Error: {e:?}");
        } else {
            eprintln!("Error: {e:#}");
        }
        std::process::exit(1);
    }
}
