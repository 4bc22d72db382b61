//! Sitemap-Scout main entry point
//!
//! This is the command-line interface for the Sitemap-Scout URL discovery engine.

use anyhow::Context;
use clap::Parser;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use sitemap_scout::config::{load_config_with_hash, Config};
use sitemap_scout::output::{write_result, OutputFormat};
use sitemap_scout::Coordinator;
use tracing_subscriber::EnvFilter;

/// Sitemap-Scout: A polite website URL discovery engine
///
/// Sitemap-Scout lists the URLs of a website from its sitemaps, and crawls
/// the site itself when no sitemap is usable. Requests are paced per domain
/// and honour robots.txt crawl delays.
#[derive(Parser, Debug)]
#[command(name = "sitemap-scout")]
#[command(version = "1.0.0")]
#[command(about = "A polite website URL discovery engine", long_about = None)]
struct Cli {
    /// Site to discover, e.g. https://example.com
    #[arg(value_name = "BASE_URL")]
    base_url: String,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Requests per second allowed against the site (overrides config)
    #[arg(short, long)]
    rate: Option<f64>,

    /// Page budget of the fallback crawl (overrides config)
    #[arg(long)]
    max_pages: Option<usize>,

    /// Output encoding: records (JSON) or table (CSV)
    #[arg(short, long, default_value = "records")]
    format: OutputFormat,

    /// Write the result to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout carries only the result
    setup_logging(cli.verbose, cli.quiet);

    let config = load(&cli)?;
    let rate = cli.rate.unwrap_or(config.politeness.rate);

    let coordinator = Coordinator::new(config).context("Failed to build HTTP client")?;
    let result = coordinator.discover(&cli.base_url, rate, cli.max_pages).await;

    match &cli.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            let mut out = BufWriter::new(file);
            write_result(&result, cli.format, &mut out)?;
            out.flush()?;
            tracing::info!("Result written to {}", path.display());
        }
        None => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            write_result(&result, cli.format, &mut out)?;
            out.flush()?;
        }
    }

    if !result.success {
        std::process::exit(1);
    }
    Ok(())
}

/// Loads the configuration file if one was given, else the defaults
fn load(cli: &Cli) -> anyhow::Result<Config> {
    let config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };
    Ok(config)
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sitemap_scout=info,warn"),
            1 => EnvFilter::new("sitemap_scout=debug,info"),
            2 => EnvFilter::new("sitemap_scout=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}
