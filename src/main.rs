//! Polite-Fetch main entry point
//!
//! This is the command-line interface for the Polite-Fetch harvester.

use anyhow::Context;
use clap::Parser;
use polite_fetch::config::{load_config_with_hash, Config};
use polite_fetch::harvest::{Coordinator, TargetFilter};
use polite_fetch::output::print_summary;
use polite_fetch::FetchEngine;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Polite-Fetch: a courteous page harvester
///
/// Polite-Fetch fetches the configured target pages while respecting
/// robots.txt, a global request rate and retry back-off, extracts records with
/// CSS selectors and saves them as JSON grouped by category.
#[derive(Parser, Debug)]
#[command(name = "polite-fetch")]
#[command(version = "1.0.0")]
#[command(about = "A courteous page harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Only harvest targets in this category (repeatable)
    #[arg(long = "category", value_name = "NAME")]
    categories: Vec<String>,

    /// Only harvest this site (repeatable)
    #[arg(long = "site", value_name = "ID")]
    sites: Vec<String>,

    /// Validate config and show what would be harvested without fetching
    #[arg(long, conflicts_with = "check")]
    dry_run: bool,

    /// Fetch a single URL through the engine and report the outcome
    #[arg(long, value_name = "URL", conflicts_with = "dry_run")]
    check: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    let filter = TargetFilter {
        categories: cli.categories,
        sites: cli.sites,
    };

    if cli.dry_run {
        handle_dry_run(&config, &filter);
    } else if let Some(url) = cli.check {
        handle_check(config, &url).await?;
    } else {
        handle_harvest(config, &filter).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("polite_fetch=info,warn"),
            1 => EnvFilter::new("polite_fetch=debug,info"),
            2 => EnvFilter::new("polite_fetch=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows the effective settings and selected targets
fn handle_dry_run(config: &Config, filter: &TargetFilter) {
    println!("=== Polite-Fetch Dry Run ===\n");

    let fetch = &config.fetch;
    println!("Fetch Configuration:");
    println!(
        "  Max requests per second: {} (one every {:?})",
        fetch.max_requests_per_second,
        fetch.min_interval()
    );
    println!("  User agent: {}", fetch.user_agent);
    println!("  Request timeout: {}ms", fetch.request_timeout_ms);
    println!(
        "  Retries: {} (base delay {}ms)",
        fetch.max_retries, fetch.retry_delay_ms
    );
    println!("  Respect robots.txt: {}", fetch.respect_robots_txt);
    println!("  Cache bucket: {}s", fetch.cache_bucket_secs);
    println!("  Jitter: {}-{}ms", fetch.jitter_min_ms, fetch.jitter_max_ms);
    println!("  Max honored Crawl-delay: {}s", fetch.max_crawl_delay_secs);
    if let Some(deadline) = fetch.overall_deadline_secs {
        println!("  Overall deadline per fetch: {}s", deadline);
    }

    println!("\nOutput:");
    println!("  Data directory: {}", config.output.data_dir);

    let selected: Vec<_> = config.targets.iter().filter(|t| filter.matches(t)).collect();
    println!("\nTargets ({} of {}):", selected.len(), config.targets.len());
    for target in &selected {
        println!("  - {} [{}] {}", target.site, target.category, target.url);
        for (field, selector) in &target.selectors {
            println!("    * {}: {}", field, selector);
        }
    }

    println!("\n✓ Configuration is valid");
    println!("✓ Would harvest {} targets", selected.len());
}

/// Handles the --check mode: fetches one URL and reports the outcome
async fn handle_check(config: Config, url: &str) -> anyhow::Result<()> {
    let engine = FetchEngine::new(config.fetch).context("Failed to build HTTP client")?;

    match engine.fetch(url).await {
        Ok(page) => {
            println!("✓ {}", page.url);
            println!("  Bytes: {}", page.body.len());
            println!("  Attempts: {}", page.attempts);
            println!("  From cache: {}", page.from_cache);
            Ok(())
        }
        Err(e) => {
            println!("✗ {}", url);
            println!("  Outcome: {}", e.kind());
            if let Some(last) = e.last_attempt_error() {
                println!("  Last attempt: {}", last);
            }
            Err(e).context("Check failed")
        }
    }
}

/// Handles the main harvest operation
async fn handle_harvest(config: Config, filter: &TargetFilter) -> anyhow::Result<()> {
    let coordinator = Coordinator::new(config).context("Failed to initialize harvest")?;

    let selected = coordinator.selected(filter).len();
    if selected == 0 {
        anyhow::bail!("No targets match the given --category/--site filters");
    }
    tracing::info!("Harvesting {} targets", selected);

    let summary = coordinator.run(filter).await.context("Harvest failed")?;
    print_summary(&summary);

    Ok(())
}
