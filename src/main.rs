//! Magpie main entry point
//!
//! This is the command-line interface for the Magpie media harvester.

use anyhow::{bail, Context};
use clap::Parser;
use magpie::config::{load_config_with_hash, Config};
use magpie::output::{print_json, print_run_summary, print_statistics};
use magpie::storage::{MediaQuery, MediaType, DEFAULT_PAGE_SIZE};
use magpie::MediaService;
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// Magpie: harvest images and videos from web pages
///
/// Magpie fetches each given page, extracts the images, videos and video
/// embeds it references, titles them and stores them deduplicated by media
/// URL in a SQLite database that can then be listed and searched.
#[derive(Parser, Debug)]
#[command(name = "magpie")]
#[command(version = "1.0.0")]
#[command(about = "Harvest images and videos from web pages", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Page URLs to scrape
    #[arg(value_name = "URLS")]
    urls: Vec<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and print it without scraping
    #[arg(long, conflicts_with_all = ["stats", "list"])]
    dry_run: bool,

    /// Show media counts from the database and exit
    #[arg(long, conflicts_with_all = ["dry_run", "list"])]
    stats: bool,

    /// Print one page of stored media as JSON and exit
    #[arg(long, conflicts_with_all = ["dry_run", "stats"])]
    list: bool,

    /// Page number for --list (1-based)
    #[arg(long, default_value_t = 1, requires = "list")]
    page: u32,

    /// Page size for --list (at most 100)
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE, requires = "list")]
    limit: u32,

    /// Only list media of this type (image or video)
    #[arg(long = "type", value_name = "TYPE", requires = "list")]
    media_type: Option<MediaType>,

    /// Only list media whose alt text, title or URLs contain this text
    #[arg(long, requires = "list")]
    search: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config, &cli.urls);
        return Ok(());
    }

    let service = MediaService::start(&config).context("Failed to start media service")?;

    if cli.stats {
        handle_stats(&service).await?;
    } else if cli.list {
        let query = MediaQuery {
            page: cli.page,
            limit: cli.limit,
            media_type: cli.media_type,
            search: cli.search,
        };
        handle_list(&service, query).await?;
    } else {
        handle_scrape(&service, &cli.urls).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("magpie=info,warn"),
            1 => EnvFilter::new("magpie=debug,info"),
            2 => EnvFilter::new("magpie=trace,debug"),
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

/// Handles the --dry-run mode: shows the effective configuration
fn handle_dry_run(config: &Config, urls: &[String]) {
    println!("=== Magpie Dry Run ===\n");

    println!("Queue:");
    println!("  Workers: {}", config.queue.concurrency);
    println!("  Attempts per job: {}", config.queue.max_attempts);
    println!("  Retry backoff: {}ms", config.queue.backoff_ms);
    println!("  Failure history: {}", config.queue.failure_history);

    println!("\nFetcher:");
    println!("  Timeout: {}ms", config.fetcher.timeout_ms);
    println!("  Max redirects: {}", config.fetcher.max_redirects);
    println!("  User agent: {}", config.fetcher.user_agent);
    println!("  Idle connections per host: {}", config.fetcher.max_idle_per_host);

    println!("\nStorage:");
    println!("  Database: {}", config.storage.database_path);

    println!("\n✓ Configuration is valid");
    if !urls.is_empty() {
        println!("✓ Would scrape {} URLs", urls.len());
    }
}

/// Handles the --stats mode: shows media counts from the database
async fn handle_stats(service: &MediaService) -> anyhow::Result<()> {
    let stats = service.get_stats().await?;
    print_statistics(&stats);
    Ok(())
}

/// Handles the --list mode: prints one page of media as JSON
async fn handle_list(service: &MediaService, query: MediaQuery) -> anyhow::Result<()> {
    let page = service.list_media(query).await?;
    print_json(&page)?;
    Ok(())
}

/// Handles the main scrape operation: queue the URLs and wait for the pool
async fn handle_scrape(service: &MediaService, urls: &[String]) -> anyhow::Result<()> {
    if urls.is_empty() {
        bail!("No URLs given; pass page URLs to scrape, or use --stats or --list");
    }

    let started = Instant::now();
    let receipt = service.submit_urls(urls)?;
    tracing::info!("{}", receipt.message);

    service.queue().wait_idle().await;

    let queue = service.queue();
    print_run_summary(&queue.snapshot(), &queue.recent_failures(), started.elapsed());
    println!();
    print_statistics(&service.get_stats().await?);

    Ok(())
}
