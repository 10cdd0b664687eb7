//! Catalog-Sweep main entry point
//!
//! This is the command-line interface for the Catalog-Sweep catalogue crawler.

use anyhow::Context;
use catalog_sweep::aggregate::run_converter;
use catalog_sweep::config::{load_config_with_hash, Config};
use catalog_sweep::crawler::run_crawl;
use catalog_sweep::output::{exporter_for, print_statistics};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Catalog-Sweep: a category-tree catalogue crawler
///
/// Catalog-Sweep walks a shop's category tree from its seed pages, follows
/// subcategories and pagination, extracts every product it finds and writes
/// one deduplicated spreadsheet per run.
#[derive(Parser, Debug)]
#[command(name = "catalog-sweep")]
#[command(version = "1.0.0")]
#[command(about = "A category-tree catalogue crawler", long_about = None)]
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

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with = "convert")]
    dry_run: bool,

    /// Merge previously written JSON feeds into one spreadsheet and exit
    #[arg(long, conflicts_with = "dry_run")]
    convert: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);

    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.convert {
        handle_convert(&config)?;
    } else {
        handle_crawl(config).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("catalog_sweep=info,warn"),
            1 => EnvFilter::new("catalog_sweep=debug,info"),
            2 => EnvFilter::new("catalog_sweep=trace,debug"),
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

/// Handles the --dry-run mode: shows the resolved configuration
fn handle_dry_run(config: &Config) {
    println!("=== Catalog-Sweep Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Max depth: {}", config.crawler.max_depth);
    println!("  Max page: {}", config.crawler.max_page);
    println!(
        "  Max concurrent pages: {}",
        config.crawler.max_concurrent_pages_open
    );
    println!("  Visited set: {}", config.crawler.visited_set);
    if config.crawler.allowed_domains.is_empty() {
        println!("  Allowed domains: any");
    } else {
        println!(
            "  Allowed domains: {}",
            config.crawler.allowed_domains.join(", ")
        );
    }

    println!("\nFetcher:");
    println!("  User agent: {}", config.fetcher.user_agent);
    println!(
        "  Minimum time on page: {}ms",
        config.fetcher.minimum_time_on_page
    );
    println!(
        "  Retries: {} on {:?}, base delay {}ms",
        config.fetcher.retry_times, config.fetcher.retry_http_codes, config.fetcher.retry_delay
    );
    println!("  Request timeout: {}s", config.fetcher.request_timeout);

    println!("\nOutput:");
    println!(
        "  Export: {}/{}_<timestamp>.{}",
        config.output.directory,
        config.output.file_prefix.trim_end_matches('_'),
        exporter_for(config.output.format).extension()
    );
    if config.output.json_feed {
        println!("  JSON feed: {}/", config.output.json_feed_directory);
    }

    println!("\nConverter:");
    println!(
        "  Input: {}/{}*.json",
        config.converter.input_directory, config.converter.file_prefix
    );
    println!(
        "  Output: {}/{}_<timestamp>.{}",
        config.converter.output_directory,
        config.converter.output_name,
        exporter_for(config.converter.format).extension()
    );

    println!("\nSeeds ({}):", config.crawler.seeds.len());
    for seed in &config.crawler.seeds {
        println!("  - {}", seed);
    }

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would start crawling with {} seed URLs",
        config.crawler.seeds.len()
    );
}

/// Handles the --convert mode: merges JSON feeds into one spreadsheet
fn handle_convert(config: &Config) -> anyhow::Result<()> {
    match run_converter(&config.converter).context("Conversion failed")? {
        Some(path) => println!("✓ Combined export written to: {}", path.display()),
        None => println!("Nothing to convert"),
    }
    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config) -> anyhow::Result<()> {
    tracing::info!(
        "Seeds: {}, allowed domains: {}",
        config.crawler.seeds.len(),
        config.crawler.allowed_domains.len()
    );

    let stats = run_crawl(config).await.context("Crawl failed")?;
    tracing::info!("Crawl completed successfully");
    print_statistics(&stats);

    Ok(())
}
