//! Shelf-Sweep main entry point
//!
//! This is the command-line interface for the Shelf-Sweep product crawler.

use anyhow::Context;
use clap::Parser;
use shelf_sweep::config::{load_config_with_hash, validate, Config};
use shelf_sweep::crawler::Coordinator;
use shelf_sweep::output::{print_statistics, CrawlSummary};
use shelf_sweep::progress::{spawn_observer, ProgressEvent};
use std::path::PathBuf;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Shelf-Sweep: a product discovery-and-extraction crawler
///
/// Shelf-Sweep walks an online store's homepage, category pages, brand pages
/// and their pagination, extracts every product it finds and writes the
/// result as JSON and CSV.
#[derive(Parser, Debug)]
#[command(name = "shelf-sweep")]
#[command(version = "1.0.0")]
#[command(about = "A product discovery-and-extraction crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Root URL of the store, overriding the configuration file
    #[arg(long, env = "SHELF_SWEEP_BASE_URL")]
    base_url: Option<String>,

    /// Write the JSON dataset to this path
    #[arg(long, value_name = "PATH")]
    json: Option<String>,

    /// Write the CSV export to this path
    #[arg(long, value_name = "PATH")]
    csv: Option<String>,

    /// Write a markdown crawl summary to this path
    #[arg(long, value_name = "PATH")]
    summary: Option<String>,

    /// Number of product-scraping workers
    #[arg(long)]
    workers: Option<u32>,

    /// Print each progress event as a JSON line on stderr
    #[arg(long)]
    progress_json: bool,

    /// Validate the configuration and print it without crawling
    #[arg(long)]
    dry_run: bool,

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

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = build_config(&cli)?;

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    handle_crawl(config, cli.progress_json).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("shelf_sweep=info,warn"),
            1 => EnvFilter::new("shelf_sweep=debug,info"),
            2 => EnvFilter::new("shelf_sweep=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Loads the configuration file, if any, and applies command-line overrides
fn build_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match (&cli.config, &cli.base_url) {
        (Some(path), _) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        (None, Some(base_url)) => Config::for_site(base_url.clone()),
        (None, None) => anyhow::bail!("Either a configuration file or --base-url is required"),
    };

    if let Some(base_url) = &cli.base_url {
        config.site.base_url = base_url.clone();
    }
    if let Some(workers) = cli.workers {
        config.crawler.workers = workers;
    }
    if let Some(path) = &cli.json {
        config.output.json_path = Some(path.clone());
    }
    if let Some(path) = &cli.csv {
        config.output.csv_path = Some(path.clone());
    }
    if let Some(path) = &cli.summary {
        config.output.summary_path = Some(path.clone());
    }
    if config.output.json_path.is_none() && config.output.csv_path.is_none() {
        tracing::info!("No output path given, writing products.json");
        config.output.json_path = Some("products.json".to_string());
    }

    validate(&config).context("Invalid configuration")?;
    Ok(config)
}

/// Handles the --dry-run mode: shows the effective configuration
fn handle_dry_run(config: &Config) {
    println!("=== Shelf-Sweep Dry Run ===\n");

    println!("Site:");
    println!("  Base URL: {}", config.site.base_url);
    println!(
        "  Fallback category paths: {}",
        config.site.fallback_category_paths.join(", ")
    );
    println!("  Pagination parameter: {}", config.site.pagination_param);

    println!("\nCrawler Configuration:");
    println!("  Request timeout: {}s", config.crawler.request_timeout);
    println!("  Politeness delay: {}ms", config.crawler.politeness_delay);
    println!(
        "  Max pagination depth: {}",
        config.crawler.max_pagination_depth
    );
    println!("  Workers: {}", config.crawler.workers);

    println!("\nClassifier:");
    println!(
        "  Max product links: {}",
        config.classifier.max_product_links
    );
    println!(
        "  Weak indicator threshold: {}",
        config.classifier.weak_indicator_threshold
    );

    println!("\nExtraction:");
    println!("  Known brands: {}", config.extraction.known_brands.len());
    println!(
        "  Default inventory: {}",
        config.extraction.default_inventory
    );

    println!("\nOutput:");
    let unset = "(not written)".to_string();
    println!("  JSON: {}", config.output.json_path.as_ref().unwrap_or(&unset));
    println!("  CSV: {}", config.output.csv_path.as_ref().unwrap_or(&unset));
    println!(
        "  Summary: {}",
        config.output.summary_path.as_ref().unwrap_or(&unset)
    );

    println!("\n✓ Configuration is valid");
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, progress_json: bool) -> anyhow::Result<()> {
    let (tx, rx) = mpsc::channel::<ProgressEvent>(config.crawler.progress_buffer.max(1));
    let observer = spawn_observer(rx, move |event: &ProgressEvent| -> anyhow::Result<()> {
        if progress_json {
            eprintln!("{}", serde_json::to_string(event)?);
        } else {
            tracing::info!(
                "[{:>3}%] {} ({} products)",
                event.percentage,
                event.message,
                event.products_found
            );
        }
        Ok(())
    });

    // Ctrl-C stops new fetches; what was already fetched is still saved
    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, finishing up");
            on_signal.cancel();
        }
    });

    let result = Coordinator::new(config)
        .context("Failed to start crawl")?
        .with_progress(tx)
        .with_cancellation(cancel)
        .run()
        .await;

    // The coordinator owned the only sender, so the observer drains and exits
    if let Err(e) = observer.await {
        tracing::warn!("Progress observer task failed: {}", e);
    }

    let report = result.context("Crawl failed")?;
    print_statistics(&CrawlSummary::from_run(&report.dataset, &report.stats));
    Ok(())
}
