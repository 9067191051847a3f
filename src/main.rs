//! SEO-Reach main entry point
//!
//! This is the command-line interface for the SEO-Reach link reachability auditor.

use anyhow::Context;
use clap::Parser;
use seo_reach::config::{load_config_with_hash, Config, TransportMode};
use seo_reach::crawler::run_audit;
use seo_reach::output::{build_summary, print_summary, write_reports};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// SEO-Reach: a link reachability auditor
///
/// SEO-Reach crawls a site from its home page, adds the URLs listed in its
/// sitemaps, and reports which pages cannot be reached by following links
/// (orphans) and how many clicks every other page sits from the home page.
#[derive(Parser, Debug)]
#[command(name = "seo-reach")]
#[command(version)]
#[command(about = "A link reachability auditor", long_about = None)]
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

    /// Validate config and show what would be audited without fetching anything
    #[arg(long)]
    dry_run: bool,

    /// Fetch on a small thread pool with a blocking client
    #[arg(long)]
    blocking: bool,

    /// Also write the JSON export here (overrides output.json-path)
    #[arg(long, value_name = "PATH")]
    json: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.blocking {
        config.crawler.transport = TransportMode::Blocking;
    }

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    handle_audit(config, &config_hash, cli.json).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("seo_reach=info,warn"),
            1 => EnvFilter::new("seo_reach=debug,info"),
            2 => EnvFilter::new("seo_reach=trace,debug"),
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

/// Handles the --dry-run mode: validates config and shows what would be audited
fn handle_dry_run(config: &Config) {
    println!("=== SEO-Reach Dry Run ===\n");

    println!("Site:");
    println!("  Base URL: {}", config.site.base_url);
    println!("  Sitemaps ({}):", config.site.sitemaps.len());
    for sitemap in &config.site.sitemaps {
        println!("    * {}", sitemap);
    }
    println!("  Extra URLs: {}", config.site.extra_urls.len());

    println!("\nCrawler Configuration:");
    println!("  Max depth: {}", config.crawler.max_depth);
    println!("  Max pages: {}", config.crawler.max_pages);
    println!("  Max concurrency: {}", config.crawler.max_concurrency);
    println!("  Request timeout: {}s", config.crawler.request_timeout_secs);
    println!("  Transport: {:?}", config.crawler.transport);

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!("  Report: {}", config.output.report_path);
    if let Some(json) = &config.output.json_path {
        println!("  JSON: {}", json);
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the main audit operation
async fn handle_audit(
    config: Config,
    config_hash: &str,
    json_override: Option<PathBuf>,
) -> anyhow::Result<()> {
    let report_path = PathBuf::from(&config.output.report_path);
    let json_path = json_override.or_else(|| config.output.json_path.as_ref().map(PathBuf::from));

    // Ctrl-C stops fetching; whatever was collected is still analyzed and reported
    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupt received, finishing with the pages fetched so far");
                cancel.cancel();
            }
        }
    });

    tracing::info!(
        "Auditing {} (max depth {}, max pages {}, {} sitemaps)",
        config.site.base_url,
        config.crawler.max_depth,
        config.crawler.max_pages,
        config.site.sitemaps.len()
    );

    let outcome = match run_audit(config, cancel).await {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!("Audit failed: {}", e);
            return Err(e.into());
        }
    };

    let summary = build_summary(&outcome, Some(config_hash));
    let written = write_reports(&summary, &report_path, json_path.as_deref())
        .context("Failed to write reports")?;

    print_summary(&summary);
    for path in written {
        println!("✓ Report written to: {}", path.display());
    }

    Ok(())
}
