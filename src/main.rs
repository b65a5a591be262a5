//! Content-Audit main entry point
//!
//! This is the command-line interface for the Content-Audit page auditor.

use anyhow::{bail, Context};
use clap::Parser;
use content_audit::config::{load_config_with_hash, Config};
use content_audit::output::{
    generate_markdown_summary, load_statistics, print_statistics, write_json_export,
    AuditStatistics,
};
use content_audit::storage::open_storage;
use content_audit::{AuditOptions, Auditor, MappingLoader};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Content-Audit: a mapping-driven web page auditor
///
/// Content-Audit extracts the content blocks described by a JSON mapping,
/// inventories linked assets and reports broken outbound links for a list
/// of pages. Interrupted batches resume where they stopped.
#[derive(Parser, Debug)]
#[command(name = "content-audit")]
#[command(version)]
#[command(about = "A mapping-driven web page auditor", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Page URLs to audit
    #[arg(value_name = "URL", conflicts_with = "urls")]
    pages: Vec<String>,

    /// Read page URLs from a file, one per line
    #[arg(long, value_name = "FILE")]
    urls: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Forget previously processed URLs and start a fresh batch
    #[arg(long)]
    fresh: bool,

    /// Skip asset collection
    #[arg(long)]
    no_assets: bool,

    /// Skip block extraction
    #[arg(long)]
    no_blocks: bool,

    /// Skip link health checks
    #[arg(long)]
    no_links: bool,

    /// Look up asset file sizes
    #[arg(long)]
    sizes: bool,

    /// Validate config and mapping and show what would be audited
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.stats {
        return handle_stats(&config);
    }

    let mapping_path = resolve_relative(&cli.config, &config.audit.mapping_path);
    let mapping = MappingLoader::from_path(&mapping_path)
        .with_context(|| format!("Failed to load block mapping {}", mapping_path.display()))?;
    tracing::info!(
        "Loaded {} block rules (hash: {})",
        mapping.len(),
        mapping.hash()
    );

    let urls = collect_urls(&cli)?;
    let options = apply_flags(AuditOptions::from_config(&config.audit), &cli);

    if cli.dry_run {
        handle_dry_run(&config, &mapping, &urls, options);
        return Ok(());
    }

    handle_audit(config, mapping, urls, options, cli.fresh).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("content_audit=info,warn"),
            1 => EnvFilter::new("content_audit=debug,info"),
            2 => EnvFilter::new("content_audit=trace,debug"),
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

/// Paths in the config are relative to the config file's directory
fn resolve_relative(config_path: &Path, path: &str) -> PathBuf {
    let path = Path::new(path);
    if path.is_absolute() {
        return path.to_path_buf();
    }
    match config_path.parent() {
        Some(dir) => dir.join(path),
        None => path.to_path_buf(),
    }
}

/// Gathers page URLs from the command line or the `--urls` file
///
/// Lines starting with `#` are comments. Trimming, blank-line removal and
/// deduplication happen in the batch itself.
fn collect_urls(cli: &Cli) -> anyhow::Result<Vec<String>> {
    let urls = match &cli.urls {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read URL list {}", path.display()))?
            .lines()
            .filter(|line| !line.trim_start().starts_with('#'))
            .map(str::to_string)
            .collect(),
        None => cli.pages.clone(),
    };
    Ok(urls)
}

fn apply_flags(mut options: AuditOptions, cli: &Cli) -> AuditOptions {
    if cli.no_assets {
        options.collect_assets = false;
    }
    if cli.no_blocks {
        options.extract_blocks = false;
    }
    if cli.no_links {
        options.check_links = false;
    }
    if cli.sizes {
        options.fetch_sizes = true;
    }
    options
}

/// Handles the --dry-run mode: validates inputs and shows what would run
fn handle_dry_run(config: &Config, mapping: &MappingLoader, urls: &[String], options: AuditOptions) {
    println!("=== Content-Audit Dry Run ===\n");

    println!("Pipelines:");
    println!("  Extract blocks: {}", options.extract_blocks);
    println!("  Collect assets: {}", options.collect_assets);
    println!(
        "  Look up sizes: {}",
        options.collect_assets && options.fetch_sizes
    );
    println!("  Check links: {}", options.check_links);
    println!(
        "  Link check concurrency: {}",
        config.audit.link_check_concurrency
    );

    println!("\nHTTP:");
    println!("  User agent: {}", config.http.user_agent);
    println!("  Page timeout: {}s", config.http.page_timeout_secs);
    println!("  Check timeout: {}s", config.http.check_timeout_secs);

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);
    println!("  Summary: {}", config.output.summary_path);
    println!("  Export: {}", config.output.export_path);

    println!("\nBlock Rules ({}):", mapping.len());
    for rule in mapping.rules() {
        println!("  - {} ({})", rule.name, rule.selector);
        for component in &rule.components {
            println!(
                "    * {}: {:?} via {:?}",
                component.name, component.target, component.kind
            );
        }
    }

    let pages: Vec<_> = urls.iter().map(|u| u.trim()).filter(|u| !u.is_empty()).collect();
    println!("\nURLs ({}):", pages.len());
    for url in &pages {
        println!("  - {}", url);
    }

    println!("\n✓ Configuration and mapping are valid");
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.output.database_path);

    let storage = open_storage(Path::new(&config.output.database_path))?;
    let stats = load_statistics(&storage)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the main audit operation
async fn handle_audit(
    config: Config,
    mapping: MappingLoader,
    urls: Vec<String>,
    options: AuditOptions,
    fresh: bool,
) -> anyhow::Result<()> {
    if urls.iter().all(|u| u.trim().is_empty()) {
        bail!("No page URLs given; pass URLs or --urls FILE");
    }

    let storage = open_storage(Path::new(&config.output.database_path))?;
    let mut auditor = Auditor::new(&config, mapping)?
        .with_options(options)
        .with_storage(Box::new(storage))?;

    if fresh {
        tracing::info!("Starting fresh batch (clearing previous state)");
        auditor.reset()?;
    } else {
        tracing::info!("Starting batch (will resume if an interrupted run exists)");
    }

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping after the current URL");
            ctrl_c.cancel();
        }
    });

    let report = auditor.run(&urls, &cancel).await?;

    write_json_export(auditor.state(), Path::new(&config.output.export_path))?;
    let stats = AuditStatistics::from_state(auditor.state());
    let run = auditor.latest_run()?;
    generate_markdown_summary(&stats, run.as_ref(), Path::new(&config.output.summary_path))?;

    println!(
        "Batch {}: {} processed, {} skipped, {} failed{}",
        report.status,
        report.processed.len(),
        report.skipped.len(),
        report.failed.len(),
        if report.cancelled { " (cancelled)" } else { "" }
    );
    for failure in &report.failed {
        println!("  ✗ {}: {}", failure.url, failure.error);
    }
    println!("✓ Export written to: {}", config.output.export_path);
    println!("✓ Summary written to: {}", config.output.summary_path);

    Ok(())
}
