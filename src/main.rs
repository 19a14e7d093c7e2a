//! doc-harvest main entry point
//!
//! This is the command-line interface for the doc-harvest documentation harvester.

use anyhow::Context;
use clap::Parser;
use doc_harvest::config::{load_config_with_hash, Config, PipelineSettings};
use doc_harvest::crawler::{harvest, resume, RunOutcome};
use doc_harvest::output::{ledger_statistics, print_ledger_statistics};
use doc_harvest::storage::{load_ledger, LedgerPaths};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// doc-harvest: Harvest a documentation site into local Markdown
///
/// doc-harvest discovers the pages of a documentation section, fetches each
/// one through a direct or a rendered strategy, and writes the main content
/// as Markdown. Pages that keep failing are recorded in a failure ledger that
/// a later `--resume` run re-attempts.
#[derive(Parser, Debug)]
#[command(name = "doc-harvest")]
#[command(version)]
#[command(about = "Harvest a documentation site into local Markdown", long_about = None)]
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

    /// Re-attempt the items of a failure ledger (default: <ledger-dir>/failed_links.json)
    #[arg(long, value_name = "LEDGER", num_args = 0..=1, conflicts_with_all = ["dry_run", "stats"])]
    resume: Option<Option<PathBuf>>,

    /// Validate config and show the effective settings without fetching anything
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show a breakdown of a failure ledger and exit (default: <ledger-dir>/failed_links.json)
    #[arg(long, value_name = "LEDGER", num_args = 0..=1)]
    stats: Option<Option<PathBuf>>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);

    if cli.dry_run {
        handle_dry_run(&config);
    } else if let Some(ledger) = cli.stats {
        handle_stats(&ledger_or_default(ledger, &config))?;
    } else if let Some(ledger) = cli.resume {
        let ledger = ledger_or_default(ledger, &config);
        tracing::info!("Resuming failures from {}", ledger.display());
        let outcome = resume(config, ledger).await.context("Resume run failed")?;
        report_outcome(&outcome);
    } else {
        tracing::info!("Starting harvest of {}", config.site.start_url);
        let outcome = harvest(config).await.context("Harvest failed")?;
        report_outcome(&outcome);
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("doc_harvest=info,warn"),
            1 => EnvFilter::new("doc_harvest=debug,info"),
            2 => EnvFilter::new("doc_harvest=trace,debug"),
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

fn ledger_or_default(ledger: Option<PathBuf>, config: &Config) -> PathBuf {
    ledger.unwrap_or_else(|| LedgerPaths::fresh(Path::new(&config.output.ledger_dir)).json)
}

/// Handles the --dry-run mode: prints the effective settings of both pipelines
fn handle_dry_run(config: &Config) {
    println!("=== doc-harvest Dry Run ===\n");

    println!("Site:");
    println!("  Start URL: {}", config.site.start_url);
    println!("  Target prefix: {}", config.site.target_prefix);
    println!("  Direct base: {}", config.site.base_url);
    println!("  Rendered base: {}", config.site.dynamic_base_url);

    println!("\nOutput:");
    println!("  Documents: {}", config.output.output_dir);
    println!("  Ledgers: {}", config.output.ledger_dir);

    print_settings("Fresh pipeline", &PipelineSettings::fresh(config));
    print_settings("Resume pipeline", &PipelineSettings::resume(config));

    println!("\n✓ Configuration is valid");
}

fn print_settings(heading: &str, settings: &PipelineSettings) {
    println!("\n{}:", heading);
    println!("  Quality mode: {:?}", settings.mode);
    println!("  Strategy priority: {:?}", settings.priority);
    println!("  Workers: {}", settings.concurrency);
    println!("  Delay between items: {:?}", settings.item_delay);
    println!("  Navigation timeout: {:?}", settings.fetch.navigation_timeout);
    println!(
        "  Retries: {} ordinary, {} after a timeout",
        settings.retry.max_retries, settings.retry.timeout_max_retries
    );
    println!(
        "  Content thresholds: extract {}, save {}, floor {}",
        settings.quality.extract_min, settings.quality.save_min, settings.quality.floor
    );
}

/// Handles the --stats mode: shows a breakdown of a failure ledger
fn handle_stats(path: &Path) -> anyhow::Result<()> {
    println!("Ledger: {}\n", path.display());

    let ledger = load_ledger(path)?;
    let stats = ledger_statistics(&ledger);
    print_ledger_statistics(&ledger, &stats);

    Ok(())
}

fn report_outcome(outcome: &RunOutcome) {
    if outcome.interrupted {
        tracing::warn!("Run was interrupted before every item finished");
    }

    match &outcome.ledger_paths {
        Some(paths) => tracing::info!(
            "{} items still failing; resume with --resume {}",
            outcome.failures.len(),
            paths.json.display()
        ),
        None if outcome.failures.is_empty() => tracing::info!("Every item was saved"),
        None => tracing::error!(
            "{} items failed but the ledger could not be written",
            outcome.failures.len()
        ),
    }
}
