//! Nav-Mapper main entry point
//!
//! This is the command-line interface for the Nav-Mapper site navigation
//! mapper.

use anyhow::{Context, Result};
use clap::Parser;
use nav_mapper::config::{load_config_with_hash, validate, Config, LoggingConfig};
use nav_mapper::input::{load_all_valid_urls, TargetPair};
use nav_mapper::logging::RotatingFile;
use nav_mapper::task::RunSummary;
use nav_mapper::{ConcurrencyManager, TaskResult, TaskWorker};
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Nav-Mapper: maps a site's navigation menu into a tree
///
/// Reads (URL, CSS selector) pairs from the CSV files of an input directory,
/// crawls the links inside each site's navigation container and writes the
/// resulting tree to one text file per site.
#[derive(Parser, Debug)]
#[command(name = "nav-mapper")]
#[command(version = "1.0.0")]
#[command(about = "Maps website navigation menus into trees", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults are used when omitted)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory holding the input CSV files
    #[arg(short, long, value_name = "DIR", default_value = "input_csvs")]
    input_dir: PathBuf,

    /// Process every loaded site instead of choosing one interactively
    #[arg(long, conflicts_with = "dry_run")]
    all: bool,

    /// Show the sites that would be processed and exit
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
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logging settings live in the config file, so it is read first
    let (config, hash) = load_configuration(cli.config.as_deref())?;

    setup_logging(cli.verbose, cli.quiet, &config.logging)?;
    match (&cli.config, hash) {
        (Some(path), Some(hash)) => tracing::info!(
            "Configuration loaded from {} (hash: {})",
            path.display(),
            hash
        ),
        _ => tracing::info!("No configuration file given, using defaults"),
    }

    tracing::info!("Loading targets from: {}", cli.input_dir.display());
    let pairs = load_all_valid_urls(&cli.input_dir)
        .with_context(|| format!("Failed to load targets from {}", cli.input_dir.display()))?;

    if pairs.is_empty() {
        println!(
            "No valid URLs found in '{}'. Please check your CSV files.",
            cli.input_dir.display()
        );
        return Ok(());
    }

    if cli.dry_run {
        handle_dry_run(&config, &pairs);
    } else if cli.all {
        handle_all(&config, pairs, !cli.quiet).await?;
    } else {
        handle_interactive(&config, &pairs).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Events go to the console and, unless disabled in the config, as JSON
/// lines to a size-rotated file. `RUST_LOG` takes precedence over `-v` when
/// set; `-q` always wins.
fn setup_logging(verbose: u8, quiet: bool, logging: &LoggingConfig) -> Result<()> {
    let filter = if quiet {
        EnvFilter::new("error")
    } else if let Ok(filter) = EnvFilter::try_from_default_env() {
        filter
    } else {
        match verbose {
            0 => EnvFilter::new("nav_mapper=info,warn"),
            1 => EnvFilter::new("nav_mapper=debug,info"),
            2 => EnvFilter::new("nav_mapper=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    let console = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false);

    let file = if logging.enabled {
        let path = logging.log_path();
        let writer = RotatingFile::open(&path, logging.max_bytes, logging.backups)
            .with_context(|| format!("Failed to open log file {}", path.display()))?;
        Some(
            tracing_subscriber::fmt::layer()
                .json()
                .with_thread_names(true)
                .with_file(true)
                .with_line_number(true)
                .with_writer(writer),
        )
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
        .init();
    Ok(())
}

/// Loads the configuration file if one was given, otherwise the defaults
///
/// The file's hash is returned alongside so it can be logged once logging
/// is up.
fn load_configuration(path: Option<&Path>) -> Result<(Config, Option<String>)> {
    let Some(path) = path else {
        let config = Config::default();
        validate(&config)?;
        return Ok((config, None));
    };

    let (config, hash) = load_config_with_hash(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
    Ok((config, Some(hash)))
}

/// Label shown for a target in listings
fn display_name(target: &str) -> String {
    url::Url::parse(target)
        .ok()
        .and_then(|u| u.host_str().map(|host| match u.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        }))
        .unwrap_or_else(|| target.to_string())
}

/// Handles the --dry-run mode: shows what would be processed
fn handle_dry_run(config: &Config, pairs: &[TargetPair]) {
    println!("=== Nav-Mapper Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Retries: {}", config.crawler.retries);
    println!("  Initial delay: {}ms", config.crawler.initial_delay_ms);
    println!("  Backoff factor: {}", config.crawler.backoff_factor);
    println!("  Jitter: {}", config.crawler.jitter);
    println!("  Request timeout: {}s", config.crawler.request_timeout_secs);

    println!("\nOutput:");
    println!("  Directory: {}", config.output.output_dir.display());
    println!("  Dead-letter log: {}", config.output.dead_letter_path.display());
    println!("  Workers: {}", config.pool.effective_workers());
    if config.logging.enabled {
        println!(
            "  Log file: {} ({} bytes x {} backups)",
            config.logging.log_path().display(),
            config.logging.max_bytes,
            config.logging.backups
        );
    }

    println!("\nTargets ({}):", pairs.len());
    for (url, selector) in pairs {
        println!("  - {} [{}]", url, selector);
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the --all mode: every target on the configured pool
async fn handle_all(config: &Config, pairs: Vec<TargetPair>, progress: bool) -> Result<()> {
    let worker = TaskWorker::from_config(config)?;
    let mut manager = ConcurrencyManager::new(worker, config.pool.effective_workers())
        .with_progress(progress);

    let mut results = manager.run_all(pairs).await;
    results.extend(manager.shutdown(true).await);

    report(&results);
    Ok(())
}

/// Handles the default mode: pick one target from a numbered list
async fn handle_interactive(config: &Config, pairs: &[TargetPair]) -> Result<()> {
    println!("\nPlease select a website to generate the navigation map for:");
    println!("{}", "-".repeat(60));
    for (i, (url, _)) in pairs.iter().enumerate() {
        println!("{}: {}", i + 1, display_name(url));
    }
    println!("{}", "-".repeat(60));
    println!("Enter the number corresponding to the website, or type 'exit' to quit:");

    let Some(index) = read_selection(pairs.len()).await? else {
        println!("Exiting application.");
        tracing::info!("User requested exit");
        return Ok(());
    };

    let (target, selector) = &pairs[index];
    tracing::info!(
        "User selected {} ({}) with selector '{}'",
        index + 1,
        target,
        selector
    );
    println!("\nProcessing selected website: {}", target);

    let worker = TaskWorker::from_config(config)?;
    let mut manager = ConcurrencyManager::new(worker, 1);

    let mut results = manager.run_all([(target, selector)]).await;
    results.extend(manager.shutdown(true).await);

    report(&results);
    Ok(())
}

/// Reads a 1-based choice from stdin; None on `exit` or end of input
async fn read_selection(options: usize) -> Result<Option<usize>> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let Some(line) = lines.next_line().await? else {
            return Ok(None);
        };
        let input = line.trim().to_lowercase();
        if input == "exit" {
            return Ok(None);
        }

        match input.parse::<usize>() {
            Ok(n) if (1..=options).contains(&n) => return Ok(Some(n - 1)),
            Ok(_) => println!("Invalid number. Please enter a number between 1 and {}.", options),
            Err(_) => println!("Invalid input. Please enter a number or 'exit'."),
        }
    }
}

/// Prints one line per task and the run summary
fn report(results: &[TaskResult]) {
    println!();
    for result in results {
        match result {
            TaskResult::Success {
                target,
                output_path,
            } => {
                println!("✓ {}", target);
                println!("  Output file: {}", output_path.display());
            }
            TaskResult::DeadLettered { target, error } => {
                println!("✗ {} (recorded in dead-letter log)", target);
                println!("  Error: {}", error);
            }
            TaskResult::TransientError { target, error } => {
                println!("✗ {} (unexpected error)", target);
                println!("  Error: {}", error);
            }
        }
    }

    let summary = RunSummary::from_results(results);
    println!("\n{}", summary);
    tracing::info!("{}", summary);
}
