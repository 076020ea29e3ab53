//! tbsummary - TensorBoard scalars to CSV tables
//!
//! A CLI tool that collects the latest scalars of every run under a logs
//! directory, aggregates runs per model, computes confidence intervals and
//! writes CSV reports.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Error (invalid configuration, no event files, malformed layout, I/O)

mod analysis;
mod cli;
mod config;
mod error;
mod events;
mod models;
mod pipeline;
mod report;
mod scanner;

use anyhow::{Context, Result};
use cli::Args;
use config::{Config, DEFAULT_CONFIG_FILE};
use indicatif::{ProgressBar, ProgressStyle};
use pipeline::{Progress, Settings};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

fn main() {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        if let Err(e) = handle_init_config() {
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
        return;
    }

    // Initialize logging
    init_logging(&args);

    info!("tbsummary v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    if let Err(e) = run_summary(&args) {
        error!("Summary failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }
}

/// Handle --init-config: generate a default .tbsummary.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(DEFAULT_CONFIG_FILE);

    if path.exists() {
        anyhow::bail!(
            "{} already exists. Remove it first or edit it manually.",
            DEFAULT_CONFIG_FILE
        );
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", DEFAULT_CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", DEFAULT_CONFIG_FILE);
    println!("   Edit it to set logs_dir, prefixes, names and sort orders.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Run the complete summary workflow.
fn run_summary(args: &Args) -> Result<()> {
    let start_time = Instant::now();

    let mut config = load_config(args)?;
    config.merge_with_args(args)?;
    let settings = config.into_settings()?;

    if args.dry_run {
        return handle_dry_run(&settings);
    }

    println!("📂 Reading event files in {}", settings.logs_dir.display());

    let progress_bar = if args.quiet {
        None
    } else {
        let pb = ProgressBar::new(0);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        Some(pb)
    };

    let outcome = pipeline::run(&settings, &events::EventFileReader, |event| {
        let Some(pb) = progress_bar.as_ref() else {
            return;
        };
        match event {
            Progress::Discovered(total) => pb.set_length(total as u64),
            Progress::Reading(path) => {
                pb.set_message(path.display().to_string());
                pb.inc(1);
            }
            Progress::Aggregated => pb.finish_and_clear(),
        }
    });
    if let Some(pb) = progress_bar {
        pb.finish_and_clear();
    }
    let outcome = outcome?;

    for warning in outcome.diagnostics.warnings() {
        warn!("⚠️  {}", warning);
    }

    println!("\n📊 Summary:");
    println!("   Event files: {}", outcome.event_files);
    println!("   Models: {} ({} runs)", outcome.models, outcome.runs);
    println!("   Warnings: {}", outcome.diagnostics.len());
    for path in &outcome.written {
        println!("   ✅ Saved {}", path.display());
    }
    println!("   Duration: {:.1}s", start_time.elapsed().as_secs_f64());

    Ok(())
}

/// Handle --dry-run: list event files per model and run, then exit.
fn handle_dry_run(settings: &Settings) -> Result<()> {
    println!("\n🔍 Dry run: scanning event files (nothing is read)...\n");

    let files = pipeline::discover(&settings.logs_dir)?;

    println!("   Found {} event files:\n", files.len());
    for file in &files {
        match analysis::run_identity(&settings.logs_dir, file) {
            Ok(id) => println!("     📄 {} / {}  ({})", id.model_key, id.run_name, file.display()),
            Err(e) => println!("     ⚠️  {}", e),
        }
    }

    println!("\n✅ Dry run complete. No files were written.");
    Ok(())
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location; a file that exists must parse
    match Config::load_default()? {
        Some(config) => {
            info!("Loaded default config from {}", DEFAULT_CONFIG_FILE);
            Ok(config)
        }
        None => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
    }
}
