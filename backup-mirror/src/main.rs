//! Backup Mirror - Main entry point
//!
//! Mirrors SOURCE into BACKUP and prints a report of what was done.

use anyhow::{Context, Result};
use backup_mirror::config::{Config, OutputFormat};
use backup_mirror::report::render::{render_json, render_text};
use backup_mirror::{utils, validate_roots, Mirror};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory whose contents are mirrored
    #[arg(value_name = "SOURCE")]
    source: PathBuf,

    /// Directory receiving the mirrored contents
    #[arg(value_name = "BACKUP")]
    backup: PathBuf,

    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    log_level: Option<String>,

    /// Report output format (overrides config)
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Follow symbolic links while walking
    #[arg(long)]
    follow_links: bool,

    /// Skip entries whose name contains PATTERN (repeatable)
    #[arg(short, long, value_name = "PATTERN")]
    exclude: Vec<String>,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => {
            tracing::error!("{:#}", err);
            eprintln!("backup-mirror: {:#}", err);
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let args = Args::parse();

    // Load configuration
    let mut config = match &args.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => Config::from_env().context("loading configuration from environment")?,
    };
    if let Some(level) = &args.log_level {
        config.log.level = level.clone();
    }
    if let Some(format) = args.format {
        config.report.format = format;
    }
    if args.follow_links {
        config.walk.follow_links = true;
    }
    config.walk.exclude_patterns.extend(args.exclude.iter().cloned());

    if args.print_config {
        print!("{}", config.to_toml()?);
        return Ok(ExitCode::SUCCESS);
    }

    // Initialize logging
    utils::logger::init(&config.log.level)?;

    tracing::info!("Starting backup-mirror v{}", env!("CARGO_PKG_VERSION"));

    let roots = validate_roots(&args.source, &args.backup).context("invalid directories")?;

    let report = Mirror::new(config.mirror_options())
        .run(&roots.source, &roots.backup)
        .context("mirror run aborted, nothing was copied")?;

    match config.report.format {
        OutputFormat::Text => print!("{}", render_text(&report)),
        OutputFormat::Json => println!("{}", render_json(&report)?),
    }

    if report.is_clean() {
        Ok(ExitCode::SUCCESS)
    } else {
        tracing::warn!("{} entries failed", report.failed().len());
        Ok(ExitCode::from(2))
    }
}
