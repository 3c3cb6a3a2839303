//! SpliceKit command line front end
//!
//! Processes one G-code file in place or into a new file.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use splicekit::{init_logging, process_file, Pipeline, Settings, BUILD_DATE, VERSION};

#[derive(Parser)]
#[command(name = "splicekit")]
#[command(version)]
#[command(about = "Prepare multi-material G-code for a filament splicer", long_about = None)]
struct Cli {
    /// G-code file to process
    input: PathBuf,

    /// Write the result here instead of replacing the input
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Settings file (.toml or .json), defaults to the user configuration
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// Write the processing report as JSON
    #[arg(long, value_name = "FILE")]
    report: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn load_settings(path: Option<&Path>) -> Result<Settings> {
    if let Some(path) = path {
        return Settings::load_from_file(path)
            .with_context(|| format!("Failed to load settings from {}", path.display()));
    }

    match Settings::default_path() {
        Some(path) if path.exists() => Settings::load_from_file(&path)
            .with_context(|| format!("Failed to load settings from {}", path.display())),
        _ => Ok(Settings::new()),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;
    tracing::info!("SpliceKit {} (built {})", VERSION, BUILD_DATE);

    let settings = load_settings(cli.settings.as_deref())?;
    let pipeline = Pipeline::new(settings).with_progress(Box::new(|done, total| {
        tracing::debug!("Progress {}/{}", done, total);
    }));

    let report = process_file(pipeline, &cli.input, cli.output.as_deref())
        .with_context(|| format!("Failed to process {}", cli.input.display()))?;

    for warning in report.warnings() {
        eprintln!("{}", warning);
    }

    if let Some(path) = &cli.report {
        let json = report.to_json().context("Failed to serialize report")?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
    }

    println!(
        "{} splices, {:.1}mm of filament",
        report.splices.len(),
        report.total_extruded
    );
    Ok(())
}
