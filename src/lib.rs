//! # SpliceKit
//!
//! G-code post-processor that prepares multi-material prints for a
//! filament splicing device.
//!
//! ## Architecture
//!
//! SpliceKit is organized as a workspace with multiple crates:
//!
//! 1. **splicekit-core** - Error taxonomy, diagnostics sink, callbacks
//! 2. **splicekit-settings** - Processing settings, persistence, in-stream directives
//! 3. **splicekit-gcode** - Instruction model, classifier, tower geometry, layer planner,
//!    splice accounting
//! 4. **splicekit-processor** - Rewrite engine, collaborators, pipeline, file processing
//! 5. **splicekit** - Command line front end that integrates all crates
//!
//! ## Processing
//!
//! A file is processed in two passes. The first pass classifies every
//! instruction into a block, measures the purge tower and records layer
//! boundaries. The second pass rewrites the stream for the resolved purge
//! strategy while accounting splices and material.

pub use splicekit_core::{Diagnostic, Diagnostics, Error, MessageLevel, ProgressCallback, Result};
pub use splicekit_gcode::{
    BlockClass, ClassifiedProgram, Classifier, GcodeCommand, LayerPlan, LayerRecord, Marker,
    SplicePolicy, SpliceRecord, SpliceTracker, TowerBounds,
};
pub use splicekit_processor::{
    process_file, Collaborators, Pipeline, ProcessOutput, ProcessReport, ProcessorContext,
    PurgeStrategy, Rewrite, RewriteEngine,
};
pub use splicekit_settings::{Settings, SettingsError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging
///
/// Sets up structured logging on stderr:
/// - RUST_LOG environment variable support
/// - `info` by default, `debug` when `verbose` is set
pub fn init_logging(verbose: bool) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let default_level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    let env_filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .with_level(true)
        .with_line_number(verbose);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}
