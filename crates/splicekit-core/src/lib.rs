//! # SpliceKit Core
//!
//! Core types shared by the SpliceKit crates:
//! - the error taxonomy for the few conditions that abort a run
//! - the diagnostics sink that collects every non-fatal condition
//! - callback aliases used for progress reporting

pub mod diagnostics;
pub mod error;
pub mod types;

pub use diagnostics::{Diagnostic, Diagnostics, MessageLevel};
pub use error::{Error, Result};
pub use types::ProgressCallback;
