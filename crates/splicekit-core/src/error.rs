//! Error handling for SpliceKit
//!
//! Only two conditions abort a processing run:
//! - missing layer configuration while path processing is requested
//! - I/O failures on the input or output file
//!
//! Everything else (short splices, double retracts, incompatible modes,
//! an unsatisfiable skip budget) is recorded as a [`Diagnostic`] and the
//! run continues.
//!
//! All error types use `thiserror` for ergonomic error handling.

use std::path::PathBuf;

use thiserror::Error;

use crate::diagnostics::Diagnostic;

/// Main error type for SpliceKit
///
/// A unified error type used by every library crate's public API.
#[derive(Error, Debug)]
pub enum Error {
    /// Path processing was requested but the stream carries no layer markers.
    ///
    /// No output is produced; the diagnostics gathered so far are returned.
    #[error("Layer configuration is missing, no output generated")]
    MissingLayerConfiguration {
        /// Diagnostics recorded before the run was aborted.
        diagnostics: Vec<Diagnostic>,
    },

    /// Reading or writing a file failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// The file that could not be accessed.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Settings could not be loaded or failed validation.
    #[error("Settings error: {0}")]
    Settings(String),

    /// Report serialization failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Create an I/O error bound to the path that failed
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    /// Check if this is an I/O error
    pub fn is_io_error(&self) -> bool {
        matches!(self, Error::Io { .. })
    }

    /// Diagnostics carried by the error, if any
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            Error::MissingLayerConfiguration { diagnostics } => diagnostics,
            _ => &[],
        }
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;
