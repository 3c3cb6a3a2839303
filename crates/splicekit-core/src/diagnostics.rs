//! Diagnostics sink
//!
//! Collects the non-fatal conditions raised while processing a stream and
//! mirrors each one to `tracing`. The sink is owned by a single processing
//! run and returned alongside the output.

use serde::{Deserialize, Serialize};

use crate::types::ProgressCallback;

/// Severity of a diagnostic message
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageLevel {
    /// Debug message
    Debug,
    /// Info message
    Info,
    /// Warning message
    Warning,
    /// Error message
    Error,
}

impl std::fmt::Display for MessageLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Debug => write!(f, "DEBUG"),
            Self::Info => write!(f, "INFO"),
            Self::Warning => write!(f, "WARN"),
            Self::Error => write!(f, "ERR"),
        }
    }
}

/// A single diagnostic raised during processing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Severity
    pub level: MessageLevel,
    /// Human readable message
    pub message: String,
    /// Input line index the diagnostic refers to, if any
    pub line: Option<usize>,
}

impl Diagnostic {
    /// Create a new diagnostic
    pub fn new(level: MessageLevel, message: impl Into<String>, line: Option<usize>) -> Self {
        Self {
            level,
            message: message.into(),
            line,
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.line {
            Some(line) => write!(f, "[{}] line {}: {}", self.level, line + 1, self.message),
            None => write!(f, "[{}] {}", self.level, self.message),
        }
    }
}

/// Accumulates diagnostics and forwards progress notifications
#[derive(Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
    progress: Option<ProgressCallback>,
    last_percent: Option<u64>,
}

impl std::fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Diagnostics")
            .field("entries", &self.entries)
            .field("has_progress", &self.progress.is_some())
            .finish()
    }
}

impl Diagnostics {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a progress observer receiving `(percent, 100)`
    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    /// Record a warning
    pub fn warn(&mut self, message: impl Into<String>) {
        self.push(MessageLevel::Warning, message.into(), None);
    }

    /// Record a warning tied to an input line
    pub fn warn_at(&mut self, line: usize, message: impl Into<String>) {
        self.push(MessageLevel::Warning, message.into(), Some(line));
    }

    /// Record an informational message
    pub fn info(&mut self, message: impl Into<String>) {
        self.push(MessageLevel::Info, message.into(), None);
    }

    /// Record a debug message
    pub fn debug(&mut self, message: impl Into<String>) {
        self.push(MessageLevel::Debug, message.into(), None);
    }

    fn push(&mut self, level: MessageLevel, message: String, line: Option<usize>) {
        match level {
            MessageLevel::Debug => tracing::debug!(line, "{}", message),
            MessageLevel::Info => tracing::info!(line, "{}", message),
            MessageLevel::Warning => tracing::warn!(line, "{}", message),
            MessageLevel::Error => tracing::error!(line, "{}", message),
        }
        self.entries.push(Diagnostic::new(level, message, line));
    }

    /// Report progress as a percentage, best effort
    ///
    /// Repeated reports of the same percentage are not forwarded.
    pub fn progress(&mut self, percent: u64) {
        let percent = percent.min(100);
        if self.last_percent == Some(percent) {
            return;
        }
        self.last_percent = Some(percent);
        if let Some(callback) = &self.progress {
            callback(percent, 100);
        }
    }

    /// All recorded diagnostics in order
    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    /// Recorded warnings only
    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries
            .iter()
            .filter(|d| d.level >= MessageLevel::Warning)
    }

    /// Whether any warning was recorded
    pub fn has_warnings(&self) -> bool {
        self.warnings().next().is_some()
    }

    /// Consume the sink, returning the recorded diagnostics
    pub fn into_entries(self) -> Vec<Diagnostic> {
        self.entries
    }
}
