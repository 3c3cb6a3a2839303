//! Type aliases for commonly used complex types.
//!
//! Boxed closure types are hard to read at a glance. The aliases give them
//! a name that conveys intent and keeps the same pattern across crates.

// =============================================================================
// CALLBACK TYPES
// =============================================================================

/// A progress callback receiving (current, total) values.
///
/// The processing pipeline reports percentages, so `total` is always 100.
/// Thread-safe so an observer on another thread can receive updates.
pub type ProgressCallback = Box<dyn Fn(u64, u64) + Send + Sync>;
