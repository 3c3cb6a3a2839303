//! Type system utilities and aliases.
//!
//! ## Modules
//!
//! - [`aliases`]: callback aliases shared by the processing crates.

pub mod aliases;

pub use aliases::*;
