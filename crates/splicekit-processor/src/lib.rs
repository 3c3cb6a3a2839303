//! # SpliceKit Processor
//!
//! The second pass and everything around it:
//! - [`ProcessorContext`], the mutable state of one run
//! - [`RewriteEngine`], the per-instruction rewrite state machine
//! - collaborator traits for tower generation, wipe motion and pings
//! - [`Pipeline`], which runs both passes and produces a [`ProcessReport`]
//! - file processing helpers

pub mod collaborators;
pub mod context;
pub mod engine;
pub mod file_io;
pub mod pipeline;

pub use collaborators::{
    consume_purge, Collaborators, CommentWipe, NoPings, NoTower, PingScheduler, TowerGenerator,
    TowerLayout, WipeGenerator,
};
pub use context::{Position, ProcessorContext, PurgeStrategy};
pub use engine::{Disposition, Rewrite, RewriteEngine};
pub use file_io::{process_file, read_lines, write_lines};
pub use pipeline::{resolve_strategy, Pipeline, ProcessOutput, ProcessReport};
