//! # SpliceKit G-Code
//!
//! First pass building blocks:
//! - the instruction model (parse, query, rewrite, serialize)
//! - block classes and the structural marker comments
//! - the classifier that tags every instruction with its block
//! - purge tower geometry, the layer index and the tower skip planner
//! - splice accounting

pub mod classifier;
pub mod gcode;
pub mod layers;
pub mod splice;
pub mod tower;

pub use classifier::{ClassifiedProgram, Classifier, ToolchangeEvent};
pub use gcode::{format_number, BlockClass, GcodeCommand, Marker, Parameter};
pub use layers::{LayerPlan, LayerRecord, SkipOutcome};
pub use splice::{SplicePolicy, SpliceRecord, SpliceTracker};
pub use tower::TowerBounds;
