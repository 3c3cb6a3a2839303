//! Processing context shared by the rewrite engine and its collaborators

use serde::{Deserialize, Serialize};
use splicekit_gcode::{SplicePolicy, SpliceTracker};

/// Purge strategy in effect for a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurgeStrategy {
    /// Purge into the slicer's tower, device driven by pings
    #[default]
    Standard,
    /// Wipe beside the bed instead of into the tower
    SideWipe,
    /// Regenerate the tower with minimal purge volume
    FullPurgeReduction,
    /// Print the tower at a Z offset to absorb skipped layers
    TowerDelta,
}

impl PurgeStrategy {
    /// Purge material is collected and wiped elsewhere
    pub fn replaces_purge(self) -> bool {
        matches!(self, Self::SideWipe | Self::FullPurgeReduction)
    }
}

impl std::fmt::Display for PurgeStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Standard => write!(f, "standard"),
            Self::SideWipe => write!(f, "side wipe"),
            Self::FullPurgeReduction => write!(f, "full purge reduction"),
            Self::TowerDelta => write!(f, "tower delta"),
        }
    }
}

/// Tool head position
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Mutable state of one processing run
///
/// Created fresh for every run and never shared between runs.
#[derive(Debug, Clone)]
pub struct ProcessorContext {
    /// Resolved purge strategy
    pub strategy: PurgeStrategy,
    /// Rewrite paths around the tower (side wipe, tower delta or full purge reduction requested)
    pub path_processing: bool,
    /// Device driven by pings in the stream
    pub accessory_mode: bool,
    /// Splice and material accounting, owns the current tool
    pub splices: SpliceTracker,
    /// Current layer, `None` before the first layer marker
    pub layer: Option<usize>,
    pub position: Position,
    pub previous_position: Position,
    /// Outstanding retraction, negative when retracted
    pub retraction: f64,
    pub extrusion_multiplier: f64,
    /// Last commanded feed rate
    pub keep_speed: f64,
    /// Last X/Y seen inside the tower
    pub keep_x: f64,
    pub keep_y: f64,
    /// Last X/Y seen anywhere, and the one before it
    pub purge_keep_x: f64,
    pub purge_keep_y: f64,
    pub previous_purge_keep_x: f64,
    pub previous_purge_keep_y: f64,
    pub fan_speed: f64,
    pub current_temp: f64,
    pub new_temp: f64,
    /// Temperature drop replayed once the toolchange block is left
    pub stashed_temp_drop: Option<String>,
    /// Temperature rise replayed on entering the purge
    pub stashed_temp_rise: Option<String>,
    /// Current tower Z offset
    pub tower_z_delta: f64,
    /// Largest tower Z offset applied
    pub max_tower_delta: f64,
    /// Purge length collected for the next side wipe
    pub side_wipe_length: f64,
    pub purge_count: usize,
    pub toolchange_processed: bool,
    pub tower_skipped: bool,
    pub enter_purge: bool,
    /// Retract before the next planar move carrying a negative extrusion
    pub expect_retract: bool,
    /// Position to write into the next retract
    pub retract_move: Option<(f64, f64)>,
}

impl ProcessorContext {
    pub fn new(
        strategy: PurgeStrategy,
        path_processing: bool,
        accessory_mode: bool,
        policy: SplicePolicy,
    ) -> Self {
        Self {
            strategy,
            path_processing,
            accessory_mode,
            splices: SpliceTracker::new(policy),
            layer: None,
            position: Position::default(),
            previous_position: Position::default(),
            retraction: 0.0,
            extrusion_multiplier: 1.0,
            keep_speed: 0.0,
            keep_x: 0.0,
            keep_y: 0.0,
            purge_keep_x: 0.0,
            purge_keep_y: 0.0,
            previous_purge_keep_x: 0.0,
            previous_purge_keep_y: 0.0,
            fan_speed: 0.0,
            current_temp: 0.0,
            new_temp: 0.0,
            stashed_temp_drop: None,
            stashed_temp_rise: None,
            tower_z_delta: 0.0,
            max_tower_delta: 0.0,
            side_wipe_length: 0.0,
            purge_count: 0,
            toolchange_processed: false,
            tower_skipped: false,
            enter_purge: false,
            expect_retract: false,
            retract_move: None,
        }
    }

    /// Tool currently loaded
    pub fn current_tool(&self) -> Option<usize> {
        self.splices.current_tool()
    }

    /// Filament is retracted
    pub fn is_retracted(&self) -> bool {
        self.retraction < 0.0
    }
}

impl Default for ProcessorContext {
    fn default() -> Self {
        Self::new(PurgeStrategy::Standard, false, false, SplicePolicy::default())
    }
}
