//! Processing settings for SpliceKit
//!
//! Provides the settings structure consumed by both processing passes,
//! file persistence and validation. Supports JSON and TOML file formats.
//!
//! Settings are organized into logical sections:
//! - Printer geometry (bed, extrusion width, layer heights, retraction)
//! - Splice policy (offsets, minimum lengths, runout)
//! - Purge strategy (side wipe, tower delta, full purge reduction)
//! - Device behaviour (accessory mode, temperature handling, debugging)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{SettingsError, SettingsResult};

/// Name of the settings file looked up in the user configuration directory
pub const SETTINGS_FILE_NAME: &str = "splicekit.toml";

/// A point on the print bed
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BedPoint {
    pub x: f64,
    pub y: f64,
}

/// Printable bed rectangle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BedSettings {
    /// Bed origin X in mm
    pub origin_x: f64,
    /// Bed origin Y in mm
    pub origin_y: f64,
    /// Bed width in mm
    pub size_x: f64,
    /// Bed depth in mm
    pub size_y: f64,
}

impl Default for BedSettings {
    fn default() -> Self {
        Self {
            origin_x: 0.0,
            origin_y: 0.0,
            size_x: 250.0,
            size_y: 210.0,
        }
    }
}

impl BedSettings {
    /// Whether X lies on the bed; an absent coordinate always does
    pub fn x_on_bed(&self, x: Option<f64>) -> bool {
        x.map_or(true, |x| {
            (self.origin_x..=self.origin_x + self.size_x).contains(&x)
        })
    }

    /// Whether Y lies on the bed; an absent coordinate always does
    pub fn y_on_bed(&self, y: Option<f64>) -> bool {
        y.map_or(true, |y| {
            (self.origin_y..=self.origin_y + self.size_y).contains(&y)
        })
    }

    /// Whether the point lies on the bed
    pub fn contains(&self, x: Option<f64>, y: Option<f64>) -> bool {
        self.x_on_bed(x) && self.y_on_bed(y)
    }
}

/// Printer and slicer facts
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PrinterSettings {
    /// Printable bed; `None` when the bed was never defined
    pub bed: Option<BedSettings>,
    /// Extrusion width in mm
    pub extrusion_width: f64,
    /// Layer height in mm
    pub layer_height: f64,
    /// First layer height in mm
    pub first_layer_height: f64,
    /// Firmware retract length per tool in mm
    pub retract_length: Vec<f64>,
    /// Wipe tower travel feed rate in mm/min
    pub wipe_feedrate: f64,
    /// Wipe tower position configured in the slicer
    pub wipe_tower_position: Option<BedPoint>,
    /// Slicer prints support material
    pub support_material: bool,
    /// Support layers are synchronized with object layers
    pub synced_support: bool,
    /// Slicer prints skirts
    pub skirts: bool,
    /// Slicer removes sparse wipe tower layers
    pub wipe_remove_sparse_layers: bool,
    /// Variable layer height is in use
    pub variable_layer: bool,
}

impl Default for PrinterSettings {
    fn default() -> Self {
        Self {
            bed: Some(BedSettings::default()),
            extrusion_width: 0.45,
            layer_height: 0.2,
            first_layer_height: 0.2,
            retract_length: vec![0.8; 4],
            wipe_feedrate: 2000.0,
            wipe_tower_position: None,
            support_material: false,
            synced_support: false,
            skirts: false,
            wipe_remove_sparse_layers: false,
            variable_layer: false,
        }
    }
}

impl PrinterSettings {
    /// Retract length for a tool, falling back to the first tool's value
    pub fn retract_length_for(&self, tool: Option<usize>) -> f64 {
        tool.and_then(|t| self.retract_length.get(t))
            .or_else(|| self.retract_length.first())
            .copied()
            .unwrap_or(0.0)
    }

    /// Layer markers are numbered (`;LAYER n`) rather than height based
    pub fn uses_layer_numbers(&self) -> bool {
        self.synced_support || !self.support_material
    }
}

/// Splice policy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpliceSettings {
    /// Fixed filament length between splicer and nozzle in mm
    pub splice_offset: f64,
    /// Minimum length of the first splice in mm
    pub min_start_splice_length: f64,
    /// Minimum length of every following splice in mm
    pub min_splice_length: f64,
    /// Extra filament added to the final splice in mm
    pub extra_runout_filament: f64,
    /// Extend short splices by purging more instead of warning
    pub autoadd_splice: bool,
}

impl Default for SpliceSettings {
    fn default() -> Self {
        Self {
            splice_offset: 0.0,
            min_start_splice_length: 100.0,
            min_splice_length: 70.0,
            extra_runout_filament: 150.0,
            autoadd_splice: false,
        }
    }
}

/// Purge strategy selection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PurgeSettings {
    /// Purge by wiping beside the bed instead of into a tower
    pub side_wipe: bool,
    /// Print the tower at a Z offset to absorb skipped layers
    pub tower_delta: bool,
    /// Maximum tower Z offset in mm
    pub max_tower_z_delta: f64,
    /// Regenerate the tower to minimize purge material
    pub full_purge_reduction: bool,
    /// Maximum feed rate for purge extrusions in mm/min
    pub purge_top_speed: f64,
    /// Alternate purge device replaces the side wipe motion
    pub alternate_purge: bool,
    /// Number of primes per alternate purge
    pub alternate_prime: f64,
    /// Blob size of the alternate purge in mm
    pub alternate_blob_size: f64,
}

impl Default for PurgeSettings {
    fn default() -> Self {
        Self {
            side_wipe: false,
            tower_delta: false,
            max_tower_z_delta: 0.0,
            full_purge_reduction: false,
            purge_top_speed: 9999.0,
            alternate_purge: false,
            alternate_prime: 1.0,
            alternate_blob_size: 10.0,
        }
    }
}

/// Splicing device behaviour
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceSettings {
    /// Device is driven by pings embedded in the stream
    pub accessory_mode: bool,
    /// Defer temperature changes around purge blocks
    pub process_temp: bool,
    /// Keep tool selection commands visible in the output
    pub debug_leave_tool_commands: bool,
}

/// Complete processing configuration
///
/// Aggregates all settings sections and provides file I/O operations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Printer geometry and slicer facts
    pub printer: PrinterSettings,
    /// Splice policy
    pub splice: SpliceSettings,
    /// Purge strategy
    pub purge: PurgeSettings,
    /// Device behaviour
    pub device: DeviceSettings,
    /// Material definitions found in the stream
    pub materials: Vec<String>,
}

impl Settings {
    /// Create new settings with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Default settings file in the user configuration directory
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("splicekit").join(SETTINGS_FILE_NAME))
    }

    /// Load settings from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let settings: Self = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content)?
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            toml::from_str(&content)?
        } else {
            return Err(SettingsError::UnsupportedFormat(path.to_path_buf()));
        };

        settings.validate()?;
        tracing::debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Save settings to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;

        let content = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::to_string_pretty(self)?
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            toml::to_string_pretty(self)?
        } else {
            return Err(SettingsError::UnsupportedFormat(path.to_path_buf()));
        };

        std::fs::write(path, content).map_err(|source| SettingsError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Validate settings
    pub fn validate(&self) -> SettingsResult<()> {
        let positive = [
            ("printer.extrusion_width", self.printer.extrusion_width),
            ("printer.layer_height", self.printer.layer_height),
            ("printer.first_layer_height", self.printer.first_layer_height),
            ("purge.purge_top_speed", self.purge.purge_top_speed),
        ];
        for (key, value) in positive {
            if value <= 0.0 {
                return Err(invalid(key, "must be > 0"));
            }
        }

        if self.printer.retract_length.iter().any(|r| *r < 0.0) {
            return Err(invalid("printer.retract_length", "must not be negative"));
        }

        if self.purge.max_tower_z_delta < 0.0 {
            return Err(invalid("purge.max_tower_z_delta", "must not be negative"));
        }

        if let Some(bed) = &self.printer.bed {
            if bed.size_x <= 0.0 || bed.size_y <= 0.0 {
                return Err(invalid("printer.bed", "bed size must be > 0"));
            }
        }

        Ok(())
    }
}

fn invalid(key: &'static str, reason: &'static str) -> SettingsError {
    SettingsError::InvalidSetting { key, reason }
}
