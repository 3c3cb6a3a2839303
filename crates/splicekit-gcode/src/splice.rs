//! Splice accounting
//!
//! Tracks filament consumption per tool and turns every toolchange into a
//! splice record. Splices shorter than the device minimum are either
//! extended by purging more or reported as a filament shortage.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use splicekit_core::Diagnostics;
use splicekit_settings::Settings;

/// A physical join between two filament segments
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SpliceRecord {
    /// Filament position of the splice in mm
    pub extruder_position: f64,
    /// Length of the segment ending at this splice in mm
    pub length: f64,
    /// Tool the segment belongs to
    pub tool: usize,
}

/// Splice policy derived from the settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplicePolicy {
    pub splice_offset: f64,
    pub min_start_splice_length: f64,
    pub min_splice_length: f64,
    pub extra_runout_filament: f64,
    /// Extend short splices instead of reporting them
    pub auto_extend: bool,
}

impl SplicePolicy {
    /// Build the policy; extension only applies when the purge strategy can
    /// absorb extra material
    pub fn from_settings(settings: &Settings, extension_possible: bool) -> Self {
        Self {
            splice_offset: settings.splice.splice_offset,
            min_start_splice_length: settings.splice.min_start_splice_length,
            min_splice_length: settings.splice.min_splice_length,
            extra_runout_filament: settings.splice.extra_runout_filament,
            auto_extend: settings.splice.autoadd_splice && extension_possible,
        }
    }
}

impl Default for SplicePolicy {
    fn default() -> Self {
        Self::from_settings(&Settings::default(), false)
    }
}

/// Running splice and material state
#[derive(Debug, Clone, Default)]
pub struct SpliceTracker {
    policy: SplicePolicy,
    splices: Vec<SpliceRecord>,
    previous_position: f64,
    current_tool: Option<usize>,
    previous_tool: Option<usize>,
    total_extruded: f64,
    extruded_per_tool: BTreeMap<usize, f64>,
    filament_short: BTreeMap<usize, f64>,
    inputs_used: BTreeSet<usize>,
}

impl SpliceTracker {
    pub fn new(policy: SplicePolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn current_tool(&self) -> Option<usize> {
        self.current_tool
    }

    pub fn previous_tool(&self) -> Option<usize> {
        self.previous_tool
    }

    pub fn splices(&self) -> &[SpliceRecord] {
        &self.splices
    }

    pub fn total_extruded(&self) -> f64 {
        self.total_extruded
    }

    pub fn extruded_per_tool(&self) -> &BTreeMap<usize, f64> {
        &self.extruded_per_tool
    }

    /// Shortfall per incoming tool, maximum over all short splices
    pub fn filament_short(&self) -> &BTreeMap<usize, f64> {
        &self.filament_short
    }

    pub fn inputs_used(&self) -> &BTreeSet<usize> {
        &self.inputs_used
    }

    /// Account for filament pushed through the nozzle by the current tool
    pub fn record_extrusion(&mut self, length: f64) {
        self.total_extruded += length;
        if let Some(tool) = self.current_tool {
            *self.extruded_per_tool.entry(tool).or_insert(0.0) += length;
        }
    }

    /// Process a change to `new_tool`, `None` being the final unload
    ///
    /// Returns the length added to the splice to reach the minimum, which
    /// the caller must purge in addition to the regular purge.
    pub fn process_toolchange(
        &mut self,
        new_tool: Option<usize>,
        layer: Option<usize>,
        diagnostics: &mut Diagnostics,
    ) -> f64 {
        if new_tool == self.current_tool {
            return 0.0;
        }

        let mut position = self.total_extruded + self.policy.splice_offset;
        match new_tool {
            None => {
                let extra = self.policy.extra_runout_filament;
                position += extra;
                self.record_extrusion(extra);
            }
            Some(tool) => {
                self.inputs_used.insert(tool);
            }
        }

        let mut auto_added = 0.0;
        if let Some(current) = self.current_tool {
            let length = position - self.previous_position;
            let (minimum, kind) = if self.splices.is_empty() {
                (self.policy.min_start_splice_length, "First splice")
            } else {
                (self.policy.min_splice_length, "Short splice")
            };

            if length < minimum {
                let shortfall = minimum - length;
                if self.policy.auto_extend {
                    auto_added = shortfall;
                    tracing::debug!(tool = current, auto_added, "Splice extended");
                } else {
                    diagnostics.warn(format!(
                        "{} ({:.1}mm) too short in layer {}. Minimal length is {:.1}mm",
                        kind,
                        length,
                        layer.map_or_else(|| "-".to_string(), |l| l.to_string()),
                        minimum
                    ));
                    if let Some(tool) = new_tool {
                        let short = self.filament_short.entry(tool).or_insert(0.0);
                        *short = short.max(shortfall);
                    }
                }
            }

            let record = SpliceRecord {
                extruder_position: position + auto_added,
                length: length + auto_added,
                tool: current,
            };
            self.previous_position = record.extruder_position;
            self.splices.push(record);
        }

        self.previous_tool = self.current_tool;
        self.current_tool = new_tool;
        auto_added
    }
}
