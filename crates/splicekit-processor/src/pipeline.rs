//! Processing pipeline
//!
//! Glues the two passes together: classification, settings pre-flight,
//! purge strategy resolution, tower skip planning, the rewrite and the
//! closing unload splice. One [`Pipeline`] processes one stream; nothing is
//! shared between runs.

use std::collections::BTreeMap;

use serde::Serialize;
use splicekit_core::{Diagnostic, Diagnostics, Error, ProgressCallback, Result};
use splicekit_gcode::{
    ClassifiedProgram, Classifier, LayerPlan, SplicePolicy, SpliceRecord, TowerBounds,
};
use splicekit_settings::Settings;

use crate::collaborators::Collaborators;
use crate::context::{ProcessorContext, PurgeStrategy};
use crate::engine::RewriteEngine;

/// Skip budget used in side wipe mode, effectively unbounded, mm
const SIDE_WIPE_SKIP_BUDGET: f64 = 999.0;

/// Summary of a processing run
#[derive(Debug, Clone, Serialize)]
pub struct ProcessReport {
    pub strategy: PurgeStrategy,
    pub total_extruded: f64,
    pub extruded_per_tool: BTreeMap<usize, f64>,
    pub splices: Vec<SpliceRecord>,
    pub filament_short: BTreeMap<usize, f64>,
    pub inputs_used: Vec<usize>,
    pub max_tower_delta: f64,
    pub layer_count: usize,
    pub tower: TowerBounds,
    pub diagnostics: Vec<Diagnostic>,
}

impl ProcessReport {
    /// Render the report as pretty printed JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Warnings raised during the run
    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.level >= splicekit_core::MessageLevel::Warning)
    }
}

/// Output lines and report of a run
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub lines: Vec<String>,
    pub report: ProcessReport,
}

/// Two-pass processing pipeline
pub struct Pipeline {
    settings: Settings,
    collaborators: Collaborators,
    progress: Option<ProgressCallback>,
}

impl Pipeline {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            collaborators: Collaborators::default(),
            progress: None,
        }
    }

    /// Replace the tower, wipe and ping collaborators
    pub fn with_collaborators(mut self, collaborators: Collaborators) -> Self {
        self.collaborators = collaborators;
        self
    }

    /// Observe progress as `(percent, 100)`
    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Process a stream of lines
    ///
    /// Fails only when the stream has no layer markers while the resolved
    /// strategy needs them. Every other problem is reported as a diagnostic.
    pub fn run<S: AsRef<str>>(self, lines: &[S]) -> Result<ProcessOutput> {
        let Pipeline {
            mut settings,
            collaborators,
            progress,
        } = self;

        let mut diagnostics = match progress {
            Some(callback) => Diagnostics::new().with_progress(callback),
            None => Diagnostics::new(),
        };

        tracing::info!(lines = lines.len(), "Pre-parsing G-code");
        diagnostics.progress(4);
        let program = Classifier::new(&mut settings, &mut diagnostics).classify(lines);

        preflight(&settings, &mut diagnostics);
        let strategy = resolve_strategy(&settings, &mut diagnostics);
        let path_processing = strategy != PurgeStrategy::Standard;

        if settings.splice.autoadd_splice && !strategy.replaces_purge() {
            diagnostics.warn("AUTOADDPURGE only works with side wipe and full purge reduction");
        }

        if program.layers.is_empty() && path_processing {
            diagnostics.warn("Layer configuration is missing, no output generated");
            return Err(Error::MissingLayerConfiguration {
                diagnostics: diagnostics.into_entries(),
            });
        }

        let ClassifiedProgram {
            instructions,
            mut layers,
            tower,
            ..
        } = program;
        let strategy = plan_tower_skip(strategy, &settings, &mut layers, &mut diagnostics);
        let layer_count = layers.starts().len();

        tracing::info!(%strategy, "Generating processed G-code");
        let ctx = ProcessorContext::new(
            strategy,
            path_processing,
            settings.device.accessory_mode,
            SplicePolicy::from_settings(&settings, strategy.replaces_purge()),
        );
        let mut engine = RewriteEngine::new(
            &settings,
            layers,
            tower,
            ctx,
            collaborators,
            &mut diagnostics,
        );
        let output = engine.run(instructions);
        let mut ctx = engine.into_context();

        let layer = ctx.layer;
        ctx.splices.process_toolchange(None, layer, &mut diagnostics);

        if settings.splice.splice_offset == 0.0 {
            diagnostics.warn("SPLICEOFFSET not defined");
        }

        let report = ProcessReport {
            strategy,
            total_extruded: ctx.splices.total_extruded(),
            extruded_per_tool: ctx.splices.extruded_per_tool().clone(),
            splices: ctx.splices.splices().to_vec(),
            filament_short: ctx.splices.filament_short().clone(),
            inputs_used: ctx.splices.inputs_used().iter().copied().collect(),
            max_tower_delta: ctx.max_tower_delta,
            layer_count,
            tower,
            diagnostics: diagnostics.into_entries(),
        };

        tracing::info!(
            splices = report.splices.len(),
            total = report.total_extruded,
            "Processing complete"
        );
        Ok(ProcessOutput {
            lines: output,
            report,
        })
    }
}

/// Warn about settings combinations that will not print correctly
fn preflight(settings: &Settings, diagnostics: &mut Diagnostics) {
    match &settings.printer.bed {
        None => {
            diagnostics.warn("Bed size not correctly defined. The generated file will NOT print")
        }
        Some(bed) => {
            diagnostics.info(format!(
                "Bed origin ({:.1}mm, {:.1}mm)",
                bed.origin_x, bed.origin_y
            ));
            diagnostics.info(format!("Bed size ({:.1}mm, {:.1}mm)", bed.size_x, bed.size_y));
        }
    }

    let purge = &settings.purge;
    if (purge.tower_delta || purge.full_purge_reduction) && settings.printer.variable_layer {
        diagnostics.warn(
            "Variable layers are not compatible with full purge reduction or tower delta",
        );
    }

    if settings.device.process_temp {
        let tower_delta = purge.tower_delta || purge.max_tower_z_delta > 0.0;
        if purge.side_wipe {
            diagnostics.warn("TEMPERATURECONTROL and side wipe are not compatible");
        } else if purge.full_purge_reduction || tower_delta {
            // the stashed rise is only replayed on the ping driven purge entry
            diagnostics.warn(
                "TEMPERATURECONTROL with full purge reduction or tower delta \
                 drops delayed temperature rises",
            );
        }
    }
}

/// Pick the one purge strategy the run uses
///
/// Side wipe wins over full purge reduction, which wins over tower delta.
pub fn resolve_strategy(settings: &Settings, diagnostics: &mut Diagnostics) -> PurgeStrategy {
    let purge = &settings.purge;
    let tower_off_bed = match (&settings.printer.bed, &settings.printer.wipe_tower_position) {
        (Some(bed), Some(position)) => !bed.contains(Some(position.x), Some(position.y)),
        _ => false,
    };
    let side_wipe = purge.side_wipe || tower_off_bed;
    let tower_delta = purge.tower_delta || purge.max_tower_z_delta > 0.0;

    if side_wipe {
        if settings.printer.skirts {
            diagnostics.warn(
                "SIDEWIPE and SKIRTS are not compatible, this file will not print correctly",
            );
        }
        if settings.printer.wipe_remove_sparse_layers {
            diagnostics.warn(
                "SIDEWIPE is not compatible with sparse wipe tower layers, \
                 this file will not print correctly",
            );
        }
        if purge.full_purge_reduction {
            diagnostics.warn(
                "Full purge reduction is not compatible with side wipe, performing side wipe",
            );
        }
        diagnostics.info("Side wipe activated");
        return PurgeStrategy::SideWipe;
    }

    if purge.full_purge_reduction {
        if tower_delta {
            diagnostics.warn(
                "Full purge reduction is not compatible with tower delta, \
                 performing full purge reduction",
            );
        }
        diagnostics.info("Full purge reduction activated");
        return PurgeStrategy::FullPurgeReduction;
    }

    if tower_delta {
        return PurgeStrategy::TowerDelta;
    }

    PurgeStrategy::Standard
}

/// Run the skip optimizer for the strategies that skip tower layers
fn plan_tower_skip(
    strategy: PurgeStrategy,
    settings: &Settings,
    layers: &mut LayerPlan,
    diagnostics: &mut Diagnostics,
) -> PurgeStrategy {
    let layer_height = settings.printer.layer_height;
    let first_layer_eligible =
        strategy == PurgeStrategy::SideWipe || settings.purge.alternate_purge;

    match strategy {
        PurgeStrategy::TowerDelta => {
            let outcome = layers.optimize_tower_skip(
                settings.purge.max_tower_z_delta,
                layer_height,
                first_layer_eligible,
            );
            if outcome.layers == 0 {
                layers.clear_skippable();
                diagnostics.info("Tower purge delta could not be applied to this print");
                PurgeStrategy::Standard
            } else {
                diagnostics.warn(format!(
                    "Purge tower delta in effect: {} layers or {:.2}mm",
                    outcome.layers, outcome.height
                ));
                PurgeStrategy::TowerDelta
            }
        }
        PurgeStrategy::SideWipe => {
            layers.optimize_tower_skip(SIDE_WIPE_SKIP_BUDGET, layer_height, first_layer_eligible);
            PurgeStrategy::SideWipe
        }
        other => other,
    }
}
