//! Collaborator seams of the rewrite engine
//!
//! Tower generation, wipe motion and ping scheduling are supplied from
//! outside the engine. Each trait method receives the run context and a
//! buffer to append generated lines to. Every method has a default so an
//! implementation only overrides what it actually generates.

use splicekit_gcode::{format_number, TowerBounds};
use splicekit_settings::Settings;

use crate::context::ProcessorContext;

/// Feed rate of a retract generated without an explicit speed, mm/min
pub const DEFAULT_RETRACT_SPEED: f64 = 2100.0;

/// Layer lengths reported by a tower generator
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TowerLayout {
    /// Filament used by a solid tower layer in mm
    pub solid_layer_length: f64,
    /// Filament used by a sparse tower layer in mm
    pub sparse_layer_length: f64,
}

/// Account the collected purge length as extruded and clear it
///
/// For generators whose output carries no extrusion of its own.
pub fn consume_purge(ctx: &mut ProcessorContext) {
    let length = ctx.side_wipe_length * ctx.extrusion_multiplier;
    ctx.splices.record_extrusion(length);
    ctx.side_wipe_length = 0.0;
}

/// Generates a replacement purge tower
pub trait TowerGenerator: Send {
    fn name(&self) -> &str {
        "none"
    }

    /// Lay out the tower inside the measured bounds
    fn create_layers(
        &mut self,
        _bounds: &TowerBounds,
        _ctx: &mut ProcessorContext,
        _settings: &Settings,
    ) -> TowerLayout {
        TowerLayout::default()
    }

    /// Emit the tower brim
    fn generate_brim(
        &mut self,
        _ctx: &mut ProcessorContext,
        _settings: &Settings,
        _out: &mut Vec<String>,
    ) {
    }

    /// Emit the purge sequence for the pending toolchange
    ///
    /// Consumes the collected purge length. The default generates no
    /// moves and only accounts the material.
    fn generate_sequence(
        &mut self,
        ctx: &mut ProcessorContext,
        _settings: &Settings,
        _out: &mut Vec<String>,
    ) {
        consume_purge(ctx);
    }
}

/// Generates wipe motion and filament retracts
pub trait WipeGenerator: Send {
    fn name(&self) -> &str {
        "comment"
    }

    /// Wipe the collected purge length beside the bed
    fn create_side_wipe(
        &mut self,
        ctx: &mut ProcessorContext,
        _settings: &Settings,
        out: &mut Vec<String>,
    ) {
        if ctx.side_wipe_length > 0.0 {
            out.push(format!(";SIDE WIPE {:.2}mm", ctx.side_wipe_length));
        }
        consume_purge(ctx);
    }

    /// Purge the collected length through the alternate purge device
    fn create_alternate_side_wipe(
        &mut self,
        ctx: &mut ProcessorContext,
        _settings: &Settings,
        out: &mut Vec<String>,
    ) {
        out.push(format!(";ALTERNATE PURGE {:.2}mm", ctx.side_wipe_length));
        consume_purge(ctx);
    }

    /// Retract the current tool by its configured retract length
    fn retract(
        &mut self,
        ctx: &mut ProcessorContext,
        settings: &Settings,
        speed: Option<f64>,
        out: &mut Vec<String>,
    ) {
        let length = settings.printer.retract_length_for(ctx.current_tool());
        if length <= 0.0 {
            return;
        }
        out.push(format!(
            "G1 E{} F{}",
            format_number(-length),
            format_number(speed.unwrap_or(DEFAULT_RETRACT_SPEED))
        ));
        ctx.retraction -= length;
    }

    /// Undo the outstanding retraction
    fn unretract(
        &mut self,
        ctx: &mut ProcessorContext,
        _settings: &Settings,
        out: &mut Vec<String>,
    ) {
        if ctx.retraction >= 0.0 {
            return;
        }
        out.push(format!(
            "G1 E{} F{}",
            format_number(-ctx.retraction),
            format_number(DEFAULT_RETRACT_SPEED)
        ));
        ctx.retraction = 0.0;
    }
}

/// Schedules device pings
pub trait PingScheduler: Send {
    fn name(&self) -> &str {
        "none"
    }

    /// Called when a purge block is entered in ping driven mode
    fn check_pre_purge(
        &mut self,
        _ctx: &mut ProcessorContext,
        _settings: &Settings,
        _out: &mut Vec<String>,
    ) {
    }

    /// Called after every emitted instruction in accessory mode
    fn on_accessory_extrusion(
        &mut self,
        _ctx: &mut ProcessorContext,
        _extruded: f64,
        _out: &mut Vec<String>,
    ) {
    }

    /// Called after every extruding move while no side wipe is pending
    fn on_connected_extrusion(&mut self, _ctx: &mut ProcessorContext, _out: &mut Vec<String>) {}
}

/// Tower generator that generates nothing
#[derive(Debug, Default)]
pub struct NoTower;

impl TowerGenerator for NoTower {}

/// Wipe generator that documents wipes as comments and emits plain retracts
#[derive(Debug, Default)]
pub struct CommentWipe;

impl WipeGenerator for CommentWipe {}

/// Ping scheduler that never pings
#[derive(Debug, Default)]
pub struct NoPings;

impl PingScheduler for NoPings {}

/// The collaborators used by one run
pub struct Collaborators {
    pub tower: Box<dyn TowerGenerator>,
    pub wipe: Box<dyn WipeGenerator>,
    pub pings: Box<dyn PingScheduler>,
}

impl Default for Collaborators {
    fn default() -> Self {
        Self {
            tower: Box::new(NoTower),
            wipe: Box::new(CommentWipe),
            pings: Box::new(NoPings),
        }
    }
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators")
            .field("tower", &self.tower.name())
            .field("wipe", &self.wipe.name())
            .field("pings", &self.pings.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_retract_and_unretract() {
        let settings = Settings::new();
        let mut ctx = ProcessorContext::default();
        let mut wipe = CommentWipe;
        let mut out = Vec::new();

        wipe.retract(&mut ctx, &settings, Some(3000.0), &mut out);
        assert_eq!(out, vec!["G1 E-0.8 F3000".to_string()]);
        assert_eq!(ctx.retraction, -0.8);

        wipe.unretract(&mut ctx, &settings, &mut out);
        assert_eq!(out[1], "G1 E0.8 F2100");
        assert_eq!(ctx.retraction, 0.0);

        wipe.unretract(&mut ctx, &settings, &mut out);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_default_side_wipe_consumes_length() {
        let settings = Settings::new();
        let mut ctx = ProcessorContext::default();
        ctx.side_wipe_length = 12.5;
        let mut out = Vec::new();

        CommentWipe.create_side_wipe(&mut ctx, &settings, &mut out);
        assert_eq!(out, vec![";SIDE WIPE 12.50mm".to_string()]);
        assert_eq!(ctx.side_wipe_length, 0.0);
    }

    #[test]
    fn test_default_wipes_account_purged_material() {
        let settings = Settings::new();
        let mut ctx = ProcessorContext::default();
        let mut out = Vec::new();
        let mut diagnostics = splicekit_core::Diagnostics::new();
        ctx.splices.process_toolchange(Some(1), None, &mut diagnostics);
        ctx.extrusion_multiplier = 0.5;

        ctx.side_wipe_length = 40.0;
        CommentWipe.create_side_wipe(&mut ctx, &settings, &mut out);
        ctx.side_wipe_length = 20.0;
        CommentWipe.create_alternate_side_wipe(&mut ctx, &settings, &mut out);
        ctx.side_wipe_length = 10.0;
        NoTower.generate_sequence(&mut ctx, &settings, &mut out);

        assert_eq!(ctx.splices.total_extruded(), 35.0);
        assert_eq!(ctx.splices.extruded_per_tool().get(&1), Some(&35.0));
        assert_eq!(ctx.side_wipe_length, 0.0);
        assert_eq!(
            out,
            vec![";SIDE WIPE 40.00mm".to_string(), ";ALTERNATE PURGE 20.00mm".to_string()]
        );
    }

    #[test]
    fn test_empty_side_wipe_emits_nothing() {
        let settings = Settings::new();
        let mut ctx = ProcessorContext::default();
        let mut out = Vec::new();

        CommentWipe.create_side_wipe(&mut ctx, &settings, &mut out);
        assert!(out.is_empty());
        assert_eq!(ctx.splices.total_extruded(), 0.0);
    }

    #[test]
    fn test_default_collaborators_debug() {
        let collaborators = Collaborators::default();
        let text = format!("{:?}", collaborators);
        assert!(text.contains("comment"));
    }
}
