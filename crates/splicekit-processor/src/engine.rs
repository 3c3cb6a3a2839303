//! Second pass: the rewrite engine
//!
//! Walks the classified instructions once, in order, deciding for each one
//! whether it is emitted as is, rewritten or suppressed into a comment, and
//! which generated lines go before or after it. The result of every step is
//! a [`Rewrite`], so a single instruction can be examined in isolation.

use splicekit_core::Diagnostics;
use splicekit_gcode::{
    format_number, BlockClass, GcodeCommand, LayerPlan, Marker, TowerBounds,
};
use splicekit_settings::Settings;

use crate::collaborators::Collaborators;
use crate::context::{PurgeStrategy, ProcessorContext};

/// Lines between progress reports
const PROGRESS_INTERVAL: usize = 5000;

/// Retract tolerance when detecting double retracts, mm
const RETRACT_EPSILON: f64 = 0.02;

/// Outstanding retraction that triggers an unretract fix-up, mm
const UNRETRACT_EPSILON: f64 = 0.01;

/// Feed rate of realignment moves, mm/min
const REALIGN_FEEDRATE: f64 = 8640.0;

/// Feed rate of tower delta Z moves, mm/min
const Z_MOVE_FEEDRATE: f64 = 10810.0;

/// Feed rate of the retract issued when a purge is entered, mm/min
const PURGE_RETRACT_FEEDRATE: f64 = 3000.0;

/// Setting commands emitted without any processing
const PASSTHROUGH_COMMANDS: [&str; 16] = [
    "M140", "M190", "M73", "M84", "M201", "M203", "M204", "M205", "M207", "M208", "G28", "G90",
    "M115", "G80", "G21", "M907",
];

const SEPARATOR: &str = ";------------------------------";

/// What happened to the instruction itself
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Emitted, possibly with modified parameters
    Emit,
    /// Turned into a comment
    Suppress,
}

/// Outcome of rewriting one instruction
#[derive(Debug, Clone, PartialEq)]
pub struct Rewrite {
    /// Generated lines emitted before the instruction
    pub inserted: Vec<String>,
    /// The instruction as written to the output
    pub instruction: String,
    pub disposition: Disposition,
    /// Generated lines emitted after the instruction
    pub trailing: Vec<String>,
}

impl Rewrite {
    /// All output lines in order
    pub fn lines(self) -> impl Iterator<Item = String> {
        self.inserted
            .into_iter()
            .chain(std::iter::once(self.instruction))
            .chain(self.trailing)
    }
}

/// Pass-two state machine
pub struct RewriteEngine<'a> {
    settings: &'a Settings,
    layers: LayerPlan,
    tower: TowerBounds,
    ctx: ProcessorContext,
    collaborators: Collaborators,
    diagnostics: &'a mut Diagnostics,
    index: usize,
    next_layer: usize,
    previous_class: Option<BlockClass>,
}

impl<'a> RewriteEngine<'a> {
    /// Create the engine from the finalized first pass results
    pub fn new(
        settings: &'a Settings,
        layers: LayerPlan,
        tower: TowerBounds,
        ctx: ProcessorContext,
        collaborators: Collaborators,
        diagnostics: &'a mut Diagnostics,
    ) -> Self {
        Self {
            settings,
            layers,
            tower,
            ctx,
            collaborators,
            diagnostics,
            index: 0,
            next_layer: 0,
            previous_class: None,
        }
    }

    pub fn context(&self) -> &ProcessorContext {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut ProcessorContext {
        &mut self.ctx
    }

    pub fn layers(&self) -> &LayerPlan {
        &self.layers
    }

    pub fn tower(&self) -> &TowerBounds {
        &self.tower
    }

    /// Consume the engine, returning the final context
    pub fn into_context(self) -> ProcessorContext {
        self.ctx
    }

    /// Rewrite a whole instruction sequence
    ///
    /// Progress is reported from 50 to 100 percent.
    pub fn run(&mut self, instructions: Vec<GcodeCommand>) -> Vec<String> {
        let total = instructions.len().max(1);
        let mut output = Vec::with_capacity(instructions.len());

        for (index, instruction) in instructions.into_iter().enumerate() {
            if index % PROGRESS_INTERVAL == 0 {
                self.diagnostics.progress(50 + (50 * index / total) as u64);
            }
            output.extend(self.process(instruction).lines());
        }

        self.diagnostics.progress(100);
        output
    }

    /// Rewrite the next instruction of the sequence
    pub fn process(&mut self, mut g: GcodeCommand) -> Rewrite {
        let class = g.class;
        let mut inserted = Vec::new();
        let mut trailing = Vec::new();

        self.advance_layer();
        self.rewrite(&mut g, &mut inserted, &mut trailing);

        self.previous_class = Some(class);
        self.index += 1;

        for line in &inserted {
            self.account(&GcodeCommand::parse(line.as_str()));
        }
        self.account(&g);
        for line in &trailing {
            self.account(&GcodeCommand::parse(line.as_str()));
        }

        let disposition = if g.is_comment() && !g.is_comment_line() {
            Disposition::Suppress
        } else {
            Disposition::Emit
        };

        Rewrite {
            inserted,
            instruction: g.to_string(),
            disposition,
            trailing,
        }
    }

    fn advance_layer(&mut self) {
        if let Some(&start) = self.layers.starts().get(self.next_layer) {
            if self.index >= start {
                self.ctx.layer = Some(self.next_layer);
                self.next_layer += 1;
            }
        }
    }

    /// Count emitted extrusion towards the material totals
    fn account(&mut self, g: &GcodeCommand) {
        if !g.is_movement() {
            return;
        }
        if let Some(e) = g.e() {
            self.ctx
                .splices
                .record_extrusion(e * self.ctx.extrusion_multiplier);
        }
    }

    fn rewrite(&mut self, g: &mut GcodeCommand, out: &mut Vec<String>, trailing: &mut Vec<String>) {
        if self.ctx.strategy == PurgeStrategy::FullPurgeReduction
            && g.is_comment_line()
            && Marker::parse(g.raw()) == Some(Marker::BrimEnd)
        {
            self.create_tower(out);
        }

        if g.command().is_none() {
            return;
        }

        // firmware retracts take part in the retraction bookkeeping of moves
        if g.is_movement() || g.is_retract() || g.is_unretract() {
            self.rewrite_movement(g, out, trailing);
        } else {
            self.rewrite_setting(g);
        }
    }

    fn rewrite_setting(&mut self, g: &mut GcodeCommand) {
        if let Some(tool) = g.tool_selection() {
            let added = self
                .ctx
                .splices
                .process_toolchange(Some(tool), self.ctx.layer, self.diagnostics);
            self.ctx.side_wipe_length += added;
            if !self.settings.device.debug_leave_tool_commands {
                g.suppress("Color Change");
            }
            self.ctx.toolchange_processed = true;
            return;
        }

        let command = g.command().unwrap_or_default().to_string();
        if PASSTHROUGH_COMMANDS.contains(&command.as_str()) {
            return;
        }

        match command.as_str() {
            "M104" | "M109" => self.defer_temperature(g),
            "M107" => self.ctx.fan_speed = 0.0,
            "M106" => self.ctx.fan_speed = g.get_parameter('S', self.ctx.fan_speed),
            "M221" => {
                self.ctx.extrusion_multiplier =
                    g.get_parameter('S', self.ctx.extrusion_multiplier * 100.0) / 100.0;
            }
            "M220" => g.suppress("Feed Rate Adjustments are removed"),
            "G4" if g.class == BlockClass::ToolUnload => g.suppress("tool unload"),
            "M900"
                if g.class == BlockClass::ToolUnload && g.get_parameter('K', 0.0) == 0.0 =>
            {
                g.suppress("tool unload")
            }
            _ => {}
        }
    }

    /// Hold temperature changes inside toolchange blocks until the purge
    fn defer_temperature(&mut self, g: &mut GcodeCommand) {
        let ctx = &mut self.ctx;
        if !self.settings.device.process_temp || !g.class.is_toolchange() {
            g.add_comment(" Unprocessed temp ");
            ctx.new_temp = g.get_parameter('S', ctx.current_temp);
            ctx.current_temp = ctx.new_temp;
            return;
        }

        ctx.new_temp = g.get_parameter('S', ctx.current_temp);
        let change = format!(
            "{}-->{}",
            format_number(ctx.current_temp),
            format_number(ctx.new_temp)
        );
        if ctx.new_temp >= ctx.current_temp {
            g.set_command("M109");
            ctx.stashed_temp_rise = Some(g.to_string());
            g.suppress(&format!("delayed temp rise until after purge {}", change));
            ctx.current_temp = ctx.new_temp;
        } else {
            ctx.stashed_temp_drop = Some(g.to_string());
            g.suppress(&format!("delayed temp drop until after purge {}", change));
        }
    }

    fn rewrite_movement(
        &mut self,
        g: &mut GcodeCommand,
        out: &mut Vec<String>,
        trailing: &mut Vec<String>,
    ) {
        let class = g.class;
        let previous_class = self.previous_class.unwrap_or(class);
        let class_update = class != previous_class;
        let strategy = self.ctx.strategy;
        // classified before any parameter is stripped
        let retract = g.is_retract();
        let unretract = g.is_unretract();

        if !class.is_toolchange() && self.ctx.current_temp != self.ctx.new_temp {
            if let Some(command) = self.ctx.stashed_temp_drop.take() {
                out.push(command);
            }
            self.ctx.current_temp = self.ctx.new_temp;
        }

        self.track_keep_position(g);

        if class_update {
            if matches!(class, BlockClass::ToolPurge | BlockClass::Empty) {
                self.ctx.purge_count = 0;
            }
            if class == BlockClass::Brim
                && strategy == PurgeStrategy::SideWipe
                && self.settings.purge.alternate_purge
            {
                self.ctx.side_wipe_length =
                    self.settings.purge.alternate_prime * self.settings.purge.alternate_blob_size;
                self.collaborators.wipe.create_alternate_side_wipe(
                    &mut self.ctx,
                    self.settings,
                    out,
                );
            }
        }

        if matches!(class, BlockClass::ToolStart | BlockClass::ToolUnload) {
            if self.ctx.path_processing || g.z().is_none() {
                g.suppress("tool unload");
            } else {
                for letter in ['X', 'Y', 'F', 'E'] {
                    g.remove_parameter(letter);
                }
            }
            return;
        }

        if class == BlockClass::ToolPurge && !strategy.replaces_purge() {
            if g.e().is_some_and(|e| e > 0.0) {
                let from = self.ctx.position;
                let to_x = g.get_parameter('X', from.x);
                let to_y = g.get_parameter('Y', from.y);
                if !(self.tower.contains(Some(from.x), Some(from.y))
                    && self.tower.contains(Some(to_x), Some(to_y)))
                {
                    g.remove_parameter('E');
                }
            }
        }

        if matches!(class, BlockClass::ToolPurge | BlockClass::Empty)
            && !strategy.replaces_purge()
            && g.e().is_some()
            && g.has_parameter('F')
            && self.ctx.keep_speed > self.settings.purge.purge_top_speed
        {
            g.update_parameter('F', self.settings.purge.purge_top_speed);
            g.add_comment(" purge speed capped");
        }

        if strategy == PurgeStrategy::SideWipe {
            if let Some(bed) = &self.settings.printer.bed {
                let x = g.get_parameter('X', self.ctx.position.x);
                let y = g.get_parameter('Y', self.ctx.position.y);
                if !bed.contains(Some(x), Some(y)) {
                    g.remove_parameter('X');
                    g.remove_parameter('Y');
                }
            }
        }

        if self.ctx.path_processing {
            if self.rewrite_tower_path(g, previous_class, class_update, retract, out) {
                return;
            }
        } else {
            self.realign_purge_entry(g, class_update, out);
        }

        self.settle_movement(g, class_update, (retract, unretract), out, trailing);
    }

    fn track_keep_position(&mut self, g: &GcodeCommand) {
        let ctx = &mut self.ctx;
        ctx.keep_speed = g.get_parameter('F', ctx.keep_speed);
        if let Some(x) = g.x() {
            ctx.previous_purge_keep_x = ctx.purge_keep_x;
            ctx.purge_keep_x = x;
            if self.tower.x_in(Some(x)) {
                ctx.keep_x = x;
            }
        }
        if let Some(y) = g.y() {
            ctx.previous_purge_keep_y = ctx.purge_keep_y;
            ctx.purge_keep_y = y;
            if self.tower.y_in(Some(y)) {
                ctx.keep_y = y;
            }
        }
    }

    /// Tower path handling for side wipe, tower delta and full purge reduction
    ///
    /// Returns true when processing of the instruction is complete.
    fn rewrite_tower_path(
        &mut self,
        g: &mut GcodeCommand,
        previous_class: BlockClass,
        class_update: bool,
        retract: bool,
        out: &mut Vec<String>,
    ) -> bool {
        let class = g.class;
        let strategy = self.ctx.strategy;

        if class == BlockClass::ToNormal && !g.is_comment() {
            g.suppress("post block processing");
            return true;
        }

        if matches!(class, BlockClass::EndPurge | BlockClass::EndGrid)
            && self.tower.contains(g.x(), g.y())
        {
            g.remove_parameter('X');
            g.remove_parameter('Y');
        }

        if strategy == PurgeStrategy::SideWipe {
            if class == BlockClass::Brim {
                g.suppress("side wipe - removed");
                return true;
            }
        } else if class_update && class == BlockClass::ToolPurge {
            out.push(format!(
                "G1 X{} Y{} F{}",
                format_number(self.ctx.keep_x),
                format_number(self.ctx.keep_y),
                format_number(REALIGN_FEEDRATE)
            ));
            self.ctx.position.x = self.ctx.keep_x;
            self.ctx.position.y = self.ctx.keep_y;
        }

        if strategy == PurgeStrategy::TowerDelta && class_update {
            if class == BlockClass::ToolPurge {
                self.enter_tower(out);
                g.suppress("tower delta enter");
                return true;
            }
            if previous_class == BlockClass::ToolPurge {
                self.leave_tower(out);
            }
        }

        if !self.ctx.tower_skipped {
            self.ctx.tower_skipped =
                self.layers.is_skippable(self.ctx.layer) && self.tower.contains(g.x(), g.y());
            if self.ctx.tower_skipped && strategy == PurgeStrategy::TowerDelta {
                self.ctx.tower_z_delta += self.settings.printer.layer_height;
                out.push(SEPARATOR.to_string());
                out.push(format!(
                    ";  GRID SKIP --TOWER DELTA {:6.2}mm",
                    self.ctx.tower_z_delta
                ));
                out.push(SEPARATOR.to_string());
                tracing::debug!(
                    layer = ?self.ctx.layer,
                    delta = self.ctx.tower_z_delta,
                    "Tower layer skipped"
                );
            }
        }

        if previous_class == BlockClass::EndGrid && class == BlockClass::Normal {
            self.ctx.tower_skipped = false;
        }

        if self.ctx.tower_skipped {
            if retract {
                if self.is_double_retract() {
                    g.suppress("tower skipped//Double Retract");
                } else {
                    self.ctx.retraction += g.e().unwrap_or(-1.0);
                }
            } else if g.z().is_none() {
                g.suppress("tower skipped");
            }
            return true;
        }

        if strategy == PurgeStrategy::TowerDelta
            && g.e().is_some()
            && matches!(class, BlockClass::ToolUnload | BlockClass::ToolPurge)
            && !(self.tower.x_in_range(g.x()) && self.tower.y_in_range(g.y()))
        {
            g.remove_parameter('E');
        }

        if strategy == PurgeStrategy::FullPurgeReduction
            && class == BlockClass::Normal
            && class_update
        {
            self.collaborators
                .tower
                .generate_sequence(&mut self.ctx, self.settings, out);
        }

        false
    }

    /// Ping driven mode: move back onto the tower when a purge starts
    fn realign_purge_entry(
        &mut self,
        g: &mut GcodeCommand,
        class_update: bool,
        out: &mut Vec<String>,
    ) {
        if class_update && matches!(g.class, BlockClass::ToolPurge | BlockClass::Empty) {
            self.collaborators
                .pings
                .check_pre_purge(&mut self.ctx, self.settings, out);
            self.ctx.enter_purge = true;
        }

        if !self.ctx.enter_purge {
            return;
        }
        self.ctx.enter_purge = false;

        let ctx = &self.ctx;
        let (mut x, mut y) = (
            if g.x().is_some() { ctx.previous_purge_keep_x } else { ctx.purge_keep_x },
            if g.y().is_some() { ctx.previous_purge_keep_y } else { ctx.purge_keep_y },
        );
        if !self.tower.contains(Some(x), Some(y)) {
            x = ctx.purge_keep_x;
            y = ctx.purge_keep_y;
        }

        if self.ctx.retraction == 0.0 {
            self.collaborators.wipe.retract(
                &mut self.ctx,
                self.settings,
                Some(PURGE_RETRACT_FEEDRATE),
                out,
            );
        }

        if let Some(rise) = self.ctx.stashed_temp_rise.take() {
            let (off_x, off_y) = self.off_tower_position();
            out.push(format!(
                "G1 X{:.3} Y{:.3} F{}; Move outside of tower to prevent ooze problems",
                off_x,
                off_y,
                format_number(REALIGN_FEEDRATE)
            ));
            out.push(rise);
            self.ctx.position.x = off_x;
            self.ctx.position.y = off_y;
        }

        out.push(format!(
            "G1 X{:.3} Y{:.3} F{}; Realign to purge position",
            self.ctx.purge_keep_x,
            self.ctx.purge_keep_y,
            format_number(REALIGN_FEEDRATE)
        ));
        self.ctx.position.x = x;
        self.ctx.position.y = y;

        g.remove_parameter('E');
        if g.x() == Some(x) {
            g.remove_parameter('X');
        }
        if g.parameters().is_empty() {
            g.suppress("-useless command-");
        }
    }

    /// Point just inside the tower edge nearest to the purge position
    fn off_tower_position(&self) -> (f64, f64) {
        let width = self.settings.printer.extrusion_width;
        let x_offset = 2.0 + 4.0 * width;
        let y_offset = 2.0 + 8.0 * width;
        let keep_x = self.ctx.purge_keep_x;
        let keep_y = self.ctx.purge_keep_y;
        let tower = &self.tower;

        let x = if (tower.min_x - keep_x).abs() < (tower.max_x - keep_x).abs() {
            tower.min_x + x_offset
        } else {
            tower.max_x - x_offset
        };
        let y = if (tower.min_y - keep_y).abs() < (tower.max_y - keep_y).abs() {
            tower.min_y + y_offset
        } else {
            tower.max_y - y_offset
        };
        (x, y)
    }

    /// Retraction consistency, purge collection and position bookkeeping
    fn settle_movement(
        &mut self,
        g: &mut GcodeCommand,
        class_update: bool,
        (retract, unretract): (bool, bool),
        out: &mut Vec<String>,
        trailing: &mut Vec<String>,
    ) {
        let class = g.class;
        let strategy = self.ctx.strategy;

        if self.ctx.expect_retract && (g.x().is_some() || g.y().is_some()) {
            if !self.ctx.is_retracted() && g.e().is_some_and(|e| e < 0.0) {
                self.collaborators
                    .wipe
                    .retract(&mut self.ctx, self.settings, None, out);
            }
            self.ctx.expect_retract = false;
        }

        if retract {
            if let Some((x, y)) = self.ctx.retract_move.take() {
                g.update_parameter('X', x);
                g.update_parameter('Y', y);
            }
        }

        let position = &mut self.ctx.position;
        position.x = g.x().unwrap_or(position.x);
        position.y = g.y().unwrap_or(position.y);
        position.z = g.z().unwrap_or(position.z);

        if class == BlockClass::Brim && strategy == PurgeStrategy::FullPurgeReduction {
            g.suppress("replaced by brim code");
        }

        if strategy.replaces_purge() && class.is_purge() {
            if self.layers.is_skippable(self.ctx.layer) {
                g.suppress("skipped purge");
            } else {
                self.ctx.side_wipe_length += g.e().unwrap_or(0.0);
                g.suppress("side wipe/full purge");
            }
        }

        if self.ctx.toolchange_processed {
            if strategy == PurgeStrategy::SideWipe && class == BlockClass::Normal && class_update {
                if self.settings.purge.alternate_purge {
                    self.collaborators.wipe.create_alternate_side_wipe(
                        &mut self.ctx,
                        self.settings,
                        out,
                    );
                } else {
                    self.collaborators
                        .wipe
                        .create_side_wipe(&mut self.ctx, self.settings, out);
                }
            }
            if class == BlockClass::Normal {
                out.push(";TOOLCHANGE PROCESSED".to_string());
                self.ctx.toolchange_processed = false;
            }
        }

        if retract && g.command().is_some() {
            if self.is_double_retract() {
                g.suppress("Double Retract");
            } else {
                self.ctx.retraction += g.e().unwrap_or(-1.0);
            }
        }

        if unretract && g.command().is_some() {
            match g.e() {
                Some(e) => {
                    let e = e.min(-self.ctx.retraction);
                    g.update_parameter('E', e);
                    self.ctx.retraction += e;
                }
                None => self.ctx.retraction = 0.0,
            }
        }

        if (g.x().is_some() || g.y().is_some())
            && g.e().is_some_and(|e| e > 0.0)
            && self.ctx.retraction < 0.0
            && self.ctx.retraction.abs() > UNRETRACT_EPSILON
        {
            out.push(";fixup retracts".to_string());
            self.collaborators
                .wipe
                .unretract(&mut self.ctx, self.settings, out);
        }

        if self.ctx.accessory_mode {
            let extruded = g.e().unwrap_or(0.0);
            self.collaborators
                .pings
                .on_accessory_extrusion(&mut self.ctx, extruded, trailing);
        }

        if g.e().is_some_and(|e| e > 0.0) && self.ctx.side_wipe_length == 0.0 {
            self.collaborators
                .pings
                .on_connected_extrusion(&mut self.ctx, trailing);
        }

        self.ctx.previous_position = self.ctx.position;
    }

    /// Another retract would exceed the tool's retract length
    fn is_double_retract(&self) -> bool {
        let length = self
            .settings
            .printer
            .retract_length_for(self.ctx.current_tool());
        self.ctx.retraction <= -(length - RETRACT_EPSILON)
    }

    /// Lower the nozzle to the tower height
    fn enter_tower(&mut self, out: &mut Vec<String>) {
        let printer = &self.settings.printer;
        let layer = self.ctx.layer.map_or(-1.0, |l| l as f64);
        let layer_z = layer * printer.layer_height + printer.first_layer_height;
        let purge_height = layer_z - self.ctx.tower_z_delta;
        let current_z = self.ctx.position.z;

        if (current_z - purge_height).abs() < f64::EPSILON {
            return;
        }

        self.ctx.max_tower_delta = self.ctx.max_tower_delta.max(self.ctx.tower_z_delta);
        out.push(SEPARATOR.to_string());
        out.push(";  TOWER DELTA ENTER".to_string());
        out.push(format!(
            ";  Current Z-Height = {:.2};  Tower height = {:.2}; delta = {:.2} [ {:.2} ]",
            current_z,
            purge_height,
            current_z - purge_height,
            layer_z
        ));
        if self.ctx.retraction >= 0.0 {
            self.collaborators
                .wipe
                .retract(&mut self.ctx, self.settings, None, out);
        }
        out.push(format!(
            "G1 Z{:.2} F{}",
            purge_height,
            format_number(Z_MOVE_FEEDRATE)
        ));
        out.push(SEPARATOR.to_string());

        let wipe_feedrate = self.settings.printer.wipe_feedrate;
        let feedrate = if purge_height <= 0.21 {
            wipe_feedrate.min(1200.0)
        } else {
            wipe_feedrate
        };
        out.push(format!("G1 F{}", format_number(feedrate)));
    }

    /// Return the nozzle to the model height
    fn leave_tower(&mut self, out: &mut Vec<String>) {
        let current_z = self.ctx.position.z;
        out.push(SEPARATOR.to_string());
        out.push(";  TOWER DELTA LEAVE".to_string());
        out.push(format!(";  Returning to Current Z-Height = {:.2}", current_z));
        out.push(format!(
            "G1 Z{:.2} F{}",
            current_z,
            format_number(Z_MOVE_FEEDRATE)
        ));
        out.push(SEPARATOR.to_string());
    }

    /// Replace the slicer tower once the brim has been measured
    fn create_tower(&mut self, out: &mut Vec<String>) {
        let layout =
            self.collaborators
                .tower
                .create_layers(&self.tower, &mut self.ctx, self.settings);
        self.diagnostics.info(format!(
            "Tower location ({:.1}, {:.1})-({:.1}, {:.1}), size {:.1}x{:.1}mm",
            self.tower.min_x,
            self.tower.min_y,
            self.tower.max_x,
            self.tower.max_y,
            self.tower.width(),
            self.tower.depth()
        ));
        self.diagnostics.info(format!(
            "Tower layer lengths: solid {:.1}mm, sparse {:.1}mm",
            layout.solid_layer_length, layout.sparse_layer_length
        ));
        self.collaborators
            .tower
            .generate_brim(&mut self.ctx, self.settings, out);
    }
}
