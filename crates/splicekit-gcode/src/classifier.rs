//! First pass: block classification
//!
//! Walks the stream once, tagging every instruction with the block it
//! belongs to. Marker comments drive the block state machine, layer
//! comments build the [`LayerPlan`], the first layer brim measures the
//! [`TowerBounds`] and configuration directives update the settings.

use regex::Regex;
use std::sync::OnceLock;

use splicekit_core::Diagnostics;
use splicekit_settings::{Directive, Settings};

use crate::gcode::{BlockClass, GcodeCommand, Marker};
use crate::layers::LayerPlan;
use crate::tower::TowerBounds;

/// Lines between progress reports
const PROGRESS_INTERVAL: usize = 5000;

fn layer_regex() -> &'static Regex {
    static LAYER_REGEX: OnceLock<Regex> = OnceLock::new();
    LAYER_REGEX.get_or_init(|| Regex::new(r"^;\s*LAYER\s+(\d+)").expect("invalid regex pattern"))
}

fn layer_height_regex() -> &'static Regex {
    static LAYER_HEIGHT_REGEX: OnceLock<Regex> = OnceLock::new();
    LAYER_HEIGHT_REGEX.get_or_init(|| {
        Regex::new(r"^;\s*LAYERHEIGHT\s+(\d+(\.\d+)?)").expect("invalid regex pattern")
    })
}

/// A tool selection found in the stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolchangeEvent {
    /// Selected tool
    pub tool: usize,
    /// Index of the selecting instruction
    pub position: usize,
}

/// Output of the first pass, consumed read-only by the second
#[derive(Debug, Clone, Default)]
pub struct ClassifiedProgram {
    pub instructions: Vec<GcodeCommand>,
    pub layers: LayerPlan,
    pub tower: TowerBounds,
    pub toolchanges: Vec<ToolchangeEvent>,
}

/// Pass-one state machine
pub struct Classifier<'a> {
    settings: &'a mut Settings,
    diagnostics: &'a mut Diagnostics,
    block: BlockClass,
    previous_block: BlockClass,
    backpass_line: Option<usize>,
    measuring: bool,
    layer_toolchanges: usize,
    layer_empty_grids: usize,
    last_layer: i64,
    program: ClassifiedProgram,
}

impl<'a> Classifier<'a> {
    pub fn new(settings: &'a mut Settings, diagnostics: &'a mut Diagnostics) -> Self {
        Self {
            settings,
            diagnostics,
            block: BlockClass::Normal,
            previous_block: BlockClass::Normal,
            backpass_line: None,
            measuring: false,
            layer_toolchanges: 0,
            layer_empty_grids: 0,
            last_layer: -1,
            program: ClassifiedProgram::default(),
        }
    }

    /// Classify a whole stream
    ///
    /// Progress is reported from 4 to 50 percent.
    pub fn classify<S: AsRef<str>>(mut self, lines: &[S]) -> ClassifiedProgram {
        let total = lines.len().max(1);
        self.program.instructions.reserve(lines.len());

        for (index, line) in lines.iter().enumerate() {
            if index % PROGRESS_INTERVAL == 0 {
                self.diagnostics
                    .progress(4 + (46 * index / total) as u64);
            }
            self.step(line.as_ref());
        }

        tracing::debug!(
            instructions = self.program.instructions.len(),
            layers = self.program.layers.records().len(),
            toolchanges = self.program.toolchanges.len(),
            "First pass complete"
        );
        self.program
    }

    /// Classify one line
    pub fn step(&mut self, line: &str) {
        let index = self.program.instructions.len();
        let line = line.trim();
        self.previous_block = self.block;

        let mut command = GcodeCommand::parse(line);

        if line.starts_with(';') {
            if line.starts_with("; CP") {
                if let Some(marker) = Marker::parse(line) {
                    self.apply_marker(marker);
                }
            } else if let Some(layer) = self.match_layer(line) {
                self.enter_layer(layer, index);
            } else if let Some(directive) = Directive::parse(line) {
                if let Err(e) = self.settings.apply_directive(&directive) {
                    self.diagnostics.warn_at(index, e.to_string());
                }
            }
        } else if let Some(tool) = command.tool_selection() {
            self.block = BlockClass::ToolPurge;
            self.program.toolchanges.push(ToolchangeEvent {
                tool,
                position: index,
            });
        }

        command.class = self.block;
        let (x, y) = (command.x(), command.y());
        let is_movement = command.is_movement();
        self.program.instructions.push(command);

        if self.block != self.previous_block && self.block.triggers_backpass() {
            let from = self.backpass_line.unwrap_or(index).min(index);
            for instruction in &mut self.program.instructions[from..] {
                instruction.class = self.block;
            }
        }

        if self.measuring {
            self.program
                .tower
                .grow(x, y, self.settings.printer.extrusion_width);
        } else if is_movement && self.program.tower.contains(x, y) {
            self.backpass_line = Some(index);
        }

        if matches!(self.block, BlockClass::EndGrid | BlockClass::EndPurge)
            && x.is_some()
            && y.is_some()
            && !self.program.tower.contains(x, y)
        {
            self.block = BlockClass::Normal;
            if let Some(last) = self.program.instructions.last_mut() {
                last.class = BlockClass::Normal;
            }
        }

        if self.block == BlockClass::BrimEnd {
            self.block = BlockClass::Normal;
        }
    }

    fn apply_marker(&mut self, marker: Marker) {
        self.block = match marker {
            Marker::EmptyGridStart => {
                self.layer_empty_grids += 1;
                BlockClass::Empty
            }
            Marker::EmptyGridEnd => BlockClass::EndGrid,
            Marker::ToolchangeStart => {
                self.layer_toolchanges += 1;
                BlockClass::ToolStart
            }
            Marker::ToolchangeUnload => BlockClass::ToolUnload,
            Marker::ToolchangeWipe => BlockClass::ToolPurge,
            Marker::ToolchangeEnd => match self.previous_block {
                BlockClass::ToolUnload => BlockClass::Normal,
                BlockClass::ToolPurge => BlockClass::EndPurge,
                _ => BlockClass::ToNormal,
            },
            Marker::BrimStart => {
                self.measuring = true;
                BlockClass::Brim
            }
            Marker::BrimEnd => {
                self.measuring = false;
                self.program.tower.freeze();
                BlockClass::BrimEnd
            }
        };
    }

    /// Layer number announced by a layer comment
    ///
    /// Height based markers map to a layer index in hundredths of a
    /// millimetre and fall back to the last parsed layer when the height
    /// is not a whole number of layers above the first.
    fn match_layer(&self, line: &str) -> Option<i64> {
        let printer = &self.settings.printer;
        if printer.uses_layer_numbers() {
            let caps = layer_regex().captures(line)?;
            return Some(caps[1].parse::<i64>().unwrap_or(-1));
        }

        let caps = layer_height_regex().captures(line)?;
        let height = caps[1].parse::<f64>().ok()?;
        let first = (printer.first_layer_height * 100.0) as i64;
        let level = ((height + 0.001) * 100.0) as i64 - first;
        let step = (printer.layer_height * 100.0) as i64;
        if step > 0 && level % step == 0 {
            Some(level / step)
        } else {
            Some(self.last_layer)
        }
    }

    fn enter_layer(&mut self, layer: i64, index: usize) {
        if layer < 0 || layer == self.last_layer {
            return;
        }
        self.last_layer = layer;
        let skippable = self.layer_empty_grids > 0 && self.layer_toolchanges == 0;
        self.program
            .layers
            .start_layer(index, layer as usize, skippable);
        if layer > 0 {
            self.layer_empty_grids = 0;
            self.layer_toolchanges = 0;
        }
    }
}
