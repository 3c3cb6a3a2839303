//! Layer index and tower skip planning

use serde::Serialize;

/// Tolerance when comparing the skipped height against the budget
const SKIP_EPSILON: f64 = 0.005;

/// Per-layer facts gathered by the first pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LayerRecord {
    /// Layer number
    pub layer: usize,
    /// Input line index at which the layer ends
    pub end_line: usize,
    /// Tower content of the layer is pure filler
    pub skippable: bool,
}

/// Result of a skip optimization run
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct SkipOutcome {
    /// Layers left flagged as skippable
    pub layers: usize,
    /// Tower height those layers absorb
    pub height: f64,
    /// A positive budget found nothing to skip and all flags were cleared
    pub disabled: bool,
}

/// Layer boundaries and skippable flags
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayerPlan {
    starts: Vec<usize>,
    records: Vec<LayerRecord>,
}

impl LayerPlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record layer `number` starting at `line`
    ///
    /// Every layer above layer 0 closes a record carrying the skippable
    /// flag of the layer below.
    pub fn start_layer(&mut self, line: usize, number: usize, previous_skippable: bool) {
        if number > 0 {
            self.records.push(LayerRecord {
                layer: self.records.len(),
                end_line: line,
                skippable: previous_skippable,
            });
        }
        self.starts.push(line);
    }

    /// Input line indices at which layers start, strictly increasing
    pub fn starts(&self) -> &[usize] {
        &self.starts
    }

    /// Closed layers
    pub fn records(&self) -> &[LayerRecord] {
        &self.records
    }

    /// No layer transition was ever closed
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Skippable flag of a layer, false for unknown layers
    pub fn is_skippable(&self, layer: Option<usize>) -> bool {
        layer
            .and_then(|l| self.records.get(l))
            .is_some_and(|r| r.skippable)
    }

    /// Clear every skippable flag
    pub fn clear_skippable(&mut self) {
        for record in &mut self.records {
            record.skippable = false;
        }
    }

    /// Keep only as many trailing skippable layers as the budget absorbs
    ///
    /// Walks the layers from last to first accumulating `layer_height` for
    /// every skippable layer. Once the accumulated height reaches the budget
    /// all remaining earlier layers are forced non-skippable. The first layer
    /// only takes part when `first_layer_eligible` is set.
    pub fn optimize_tower_skip(
        &mut self,
        budget: f64,
        layer_height: f64,
        first_layer_eligible: bool,
    ) -> SkipOutcome {
        let lowest = if first_layer_eligible { 0 } else { 1 };
        let mut outcome = SkipOutcome::default();

        for index in (lowest..self.records.len()).rev() {
            let record = &mut self.records[index];
            if outcome.height + SKIP_EPSILON >= budget {
                record.skippable = false;
            } else if record.skippable {
                outcome.height += layer_height;
                outcome.layers += 1;
            }
        }

        if !first_layer_eligible {
            if let Some(first) = self.records.first_mut() {
                first.skippable = false;
            }
        }

        if budget > 0.0 && outcome.layers == 0 {
            self.clear_skippable();
            outcome.disabled = true;
        }

        tracing::debug!(
            layers = outcome.layers,
            height = outcome.height,
            budget,
            "Tower skip optimized"
        );
        outcome
    }
}
