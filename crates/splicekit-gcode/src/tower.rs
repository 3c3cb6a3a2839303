//! Purge tower geometry
//!
//! The tower rectangle is measured from the moves of the first layer brim.
//! Every observed point inflates the rectangle by twice the extrusion width
//! in X and four times in Y. Once the brim ends the bounds are frozen.

use serde::Serialize;

/// Bounding rectangle of the purge tower
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TowerBounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
    #[serde(skip)]
    frozen: bool,
}

impl Default for TowerBounds {
    fn default() -> Self {
        Self {
            min_x: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            min_y: f64::INFINITY,
            max_y: f64::NEG_INFINITY,
            frozen: false,
        }
    }
}

impl TowerBounds {
    pub fn new() -> Self {
        Self::default()
    }

    /// No point was ever measured
    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Stop growing
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    /// Grow the rectangle around an observed position
    ///
    /// Each axis grows independently; absent coordinates are ignored.
    pub fn grow(&mut self, x: Option<f64>, y: Option<f64>, extrusion_width: f64) {
        if self.frozen {
            return;
        }
        if let Some(x) = x {
            self.min_x = self.min_x.min(x - 2.0 * extrusion_width);
            self.max_x = self.max_x.max(x + 2.0 * extrusion_width);
        }
        if let Some(y) = y {
            self.min_y = self.min_y.min(y - 4.0 * extrusion_width);
            self.max_y = self.max_y.max(y + 4.0 * extrusion_width);
        }
    }

    /// X is given and lies within the tower
    pub fn x_in(&self, x: Option<f64>) -> bool {
        x.is_some_and(|x| self.min_x <= x && x <= self.max_x)
    }

    /// Y is given and lies within the tower
    pub fn y_in(&self, y: Option<f64>) -> bool {
        y.is_some_and(|y| self.min_y <= y && y <= self.max_y)
    }

    /// Both coordinates are given and lie within the tower
    pub fn contains(&self, x: Option<f64>, y: Option<f64>) -> bool {
        self.x_in(x) && self.y_in(y)
    }

    /// X lies within the tower's X range; an absent coordinate always does
    pub fn x_in_range(&self, x: Option<f64>) -> bool {
        x.map_or(true, |x| self.min_x <= x && x <= self.max_x)
    }

    /// Y lies within the tower's Y range; an absent coordinate always does
    pub fn y_in_range(&self, y: Option<f64>) -> bool {
        y.map_or(true, |y| self.min_y <= y && y <= self.max_y)
    }

    pub fn width(&self) -> f64 {
        if self.is_empty() {
            0.0
        } else {
            self.max_x - self.min_x
        }
    }

    pub fn depth(&self) -> f64 {
        if self.is_empty() {
            0.0
        } else {
            self.max_y - self.min_y
        }
    }
}
