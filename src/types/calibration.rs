//! Calibration table records.

use serde::{Deserialize, Serialize};

/// One row of a raw calibration table.
///
/// `x` is the operating speed, `y` the dependent physical quantity (e.g.
/// gross thrust in newtons).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationRow {
    pub x: f64,
    pub y: f64,
}

impl CalibrationRow {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// An `(x, y)` pair on a fitted or blended curve.
pub type CurvePoint = CalibrationRow;

/// Row slice of the raw table belonging to one operating-percent band.
///
/// `start..end` is half-open, in row indices of the raw table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandBoundary {
    /// Operating level as a fraction of MCR, in (0, 1]
    pub band_id: f64,
    pub start: usize,
    pub end: usize,
}

impl BandBoundary {
    pub fn new(band_id: f64, start: usize, end: usize) -> Self {
        Self {
            band_id,
            start,
            end,
        }
    }

    pub fn rows(&self) -> std::ops::Range<usize> {
        self.start..self.end
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A raw calibration table with its band layout, as read from JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CalibrationTable {
    /// Quantity name for reports (e.g. "gross thrust")
    #[serde(default)]
    pub quantity: String,
    pub rows: Vec<CalibrationRow>,
    pub bands: Vec<BandBoundary>,
}
