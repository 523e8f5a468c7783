//! Signal types: instrument samples and detected extrema.

use serde::{Deserialize, Serialize};

/// One instrument reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Seconds since the start of the recorded run
    pub timestamp: f64,
    /// Channel value (volts for the proximity sensors)
    pub value: f64,
}

impl Sample {
    pub fn new(timestamp: f64, value: f64) -> Self {
        Self { timestamp, value }
    }
}

/// Kind of a detected extremum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeakKind {
    Max,
    Min,
}

impl std::fmt::Display for PeakKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PeakKind::Max => write!(f, "max"),
            PeakKind::Min => write!(f, "min"),
        }
    }
}

/// A detected local extremum.
///
/// `position` is expressed in the unit of the caller-supplied x axis (time or
/// sample number). `index` is the sample index inside the scanned series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Peak {
    pub index: usize,
    pub position: f64,
    pub value: f64,
    pub kind: PeakKind,
}

/// Chronologically ordered peaks of a single kind.
///
/// Peaks are appended in detection order, which is scan order, so positions
/// are strictly increasing whenever the x axis is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeakSet {
    kind: PeakKind,
    peaks: Vec<Peak>,
}

impl PeakSet {
    pub fn new(kind: PeakKind) -> Self {
        Self {
            kind,
            peaks: Vec::new(),
        }
    }

    /// Append a peak found at `index`/`position`.
    pub(crate) fn push(&mut self, index: usize, position: f64, value: f64) {
        self.peaks.push(Peak {
            index,
            position,
            value,
            kind: self.kind,
        });
    }

    pub fn kind(&self) -> PeakKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.peaks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peaks.is_empty()
    }

    pub fn first(&self) -> Option<&Peak> {
        self.peaks.first()
    }

    pub fn last(&self) -> Option<&Peak> {
        self.peaks.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Peak> {
        self.peaks.iter()
    }

    pub fn as_slice(&self) -> &[Peak] {
        &self.peaks
    }

    pub fn positions(&self) -> Vec<f64> {
        self.peaks.iter().map(|p| p.position).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.peaks.iter().map(|p| p.value).collect()
    }
}

impl<'a> IntoIterator for &'a PeakSet {
    type Item = &'a Peak;
    type IntoIter = std::slice::Iter<'a, Peak>;

    fn into_iter(self) -> Self::IntoIter {
        self.peaks.iter()
    }
}

/// Maxima and minima found in one scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeakDetection {
    pub maxima: PeakSet,
    pub minima: PeakSet,
}

impl PeakDetection {
    pub fn total(&self) -> usize {
        self.maxima.len() + self.minima.len()
    }
}
