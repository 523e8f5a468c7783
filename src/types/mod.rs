//! Shared data structures for towing-tank self-propulsion analysis
//!
//! This module defines the plain numeric records that flow between the
//! analysis stages and out to the plotting / export collaborators:
//! - Signal: Sample, Peak, PeakSet (proximity-sensor voltage traces)
//! - Shaft speed: RpmEstimate, ShaftPairEstimate, TachometerRun
//! - Calibration: CalibrationRow, BandBoundary, CurvePoint, CalibrationTable

mod signal;
mod rpm;
mod calibration;

pub use signal::*;
pub use rpm::*;
pub use calibration::*;
