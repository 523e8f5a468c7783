//! Signal processing module - peak detection and shaft RPM extraction

mod peak_detection;
mod rpm;

pub use peak_detection::*;
pub use rpm::*;

use thiserror::Error;

/// Errors in signal processing.
///
/// Every variant is an invalid-argument condition: it indicates a caller bug,
/// not data variability, and retrying with the same input cannot succeed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProcessingError {
    #[error("Length mismatch: {values} values but {x_axis} axis points")]
    LengthMismatch { values: usize, x_axis: usize },

    #[error("Insufficient data: need {needed}, have {available}")]
    InsufficientData { needed: usize, available: usize },

    #[error("Invalid peak threshold: {0} (must be finite and > 0)")]
    InvalidThreshold(f64),

    #[error("Invalid sampling rate: {0}")]
    InvalidSamplingRate(f64),

    #[error("Time axis is not strictly increasing at sample {0}")]
    NonMonotonicAxis(usize),
}
