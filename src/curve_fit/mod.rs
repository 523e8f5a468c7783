//! Calibration Curve Module
//!
//! Polynomial equations of fit for the waterjet calibration tables and the
//! interpolation between percent-MCR bands.
//!
//! ## Components
//! - `Polynomial` - least-squares fit, Horner evaluation, R²
//! - `CurveFitBank` - fits one polynomial per band into a `CalibrationBank`
//! - `BandInterpolator` - blends the two bands bracketing a query level and
//!   refits the blend as a lower-degree polynomial
//!
//! Everything here is a pure transformation over caller-owned inputs; the
//! bank is immutable once built.

mod bank;
mod interpolator;
mod polynomial;

pub use bank::*;
pub use interpolator::*;
pub use polynomial::*;

use thiserror::Error;

/// Errors in curve fitting and band interpolation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CurveFitError {
    #[error("Too few points for a degree {degree} fit: need {needed}, have {available}")]
    TooFewPoints {
        degree: usize,
        needed: usize,
        available: usize,
    },

    #[error("Singular design matrix for a degree {degree} fit ({distinct} distinct abscissae)")]
    Singular { degree: usize, distinct: usize },

    #[error("Non-finite value at point {0}")]
    NonFinite(usize),

    #[error("Band {band_id:.2}: {source}")]
    Band {
        band_id: f64,
        source: Box<CurveFitError>,
    },

    #[error("Invalid band definition: {0}")]
    InvalidBand(String),

    #[error("Calibration bank has no bands")]
    EmptyBank,

    #[error("Invalid blend domain: {0}")]
    InvalidDomain(String),

    #[error(
        "Query level {query_level} must fall strictly between calibrated bands \
         ({lowest}..{highest}) and not on a band"
    )]
    OutOfRange {
        query_level: f64,
        lowest: f64,
        highest: f64,
    },
}

impl CurveFitError {
    /// True for the fit failures of a single band or refit (too few points,
    /// singular system, non-finite data), including when wrapped in `Band`.
    pub fn is_fit_error(&self) -> bool {
        match self {
            CurveFitError::TooFewPoints { .. }
            | CurveFitError::Singular { .. }
            | CurveFitError::NonFinite(_) => true,
            CurveFitError::Band { source, .. } => source.is_fit_error(),
            _ => false,
        }
    }
}
