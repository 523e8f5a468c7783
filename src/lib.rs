//! SELFPROP: Waterjet Self-Propulsion Analysis
//!
//! Towing-tank analysis core for a waterjet catamaran self-propulsion study.
//!
//! ## Architecture
//!
//! - **Peak detection**: threshold-confirmed local maxima and minima of a
//!   sampled series
//! - **RPM estimation**: shaft speed from the minima of a proximity-sensor trace
//! - **Curve fitting**: one least-squares polynomial per percent-MCR band of
//!   a waterjet calibration table
//! - **Band interpolation**: synthesized curves for levels between bands
//!
//! The two pipelines are independent. Plotting and export consume the
//! `report` output and live outside this crate.

pub mod config;
pub mod curve_fit;
pub mod processing;
pub mod report;
pub mod types;

// Re-export configuration
pub use config::AnalysisConfig;

// Re-export the data model
pub use types::{
    BandBoundary, CalibrationRow, CurvePoint, Peak, PeakDetection, PeakKind, PeakSet,
    RpmEstimate, RpmStatus, Sample, ShaftPairEstimate,
};

// Re-export signal processing
pub use processing::{
    detect_peaks, estimate_rpm, estimate_shaft_pair, ProcessingError, RpmParams,
};

// Re-export curve fitting
pub use curve_fit::{
    thrust_at, BandInterpolator, BlendDomain, CalibrationBand, CalibrationBank, CurveFitBank,
    CurveFitError, InterpolatedCurve, Polynomial, ResolvedCurve,
};

pub use report::{AnalysisReport, CurveSummary, RunRpmSummary};
