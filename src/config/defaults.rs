//! System-wide default constants.
//!
//! Values match the reference towing-tank instrumentation and the
//! thrust-curve analysis conventions. Grouped by subsystem.

// ============================================================================
// RPM Extraction
// ============================================================================

/// Acquisition rate of the dynamometer / proximity-sensor channels (Hz).
pub const SAMPLE_RATE_HZ: f64 = 800.0;

/// Peak detection noise threshold for the proximity-sensor voltage (V).
pub const PEAK_THRESHOLD_V: f64 = 0.5;

/// Leading samples discarded as carriage acceleration transient.
///
/// Zero by default: most runs are already trimmed to the steady-speed
/// section before they reach the estimator.
pub const WARM_UP_SAMPLES: usize = 0;

/// Samples added on each side of the first-to-last-minimum window.
pub const BOUNDARY_CORRECTION_SAMPLES: usize = 2;

// ============================================================================
// Curve Fitting
// ============================================================================

/// Polynomial degree for each calibration band's equation of fit.
pub const FIT_DEGREE: usize = 4;

/// Polynomial degree for refitting blended intermediate curves.
pub const REFIT_DEGREE: usize = 3;

// ============================================================================
// Band Interpolation
// ============================================================================

/// Spacing of the blend domain in x units (1 knot / 1 m/s steps).
pub const DOMAIN_STEP: f64 = 1.0;

/// Tolerance when checking even band spacing.
pub const BAND_SPACING_TOLERANCE: f64 = 1e-6;

/// Query levels closer than this to a band id resolve to that band.
pub const EXACT_BAND_TOLERANCE: f64 = 1e-9;

/// Smallest accepted blend-domain step (x units).
pub const MIN_DOMAIN_STEP: f64 = 1e-3;

/// Upper bound on generated blend-domain points.
pub const MAX_DOMAIN_POINTS: usize = 100_000;
