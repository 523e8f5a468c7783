//! Shaft RPM extraction from proximity-sensor voltage traces
//!
//! Each waterjet shaft carries a target that passes a proximity sensor once
//! per revolution, so the sensor voltage is periodic in shaft angle. The
//! estimator:
//!
//! 1. Drops the warm-up samples (carriage acceleration transient)
//! 2. Runs hysteresis peak detection at the instrumentation noise threshold
//! 3. Builds a window from the first to the last detected minimum, widened by
//!    `boundary_correction` samples on each side
//! 4. Counts completed cycles (minima after the anchoring first minimum) and
//!    converts cycles per window length into revolutions per minute
//!
//! Missing or flat sensor data is not an error: the estimate falls back to
//! the `value == 0` sentinel so a batch of runs keeps going.

use crate::config::{defaults, RpmConfig};
use crate::types::{RpmEstimate, Sample, ShaftPairEstimate};
use tracing::{debug, warn};

use super::{detect_peaks, ProcessingError};

/// Parameters for one RPM estimation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RpmParams {
    /// Acquisition rate of the time series (Hz)
    pub sample_rate_hz: f64,
    /// Leading samples discarded before peak detection
    pub warm_up_samples: usize,
    /// Samples added on each side of the minima window
    pub boundary_correction: usize,
    /// Peak detection noise threshold (V)
    pub peak_threshold: f64,
}

impl Default for RpmParams {
    fn default() -> Self {
        Self {
            sample_rate_hz: defaults::SAMPLE_RATE_HZ,
            warm_up_samples: defaults::WARM_UP_SAMPLES,
            boundary_correction: defaults::BOUNDARY_CORRECTION_SAMPLES,
            peak_threshold: defaults::PEAK_THRESHOLD_V,
        }
    }
}

impl RpmParams {
    pub fn from_config(config: &RpmConfig) -> Self {
        Self {
            sample_rate_hz: config.sample_rate_hz,
            warm_up_samples: config.warm_up_samples,
            boundary_correction: config.boundary_correction,
            peak_threshold: config.peak_threshold_v,
        }
    }
}

/// Estimate shaft speed from one tachometer channel.
///
/// # Arguments
/// * `time` - Sample timestamps (s), strictly increasing
/// * `raw_signal` - Sensor voltage, same length as `time`
/// * `params` - Sample rate, warm-up, boundary correction and threshold
///
/// # Returns
/// A measured [`RpmEstimate`], or the no-signal sentinel when fewer than two
/// minima (one complete cycle) or no maximum survive peak detection.
///
/// # Errors
/// Invalid arguments only: length mismatch, non-positive sample rate or
/// threshold, or a non-monotonic time axis.
pub fn estimate_rpm(
    time: &[f64],
    raw_signal: &[f64],
    params: &RpmParams,
) -> Result<RpmEstimate, ProcessingError> {
    if time.len() != raw_signal.len() {
        return Err(ProcessingError::LengthMismatch {
            values: raw_signal.len(),
            x_axis: time.len(),
        });
    }
    if !params.sample_rate_hz.is_finite() || params.sample_rate_hz <= 0.0 {
        return Err(ProcessingError::InvalidSamplingRate(params.sample_rate_hz));
    }
    if !params.peak_threshold.is_finite() || params.peak_threshold <= 0.0 {
        return Err(ProcessingError::InvalidThreshold(params.peak_threshold));
    }

    if params.warm_up_samples >= raw_signal.len() {
        warn!(
            samples = raw_signal.len(),
            warm_up = params.warm_up_samples,
            "Warm-up consumes the whole run, no signal left for RPM"
        );
        return Ok(RpmEstimate::no_signal());
    }

    let time = &time[params.warm_up_samples..];
    let signal = &raw_signal[params.warm_up_samples..];

    if let Some(i) = time.windows(2).position(|w| w[1] <= w[0]) {
        return Err(ProcessingError::NonMonotonicAxis(
            params.warm_up_samples + i + 1,
        ));
    }

    let detection = detect_peaks(signal, params.peak_threshold, time)?;
    let minima = &detection.minima;

    let (first, last) = match (minima.first(), minima.last()) {
        (Some(first), Some(last)) if minima.len() >= 2 && !detection.maxima.is_empty() => {
            (first, last)
        }
        _ => {
            warn!(
                maxima = detection.maxima.len(),
                minima = minima.len(),
                "No complete shaft cycle detected, reporting 0 RPM"
            );
            return Ok(RpmEstimate::no_signal());
        }
    };

    let start_idx = first.index.saturating_sub(params.boundary_correction);
    let end_idx = (last.index + params.boundary_correction).min(signal.len() - 1);
    let duration_s = (end_idx - start_idx) as f64 / params.sample_rate_hz;

    // The first minimum opens the window; every later one closes a cycle
    let cycles = minima.len() - 1;
    let estimate = RpmEstimate::from_cycles(cycles, duration_s);

    debug!(
        window_start_s = time[start_idx],
        window_end_s = time[end_idx],
        duration_s = duration_s,
        cycles = cycles,
        rpm = estimate.value,
        "Shaft RPM estimated"
    );

    Ok(estimate)
}

/// Estimate shaft speed from a sequence of [`Sample`]s.
pub fn estimate_rpm_from_samples(
    samples: &[Sample],
    params: &RpmParams,
) -> Result<RpmEstimate, ProcessingError> {
    let (time, values): (Vec<f64>, Vec<f64>) =
        samples.iter().map(|s| (s.timestamp, s.value)).unzip();
    estimate_rpm(&time, &values, params)
}

/// Estimate both waterjet shafts from a shared time base.
///
/// The channels are independent: each gets its own peak detection and
/// window, and the two run in parallel with no shared state.
pub fn estimate_shaft_pair(
    time: &[f64],
    shaft_a: &[f64],
    shaft_b: &[f64],
    params: &RpmParams,
) -> Result<ShaftPairEstimate, ProcessingError> {
    let (a, b) = rayon::join(
        || estimate_rpm(time, shaft_a, params),
        || estimate_rpm(time, shaft_b, params),
    );

    Ok(ShaftPairEstimate { a: a?, b: b? })
}
