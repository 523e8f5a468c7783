//! Hysteresis peak detection
//!
//! Finds local maxima and minima in a 1-D signal while ignoring excursions
//! smaller than a noise threshold. Used to count shaft rotations from the
//! proximity-sensor voltage of each waterjet shaft.
//!
//! The scan keeps a running maximum and minimum. In look-for-max mode a
//! maximum is confirmed once the signal has dropped more than `threshold`
//! below the running maximum; the reported position is the earlier, highest
//! point. Look-for-min mode is the mirror image. Confirming one kind flips
//! the mode, so the output alternates max/min except at the series edges.
//!
//! # Example
//!
//! ```ignore
//! use selfprop::processing::detect_peaks;
//!
//! let detection = detect_peaks(&voltages, 0.5, &time)?;
//! println!("{} minima", detection.minima.len());
//! ```

use std::cmp::Ordering;

use crate::types::{PeakDetection, PeakKind, PeakSet};

use super::ProcessingError;

/// Detect local extrema in `values` that stand out by more than `threshold`.
///
/// # Arguments
/// * `values` - Signal samples
/// * `threshold` - Minimum reversal required to confirm an extremum (> 0)
/// * `x_axis` - Position of each sample (time or sample number), strictly
///   increasing so peak positions are too
///
/// # Returns
/// [`PeakDetection`] with maxima and minima in chronological order.
///
/// Trailing excursions that never reverse by `threshold` produce no peak.
/// Ties keep the first-seen sample (`>` / `<`, never `>=` / `<=`).
///
/// # Errors
/// `LengthMismatch`, `InsufficientData` for an empty series,
/// `InvalidThreshold`, or `NonMonotonicAxis` at the first sample whose
/// position does not exceed its predecessor's (NaN included).
pub fn detect_peaks(
    values: &[f64],
    threshold: f64,
    x_axis: &[f64],
) -> Result<PeakDetection, ProcessingError> {
    if values.len() != x_axis.len() {
        return Err(ProcessingError::LengthMismatch {
            values: values.len(),
            x_axis: x_axis.len(),
        });
    }
    if values.is_empty() {
        return Err(ProcessingError::InsufficientData {
            needed: 1,
            available: 0,
        });
    }
    if !threshold.is_finite() || threshold <= 0.0 {
        return Err(ProcessingError::InvalidThreshold(threshold));
    }
    if let Some(i) = x_axis
        .windows(2)
        .position(|w| w[1].partial_cmp(&w[0]) != Some(Ordering::Greater))
    {
        return Err(ProcessingError::NonMonotonicAxis(i + 1));
    }

    let mut maxima = PeakSet::new(PeakKind::Max);
    let mut minima = PeakSet::new(PeakKind::Min);

    let mut mx = f64::NEG_INFINITY;
    let mut mn = f64::INFINITY;
    let mut mx_idx = 0_usize;
    let mut mn_idx = 0_usize;
    let mut look_for_max = true;

    for (i, &this) in values.iter().enumerate() {
        if this > mx {
            mx = this;
            mx_idx = i;
        }
        if this < mn {
            mn = this;
            mn_idx = i;
        }

        if look_for_max {
            if this < mx - threshold {
                maxima.push(mx_idx, x_axis[mx_idx], mx);
                mn = this;
                mn_idx = i;
                look_for_max = false;
            }
        } else if this > mn + threshold {
            minima.push(mn_idx, x_axis[mn_idx], mn);
            mx = this;
            mx_idx = i;
            look_for_max = true;
        }
    }

    tracing::trace!(
        samples = values.len(),
        threshold = threshold,
        maxima = maxima.len(),
        minima = minima.len(),
        "Peak detection complete"
    );

    Ok(PeakDetection { maxima, minima })
}

/// Sample-number axis `0, 1, ..., n-1` for callers without a time base.
pub fn sample_axis(n: usize) -> Vec<f64> {
    (0..n).map(|i| i as f64).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_triangle_scenario() {
        let values = [1.0, 2.0, 3.0, 2.0, 1.0, 2.0, 3.0, 2.0, 1.0];
        let x = sample_axis(values.len());

        let det = detect_peaks(&values, 0.5, &x).expect("valid input");

        assert_eq!(det.maxima.positions(), vec![2.0, 6.0]);
        assert_eq!(det.maxima.values(), vec![3.0, 3.0]);
        // The trailing descent to index 8 never reverses, so only index 4 is a minimum
        assert_eq!(det.minima.positions(), vec![4.0]);
        assert_eq!(det.minima.values(), vec![1.0]);
    }

    #[test]
    fn test_reports_earlier_highest_point() {
        // Maximum at index 1, drop is only detected at index 3
        let values = [0.0, 5.0, 4.8, 4.0, 3.0];
        let x = sample_axis(values.len());
        let det = detect_peaks(&values, 0.5, &x).expect("valid input");

        assert_eq!(det.maxima.len(), 1);
        assert_eq!(det.maxima.as_slice()[0].index, 1);
        assert!((det.maxima.as_slice()[0].value - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_ties_keep_first_seen() {
        let values = [0.0, 3.0, 3.0, 3.0, 0.0, 3.0];
        let x = sample_axis(values.len());
        let det = detect_peaks(&values, 0.5, &x).expect("valid input");

        assert_eq!(det.maxima.as_slice()[0].index, 1);
        assert_eq!(det.minima.as_slice()[0].index, 4);
    }

    #[test]
    fn test_positions_use_caller_axis() {
        let values = [0.0, 2.0, 0.0, 2.0];
        let time = [10.0, 10.5, 11.0, 11.5];
        let det = detect_peaks(&values, 0.5, &time).expect("valid input");

        assert_eq!(det.maxima.positions(), vec![10.5]);
        assert_eq!(det.minima.positions(), vec![11.0]);
    }

    #[test]
    fn test_small_ripple_ignored() {
        let values = [0.0, 0.2, 0.1, 0.3, 0.2, 0.25];
        let x = sample_axis(values.len());
        let det = detect_peaks(&values, 0.5, &x).expect("valid input");
        assert_eq!(det.total(), 0);
    }

    #[test]
    fn test_falling_start_confirms_max_at_first_sample() {
        // Series begins already past its maximum
        let values = [5.0, 3.0, 1.0, 3.0, 5.0, 3.0];
        let x = sample_axis(values.len());
        let det = detect_peaks(&values, 0.5, &x).expect("valid input");

        assert_eq!(det.maxima.as_slice()[0].index, 0);
        assert_eq!(det.minima.as_slice()[0].index, 2);
        assert_eq!(det.maxima.as_slice()[1].index, 4);
    }

    #[test]
    fn test_single_sample_has_no_peaks() {
        let det = detect_peaks(&[1.0], 0.5, &[0.0]).expect("valid input");
        assert_eq!(det.total(), 0);
    }

    #[test]
    fn test_invalid_arguments() {
        assert_eq!(
            detect_peaks(&[1.0, 2.0], 0.5, &[0.0]),
            Err(ProcessingError::LengthMismatch {
                values: 2,
                x_axis: 1
            })
        );
        assert!(matches!(
            detect_peaks(&[], 0.5, &[]),
            Err(ProcessingError::InsufficientData { .. })
        ));
        assert!(matches!(
            detect_peaks(&[1.0], 0.0, &[0.0]),
            Err(ProcessingError::InvalidThreshold(_))
        ));
        assert!(matches!(
            detect_peaks(&[1.0], -1.0, &[0.0]),
            Err(ProcessingError::InvalidThreshold(_))
        ));
        assert!(matches!(
            detect_peaks(&[1.0], f64::NAN, &[0.0]),
            Err(ProcessingError::InvalidThreshold(_))
        ));
    }

    #[test]
    fn test_non_increasing_axis_rejected() {
        let values = [0.0, 2.0, 0.0, 2.0];
        assert_eq!(
            detect_peaks(&values, 0.5, &[0.0, 1.0, 1.0, 2.0]),
            Err(ProcessingError::NonMonotonicAxis(2))
        );
        assert_eq!(
            detect_peaks(&values, 0.5, &[3.0, 2.0, 1.0, 0.0]),
            Err(ProcessingError::NonMonotonicAxis(1))
        );
        assert_eq!(
            detect_peaks(&values, 0.5, &[0.0, f64::NAN, 2.0, 3.0]),
            Err(ProcessingError::NonMonotonicAxis(1))
        );
    }

    #[test]
    fn test_clean_sine_counts() {
        // 10 full periods of a 2 Hz sine, sampled at 400 Hz
        let fs = 400.0;
        let period = 0.5;
        let n = (10.0 * period * fs) as usize + 1;
        let time: Vec<f64> = (0..n).map(|i| i as f64 / fs).collect();
        let values: Vec<f64> = time.iter().map(|t| 2.0 * (2.0 * PI * t / period).sin()).collect();

        let det = detect_peaks(&values, 0.5, &time).expect("valid input");

        assert_eq!(det.maxima.len(), 10);
        assert_eq!(det.minima.len(), 10);

        for pair in det.maxima.as_slice().windows(2) {
            let spacing = pair[1].position - pair[0].position;
            assert!(
                (spacing - period).abs() < 2.0 / fs,
                "Maxima spacing {} should be ~{}",
                spacing,
                period
            );
        }
    }

    #[test]
    fn test_alternation_on_clean_signal() {
        let values: Vec<f64> = (0..500).map(|i| (i as f64 * 0.1).sin()).collect();
        let x = sample_axis(values.len());
        let det = detect_peaks(&values, 0.5, &x).expect("valid input");

        let mut all: Vec<_> = det.maxima.iter().chain(det.minima.iter()).collect();
        all.sort_by_key(|p| p.index);
        for pair in all.windows(2) {
            assert_ne!(pair[0].kind, pair[1].kind, "Peaks should alternate");
        }
    }

    #[test]
    fn test_higher_threshold_never_adds_peaks() {
        // Large swings with a small ripple riding on them
        let values: Vec<f64> = (0..2000)
            .map(|i| {
                let t = i as f64 * 0.01;
                2.0 * (2.0 * PI * 0.5 * t).sin() + 0.4 * (2.0 * PI * 7.0 * t).sin()
            })
            .collect();
        let x = sample_axis(values.len());

        let counts: Vec<usize> = [0.1, 0.3, 0.5, 1.0, 2.0, 3.0]
            .iter()
            .map(|&th| detect_peaks(&values, th, &x).expect("valid input").total())
            .collect();
        for w in counts.windows(2) {
            assert!(w[1] <= w[0], "Peak counts should not grow with threshold: {:?}", counts);
        }
        assert!(counts[0] > counts[2], "Ripple should only register at low thresholds");
    }
}
