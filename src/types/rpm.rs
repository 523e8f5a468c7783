//! Shaft speed estimates.

use serde::{Deserialize, Serialize};

/// Whether an estimate was measured or fell back to the no-signal sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RpmStatus {
    Measured,
    /// Sensor dropout, flat trace, or warm-up consumed the whole run
    NoSignal,
}

/// Rounded rotational speed derived from the minima of a tachometer trace.
///
/// `value == round(basis_peak_count / (basis_duration_s / 60))` for measured
/// estimates; `value == 0` for the no-signal sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RpmEstimate {
    pub value: i64,
    /// Completed shaft cycles inside the measurement window
    pub basis_peak_count: usize,
    /// Window length in seconds
    pub basis_duration_s: f64,
    pub status: RpmStatus,
}

impl RpmEstimate {
    /// Sentinel returned when no usable peaks exist.
    pub fn no_signal() -> Self {
        Self {
            value: 0,
            basis_peak_count: 0,
            basis_duration_s: 0.0,
            status: RpmStatus::NoSignal,
        }
    }

    /// Build a measured estimate from a cycle count and window length.
    ///
    /// A non-positive duration cannot carry a rate and yields the sentinel.
    pub fn from_cycles(cycles: usize, duration_s: f64) -> Self {
        if duration_s <= 0.0 || !duration_s.is_finite() {
            return Self::no_signal();
        }
        let minutes = duration_s / 60.0;
        Self {
            value: (cycles as f64 / minutes).round() as i64,
            basis_peak_count: cycles,
            basis_duration_s: duration_s,
            status: RpmStatus::Measured,
        }
    }

    pub fn is_no_signal(&self) -> bool {
        self.status == RpmStatus::NoSignal
    }
}

impl Default for RpmEstimate {
    fn default() -> Self {
        Self::no_signal()
    }
}

/// Independent estimates for the two waterjet shafts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShaftPairEstimate {
    /// Shaft at position "A"
    pub a: RpmEstimate,
    /// Shaft at position "B"
    pub b: RpmEstimate,
}

impl ShaftPairEstimate {
    /// Mean of the measured shafts; `None` when both dropped out.
    pub fn mean_rpm(&self) -> Option<f64> {
        let measured: Vec<f64> = [self.a, self.b]
            .iter()
            .filter(|e| !e.is_no_signal())
            .map(|e| e.value as f64)
            .collect();
        if measured.is_empty() {
            None
        } else {
            Some(measured.iter().sum::<f64>() / measured.len() as f64)
        }
    }
}

/// One self-propulsion run: a shared time base and both shaft tachometers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TachometerRun {
    pub name: String,
    /// Sample timestamps (s)
    pub time: Vec<f64>,
    /// Proximity-sensor voltage, shaft A
    pub shaft_a: Vec<f64>,
    /// Proximity-sensor voltage, shaft B
    pub shaft_b: Vec<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cycles_rounds() {
        // 499 cycles over 59.885 s -> 499.96 rpm
        let est = RpmEstimate::from_cycles(499, 59.885);
        assert_eq!(est.value, 500);
        assert_eq!(est.basis_peak_count, 499);
        assert_eq!(est.status, RpmStatus::Measured);
    }

    #[test]
    fn test_from_cycles_zero_duration_is_sentinel() {
        let est = RpmEstimate::from_cycles(10, 0.0);
        assert!(est.is_no_signal());
        assert_eq!(est.value, 0);
    }

    #[test]
    fn test_pair_mean_skips_dropouts() {
        let pair = ShaftPairEstimate {
            a: RpmEstimate::from_cycles(100, 60.0),
            b: RpmEstimate::no_signal(),
        };
        assert_eq!(pair.mean_rpm(), Some(100.0));

        let dead = ShaftPairEstimate {
            a: RpmEstimate::no_signal(),
            b: RpmEstimate::no_signal(),
        };
        assert_eq!(dead.mean_rpm(), None);
    }
}
