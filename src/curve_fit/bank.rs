//! Calibration bank: one equation of fit per percent-MCR band
//!
//! A raw calibration table holds the sampled `(speed, quantity)` pairs of
//! every band back to back; each `BandBoundary` names the rows of one band.
//! `CurveFitBank::build` fits every band once and returns an immutable,
//! ascending `CalibrationBank`.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{CurveFitError, Polynomial};
use crate::config::defaults;
use crate::types::{BandBoundary, CalibrationRow, CurvePoint};

/// One fitted operating-percent band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationBand {
    /// Operating level as a fraction of MCR, in (0, 1]
    pub band_id: f64,
    /// Sampled `(x, y)` pairs in table order
    pub samples: Vec<CurvePoint>,
    /// Equation of fit
    pub fit: Polynomial,
    /// Goodness of fit over `samples` (informational)
    pub r_squared: f64,
}

impl CalibrationBand {
    /// Fit coefficients, highest degree first.
    pub fn fit_coeffs(&self) -> &[f64] {
        self.fit.coeffs()
    }

    pub fn evaluate(&self, x: f64) -> f64 {
        self.fit.evaluate(x)
    }

    /// Smallest and largest sampled abscissa.
    pub fn x_range(&self) -> (f64, f64) {
        self.samples
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
                (lo.min(p.x), hi.max(p.x))
            })
    }
}

/// Fitted bands sorted by ascending `band_id`.
///
/// Band ids are unique and evenly spaced. The bank is never empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationBank {
    bands: Vec<CalibrationBand>,
    degree: usize,
}

impl CalibrationBank {
    pub fn bands(&self) -> &[CalibrationBand] {
        &self.bands
    }

    pub fn len(&self) -> usize {
        self.bands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }

    /// Degree of every band's equation of fit.
    pub fn degree(&self) -> usize {
        self.degree
    }

    pub fn lowest(&self) -> f64 {
        self.bands.first().map_or(f64::NAN, |b| b.band_id)
    }

    pub fn highest(&self) -> f64 {
        self.bands.last().map_or(f64::NAN, |b| b.band_id)
    }

    pub fn band_ids(&self) -> Vec<f64> {
        self.bands.iter().map(|b| b.band_id).collect()
    }

    /// Band whose id equals `level` (within `EXACT_BAND_TOLERANCE`).
    pub fn band(&self, level: f64) -> Option<&CalibrationBand> {
        let idx = self
            .bands
            .partition_point(|b| b.band_id < level - defaults::EXACT_BAND_TOLERANCE);
        self.bands
            .get(idx)
            .filter(|b| (b.band_id - level).abs() <= defaults::EXACT_BAND_TOLERANCE)
    }

    /// Adjacent bands `(lower, upper)` with `lower.band_id < level < upper.band_id`.
    ///
    /// Binary search over the sorted band ids.
    ///
    /// # Errors
    /// `OutOfRange` when `level` is outside the calibrated span, not finite,
    /// or sits on a band id (exact matches use that band directly).
    pub fn bracket(&self, level: f64) -> Result<(&CalibrationBand, &CalibrationBand), CurveFitError> {
        let out_of_range = || CurveFitError::OutOfRange {
            query_level: level,
            lowest: self.lowest(),
            highest: self.highest(),
        };

        if !level.is_finite() || self.band(level).is_some() {
            return Err(out_of_range());
        }

        let idx = self.bands.partition_point(|b| b.band_id < level);
        if idx == 0 || idx == self.bands.len() {
            return Err(out_of_range());
        }

        Ok((&self.bands[idx - 1], &self.bands[idx]))
    }
}

/// Builds a [`CalibrationBank`] from a raw calibration table.
pub struct CurveFitBank;

impl CurveFitBank {
    /// Fit a degree-`degree` polynomial to every band of `raw_table`.
    ///
    /// # Arguments
    /// * `raw_table` - All calibration rows, bands back to back
    /// * `band_boundaries` - Band id and half-open row range for each band
    /// * `degree` - Polynomial degree (4 for the waterjet thrust tables)
    ///
    /// # Errors
    /// - `EmptyBank` when no boundaries are given
    /// - `InvalidBand` for an id outside (0, 1], an empty or out-of-table row
    ///   range, duplicate ids, or uneven id spacing
    /// - `Band { .. }` wrapping the fit error of the first band that fails
    pub fn build(
        raw_table: &[CalibrationRow],
        band_boundaries: &[BandBoundary],
        degree: usize,
    ) -> Result<CalibrationBank, CurveFitError> {
        if band_boundaries.is_empty() {
            return Err(CurveFitError::EmptyBank);
        }

        let mut bands = Vec::with_capacity(band_boundaries.len());
        for boundary in band_boundaries {
            let band_id = boundary.band_id;
            if !band_id.is_finite() || band_id <= 0.0 || band_id > 1.0 {
                return Err(CurveFitError::InvalidBand(format!(
                    "band id {band_id} must lie in (0, 1]"
                )));
            }
            if boundary.is_empty() || boundary.end > raw_table.len() {
                return Err(CurveFitError::InvalidBand(format!(
                    "band {band_id:.2}: rows {}..{} are empty or outside the {}-row table",
                    boundary.start,
                    boundary.end,
                    raw_table.len()
                )));
            }

            let samples: Vec<CurvePoint> = raw_table[boundary.rows()].to_vec();
            let fit = Polynomial::fit(&samples, degree).map_err(|e| CurveFitError::Band {
                band_id,
                source: Box::new(e),
            })?;
            let r_squared = fit.r_squared(&samples);

            debug!(
                band_id = band_id,
                samples = samples.len(),
                r_squared = r_squared,
                "Band equation of fit"
            );

            bands.push(CalibrationBand {
                band_id,
                samples,
                fit,
                r_squared,
            });
        }

        bands.sort_by(|a, b| a.band_id.total_cmp(&b.band_id));
        check_spacing(&bands)?;

        Ok(CalibrationBank { bands, degree })
    }
}

fn check_spacing(bands: &[CalibrationBand]) -> Result<(), CurveFitError> {
    let tol = defaults::BAND_SPACING_TOLERANCE;
    let Some(spacing) = bands.windows(2).next().map(|w| w[1].band_id - w[0].band_id) else {
        return Ok(());
    };

    for w in bands.windows(2) {
        let step = w[1].band_id - w[0].band_id;
        if step <= tol {
            return Err(CurveFitError::InvalidBand(format!(
                "duplicate band id {:.4}",
                w[1].band_id
            )));
        }
        if (step - spacing).abs() > tol {
            return Err(CurveFitError::InvalidBand(format!(
                "band ids must be evenly spaced: step {:.4} between {:.4} and {:.4}, expected {:.4}",
                step, w[0].band_id, w[1].band_id, spacing
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Quadratic thrust-like curve scaled by operating level.
    fn table(levels: &[f64], xs: std::ops::RangeInclusive<i32>) -> (Vec<CalibrationRow>, Vec<BandBoundary>) {
        let mut rows = Vec::new();
        let mut bounds = Vec::new();
        for &level in levels {
            let start = rows.len();
            for x in xs.clone() {
                let x = f64::from(x);
                rows.push(CalibrationRow::new(x, level * (2000.0 - 3.0 * x * x)));
            }
            bounds.push(BandBoundary::new(level, start, rows.len()));
        }
        (rows, bounds)
    }

    #[test]
    fn test_build_sorts_bands() {
        let (rows, mut bounds) = table(&[0.10, 0.15, 0.20], 5..=20);
        bounds.reverse();
        let bank = CurveFitBank::build(&rows, &bounds, 4).expect("build should succeed");

        assert_eq!(bank.len(), 3);
        assert_eq!(bank.degree(), 4);
        assert_eq!(bank.band_ids(), vec![0.10, 0.15, 0.20]);
        for band in bank.bands() {
            assert_eq!(band.fit_coeffs().len(), 5);
            assert!((band.r_squared - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_band_lookup_and_bracket() {
        let (rows, bounds) = table(&[0.25, 0.30, 0.35, 0.40], 8..=30);
        let bank = CurveFitBank::build(&rows, &bounds, 4).expect("build should succeed");

        assert!(bank.band(0.30).is_some());
        assert!(bank.band(0.31).is_none());

        let (lo, hi) = bank.bracket(0.33).expect("0.33 is inside the bank");
        assert_eq!(lo.band_id, 0.30);
        assert_eq!(hi.band_id, 0.35);

        assert!(matches!(bank.bracket(0.20), Err(CurveFitError::OutOfRange { .. })));
        assert!(matches!(bank.bracket(0.45), Err(CurveFitError::OutOfRange { .. })));
        assert!(matches!(bank.bracket(0.35), Err(CurveFitError::OutOfRange { .. })));
        assert!(matches!(bank.bracket(f64::NAN), Err(CurveFitError::OutOfRange { .. })));
    }

    #[test]
    fn test_too_few_points_names_band() {
        let rows: Vec<CalibrationRow> = (0..3).map(|i| CalibrationRow::new(f64::from(i), 1.0)).collect();
        let bounds = [BandBoundary::new(0.5, 0, 3)];

        let err = CurveFitBank::build(&rows, &bounds, 4).expect_err("3 points cannot fit degree 4");
        assert!(err.is_fit_error());
        match err {
            CurveFitError::Band { band_id, source } => {
                assert_eq!(band_id, 0.5);
                assert!(matches!(*source, CurveFitError::TooFewPoints { .. }));
            }
            other => panic!("Expected band fit error, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_band_definitions() {
        let (rows, bounds) = table(&[0.05, 0.10], 5..=15);

        assert_eq!(CurveFitBank::build(&rows, &[], 4), Err(CurveFitError::EmptyBank));

        let out_of_table = [BandBoundary::new(0.05, 0, rows.len() + 1)];
        assert!(matches!(
            CurveFitBank::build(&rows, &out_of_table, 4),
            Err(CurveFitError::InvalidBand(_))
        ));

        let bad_id = [BandBoundary::new(1.5, bounds[0].start, bounds[0].end)];
        assert!(matches!(
            CurveFitBank::build(&rows, &bad_id, 4),
            Err(CurveFitError::InvalidBand(_))
        ));

        let duplicate = [bounds[0], BandBoundary::new(0.05, bounds[1].start, bounds[1].end)];
        assert!(matches!(
            CurveFitBank::build(&rows, &duplicate, 4),
            Err(CurveFitError::InvalidBand(_))
        ));
    }

    #[test]
    fn test_uneven_spacing_rejected() {
        let (rows, bounds) = table(&[0.05, 0.10, 0.20], 5..=15);
        let err = CurveFitBank::build(&rows, &bounds, 4).expect_err("0.10 -> 0.20 breaks spacing");
        assert!(matches!(err, CurveFitError::InvalidBand(msg) if msg.contains("evenly spaced")));
    }

    #[test]
    fn test_x_range() {
        let (rows, bounds) = table(&[0.5], 7..=19);
        let bank = CurveFitBank::build(&rows, &bounds, 4).expect("build should succeed");
        assert_eq!(bank.bands()[0].x_range(), (7.0, 19.0));
    }
}
