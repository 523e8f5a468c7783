//! Band interpolation
//!
//! A query level strictly between two calibrated bands gets a synthesized
//! curve: both bounding polynomials are evaluated over a common domain,
//! blended linearly by where the level sits between the band ids, and the
//! blend is refit as a lower-degree polynomial with the same least-squares
//! method the bank uses.
//!
//! ## Blend domain
//!
//! `BlendDomain::BandSupport` runs from the smaller of the two rounded sample
//! minima to the larger of the two rounded sample maxima. Where the bands
//! were sampled over different speed ranges this evaluates one band's
//! polynomial outside its own samples.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{CalibrationBand, CalibrationBank, CurveFitError, Polynomial};
use crate::config::{defaults, AnalysisConfig};
use crate::types::CurvePoint;

/// Abscissae over which the two bounding bands are blended.
#[derive(Debug, Clone, PartialEq)]
pub enum BlendDomain {
    /// Rounded union of both bands' sample ranges, in `domain_step` increments
    BandSupport,
    /// Caller-supplied abscissae, used as given
    Points(Vec<f64>),
}

/// Blends adjacent calibration bands for intermediate operating levels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandInterpolator {
    /// Degree of the polynomial refit to the blended points
    pub refit_degree: usize,
    /// Step between `BandSupport` domain points
    pub domain_step: f64,
}

impl Default for BandInterpolator {
    fn default() -> Self {
        Self {
            refit_degree: defaults::REFIT_DEGREE,
            domain_step: defaults::DOMAIN_STEP,
        }
    }
}

impl BandInterpolator {
    pub fn new(refit_degree: usize, domain_step: f64) -> Self {
        Self {
            refit_degree,
            domain_step,
        }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self::new(config.curve_fit.refit_degree, config.interpolation.domain_step)
    }

    /// Position of `query_level` between the two band ids: 0 at `lower`, 1 at `upper`.
    pub fn blend_weight(lower: &CalibrationBand, upper: &CalibrationBand, query_level: f64) -> f64 {
        (query_level - lower.band_id) / (upper.band_id - lower.band_id)
    }

    /// Domain points covering both bands' rounded sample ranges.
    ///
    /// # Errors
    /// `InvalidDomain` when `domain_step` is not a positive finite number or
    /// the range would need more than `MAX_DOMAIN_POINTS` points. Both are
    /// checked before anything is allocated.
    pub fn support_domain(
        &self,
        lower: &CalibrationBand,
        upper: &CalibrationBand,
    ) -> Result<Vec<f64>, CurveFitError> {
        if !self.domain_step.is_finite() || self.domain_step <= 0.0 {
            return Err(CurveFitError::InvalidDomain(format!(
                "domain step must be > 0 (got {})",
                self.domain_step
            )));
        }

        let (lower_min, lower_max) = lower.x_range();
        let (upper_min, upper_max) = upper.x_range();
        let start = lower_min.round().min(upper_min.round());
        let end = lower_max.round().max(upper_max.round());
        if !(start.is_finite() && end.is_finite()) {
            return Ok(Vec::new());
        }

        let steps = ((end - start) / self.domain_step + 1e-9).floor();
        if !steps.is_finite() || steps >= defaults::MAX_DOMAIN_POINTS as f64 {
            return Err(CurveFitError::InvalidDomain(format!(
                "{start}..{end} in steps of {} exceeds {} points",
                self.domain_step,
                defaults::MAX_DOMAIN_POINTS
            )));
        }

        // Index-based stepping so long domains do not accumulate rounding drift
        Ok((0..=steps as usize)
            .map(|i| start + i as f64 * self.domain_step)
            .collect())
    }

    /// Synthesize the curve for a level strictly between two adjacent bands.
    ///
    /// # Errors
    /// - `OutOfRange` when `query_level` is outside the bank or equal to a band id
    /// - `NonFinite` when a caller-supplied domain point is NaN or infinite
    /// - `InvalidDomain` when the band-support domain cannot be generated
    /// - the refit's `TooFewPoints` / `Singular` when the domain holds fewer
    ///   than `refit_degree + 1` distinct points
    pub fn interpolate(
        &self,
        bank: &CalibrationBank,
        query_level: f64,
        domain: &BlendDomain,
    ) -> Result<InterpolatedCurve, CurveFitError> {
        let (lower, upper) = bank.bracket(query_level)?;
        let weight = Self::blend_weight(lower, upper, query_level);

        let xs = match domain {
            BlendDomain::BandSupport => self.support_domain(lower, upper)?,
            BlendDomain::Points(points) => {
                if let Some(i) = points.iter().position(|x| !x.is_finite()) {
                    return Err(CurveFitError::NonFinite(i));
                }
                points.clone()
            }
        };

        let blended_points: Vec<CurvePoint> = xs
            .into_iter()
            .map(|x| {
                let y = (1.0 - weight) * lower.evaluate(x) + weight * upper.evaluate(x);
                CurvePoint::new(x, y)
            })
            .collect();

        let refit = Polynomial::fit(&blended_points, self.refit_degree)?;

        debug!(
            query_level = query_level,
            lower_band = lower.band_id,
            upper_band = upper.band_id,
            weight = weight,
            points = blended_points.len(),
            "Interpolated band curve"
        );

        Ok(InterpolatedCurve {
            query_level,
            lower_band: lower.band_id,
            upper_band: upper.band_id,
            blend_weight: weight,
            blended_points,
            refit,
        })
    }
}

/// Curve synthesized for a level between two calibrated bands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterpolatedCurve {
    pub query_level: f64,
    pub lower_band: f64,
    pub upper_band: f64,
    pub blend_weight: f64,
    /// Blended `(x, y)` pairs in domain order
    pub blended_points: Vec<CurvePoint>,
    /// Lower-degree refit of `blended_points`
    pub refit: Polynomial,
}

impl InterpolatedCurve {
    pub fn refit_coeffs(&self) -> &[f64] {
        self.refit.coeffs()
    }

    pub fn evaluate(&self, x: f64) -> f64 {
        self.refit.evaluate(x)
    }
}

/// Curve for an arbitrary level inside the bank.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedCurve<'a> {
    /// The level matched a calibrated band
    Band(&'a CalibrationBand),
    Interpolated(InterpolatedCurve),
}

impl ResolvedCurve<'_> {
    pub fn evaluate(&self, x: f64) -> f64 {
        match self {
            ResolvedCurve::Band(band) => band.evaluate(x),
            ResolvedCurve::Interpolated(curve) => curve.evaluate(x),
        }
    }

    pub fn coeffs(&self) -> &[f64] {
        match self {
            ResolvedCurve::Band(band) => band.fit_coeffs(),
            ResolvedCurve::Interpolated(curve) => curve.refit_coeffs(),
        }
    }

    pub fn is_interpolated(&self) -> bool {
        matches!(self, ResolvedCurve::Interpolated(_))
    }
}

impl CalibrationBank {
    /// The band at `level` if one matches, otherwise the interpolated curve
    /// over the bands' support.
    pub fn resolve(
        &self,
        level: f64,
        interpolator: &BandInterpolator,
    ) -> Result<ResolvedCurve<'_>, CurveFitError> {
        if let Some(band) = self.band(level) {
            return Ok(ResolvedCurve::Band(band));
        }
        interpolator
            .interpolate(self, level, &BlendDomain::BandSupport)
            .map(ResolvedCurve::Interpolated)
    }
}

/// Calibrated quantity (thrust) at `speed` for operating level `level`.
pub fn thrust_at(
    bank: &CalibrationBank,
    interpolator: &BandInterpolator,
    level: f64,
    speed: f64,
) -> Result<f64, CurveFitError> {
    Ok(bank.resolve(level, interpolator)?.evaluate(speed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve_fit::CurveFitBank;
    use crate::types::{BandBoundary, CalibrationRow};

    /// Bands whose true curve is cubic in speed and linear in level, so a
    /// degree-3 refit of any blend is exact.
    fn truth(level: f64, x: f64) -> f64 {
        level * (1500.0 + 40.0 * x - 2.0 * x * x + 0.01 * x * x * x)
    }

    fn bank(levels: &[f64], ranges: &[(i32, i32)]) -> CalibrationBank {
        let mut rows = Vec::new();
        let mut bounds = Vec::new();
        for (&level, &(lo, hi)) in levels.iter().zip(ranges) {
            let start = rows.len();
            for x in lo..=hi {
                let x = f64::from(x);
                rows.push(CalibrationRow::new(x, truth(level, x)));
            }
            bounds.push(BandBoundary::new(level, start, rows.len()));
        }
        CurveFitBank::build(&rows, &bounds, 4).expect("bank should build")
    }

    #[test]
    fn test_interpolate_midway() {
        let bank = bank(&[0.40, 0.45], &[(5, 25), (5, 25)]);
        let curve = BandInterpolator::default()
            .interpolate(&bank, 0.425, &BlendDomain::BandSupport)
            .expect("0.425 is between bands");

        assert_eq!(curve.lower_band, 0.40);
        assert_eq!(curve.upper_band, 0.45);
        assert!((curve.blend_weight - 0.5).abs() < 1e-9);
        assert_eq!(curve.blended_points.len(), 21);
        assert_eq!(curve.refit_coeffs().len(), 4);
        for x in [5.0, 12.5, 25.0] {
            let want = truth(0.425, x);
            assert!(
                (curve.evaluate(x) - want).abs() < 1e-6 * want.abs(),
                "At x={} expected {}, got {}",
                x,
                want,
                curve.evaluate(x)
            );
        }
    }

    #[test]
    fn test_blend_converges_to_bounding_bands() {
        let bank = bank(&[0.20, 0.25], &[(6, 30), (6, 30)]);
        let interp = BandInterpolator::default();
        let (lower, upper) = (&bank.bands()[0], &bank.bands()[1]);

        let near_lower = interp
            .interpolate(&bank, 0.20 + 1e-7, &BlendDomain::BandSupport)
            .expect("inside");
        let near_upper = interp
            .interpolate(&bank, 0.25 - 1e-7, &BlendDomain::BandSupport)
            .expect("inside");

        assert!(near_lower.blend_weight < 1e-5);
        assert!(near_upper.blend_weight > 1.0 - 1e-5);
        for p in &near_lower.blended_points {
            assert!((p.y - lower.evaluate(p.x)).abs() < 1e-3);
        }
        for p in &near_upper.blended_points {
            assert!((p.y - upper.evaluate(p.x)).abs() < 1e-3);
        }
    }

    #[test]
    fn test_out_of_range_and_exact_levels() {
        let bank = bank(&[0.10, 0.15, 0.20], &[(5, 20), (5, 20), (5, 20)]);
        let interp = BandInterpolator::default();

        for level in [0.05, 0.25, 0.15] {
            assert!(matches!(
                interp.interpolate(&bank, level, &BlendDomain::BandSupport),
                Err(CurveFitError::OutOfRange { .. })
            ));
        }
    }

    #[test]
    fn test_support_domain_is_asymmetric_union() {
        let bank = bank(&[0.30, 0.35], &[(8, 20), (4, 16)]);
        let interp = BandInterpolator::default();
        let domain = interp
            .support_domain(&bank.bands()[0], &bank.bands()[1])
            .expect("default step");

        assert_eq!(domain.first().copied(), Some(4.0));
        assert_eq!(domain.last().copied(), Some(20.0));
        assert_eq!(domain.len(), 17);

        let coarse = BandInterpolator::new(3, 2.0)
            .support_domain(&bank.bands()[0], &bank.bands()[1])
            .expect("coarse step");
        assert_eq!(coarse, vec![4.0, 6.0, 8.0, 10.0, 12.0, 14.0, 16.0, 18.0, 20.0]);
    }

    #[test]
    fn test_tiny_or_invalid_step_is_rejected() {
        let bank = bank(&[0.40, 0.45], &[(5, 25), (5, 25)]);

        for step in [1e-300, 1e-6, 0.0, -1.0, f64::NAN] {
            let result = BandInterpolator::new(3, step).interpolate(
                &bank,
                0.42,
                &BlendDomain::BandSupport,
            );
            assert!(
                matches!(result, Err(CurveFitError::InvalidDomain(_))),
                "Step {} should be rejected, got {:?}",
                step,
                result
            );
        }

        // 20 x units at the smallest accepted step stays under the cap
        let fine = BandInterpolator::new(3, defaults::MIN_DOMAIN_STEP)
            .support_domain(&bank.bands()[0], &bank.bands()[1])
            .expect("within the point cap");
        assert_eq!(fine.len(), 20_001);
    }

    #[test]
    fn test_caller_domain_points() {
        let bank = bank(&[0.50, 0.55], &[(5, 25), (5, 25)]);
        let interp = BandInterpolator::default();

        let curve = interp
            .interpolate(&bank, 0.51, &BlendDomain::Points(vec![10.0, 11.0, 12.0, 13.0, 14.0]))
            .expect("five points fit a cubic");
        assert_eq!(curve.blended_points.len(), 5);
        assert!((curve.blend_weight - 0.2).abs() < 1e-9);

        let too_few = interp.interpolate(&bank, 0.51, &BlendDomain::Points(vec![10.0, 11.0]));
        assert!(matches!(too_few, Err(CurveFitError::TooFewPoints { .. })));

        let bad = interp.interpolate(&bank, 0.51, &BlendDomain::Points(vec![1.0, f64::NAN]));
        assert_eq!(bad, Err(CurveFitError::NonFinite(1)));
    }

    #[test]
    fn test_resolve_and_thrust_at() {
        let bank = bank(&[0.60, 0.65, 0.70], &[(5, 30), (5, 30), (5, 30)]);
        let interp = BandInterpolator::default();

        let exact = bank.resolve(0.65, &interp).expect("0.65 is a band");
        assert!(!exact.is_interpolated());
        assert_eq!(exact.coeffs().len(), 5);

        let between = bank.resolve(0.62, &interp).expect("0.62 is inside");
        assert!(between.is_interpolated());

        let thrust = thrust_at(&bank, &interp, 0.62, 15.0).expect("inside");
        let want = truth(0.62, 15.0);
        assert!((thrust - want).abs() < 1e-6 * want.abs());

        assert!(thrust_at(&bank, &interp, 0.9, 15.0).is_err());
    }

    #[test]
    fn test_interpolation_is_reproducible() {
        let bank = bank(&[0.80, 0.85], &[(5, 28), (7, 30)]);
        let interp = BandInterpolator::default();
        let a = interp.interpolate(&bank, 0.83, &BlendDomain::BandSupport).expect("inside");
        let b = interp.interpolate(&bank, 0.83, &BlendDomain::BandSupport).expect("inside");
        assert_eq!(a, b);
    }
}
