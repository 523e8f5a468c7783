//! Least-squares polynomials
//!
//! Fits are computed on centred and scaled abscissae, `z = (x - mu) / s`,
//! so the normal equations stay well conditioned for degree-4 fits over raw
//! carriage speeds. The solution is then expanded back into ordinary
//! coefficients in `x`, highest degree first, which is the form the
//! plotting and export collaborators consume.

use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use super::CurveFitError;
use crate::types::CurvePoint;

/// Relative pivot size below which the normal equations count as singular.
const SINGULAR_PIVOT_RATIO: f64 = 1e-12;

/// Polynomial with coefficients ordered highest degree first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polynomial {
    coeffs: Vec<f64>,
}

impl Polynomial {
    /// Wrap existing coefficients (highest degree first).
    pub fn from_coeffs(coeffs: Vec<f64>) -> Self {
        Self { coeffs }
    }

    /// Ordinary least-squares fit of the given degree.
    ///
    /// # Errors
    /// - `TooFewPoints` when fewer than `degree + 1` points are given
    /// - `NonFinite` when a point holds NaN or infinity
    /// - `Singular` when fewer than `degree + 1` distinct abscissae exist or
    ///   elimination meets a vanishing pivot
    pub fn fit(points: &[CurvePoint], degree: usize) -> Result<Self, CurveFitError> {
        let needed = degree + 1;
        if points.len() < needed {
            return Err(CurveFitError::TooFewPoints {
                degree,
                needed,
                available: points.len(),
            });
        }
        if let Some(i) = points
            .iter()
            .position(|p| !p.x.is_finite() || !p.y.is_finite())
        {
            return Err(CurveFitError::NonFinite(i));
        }

        let distinct = count_distinct(points.iter().map(|p| p.x));
        if distinct < needed {
            return Err(CurveFitError::Singular { degree, distinct });
        }

        let mu = points.iter().map(|p| p.x).mean();
        let half_range = points
            .iter()
            .map(|p| (p.x - mu).abs())
            .fold(0.0_f64, f64::max);
        let scale = if half_range > 0.0 { half_range } else { 1.0 };

        // Normal equations (ZᵀZ) a = Zᵀy in ascending powers of z
        let mut ata = vec![vec![0.0; needed]; needed];
        let mut aty = vec![0.0; needed];
        let mut zpow = vec![1.0; needed];
        for p in points {
            let z = (p.x - mu) / scale;
            for j in 1..needed {
                zpow[j] = zpow[j - 1] * z;
            }
            for r in 0..needed {
                for c in 0..needed {
                    ata[r][c] += zpow[r] * zpow[c];
                }
                aty[r] += zpow[r] * p.y;
            }
        }

        let ascending_z = solve_linear_system(ata, aty)
            .ok_or(CurveFitError::Singular { degree, distinct })?;

        let mut coeffs = expand_scaled(&ascending_z, mu, scale);
        coeffs.reverse();
        Ok(Self { coeffs })
    }

    /// Coefficients, highest degree first.
    pub fn coeffs(&self) -> &[f64] {
        &self.coeffs
    }

    pub fn degree(&self) -> usize {
        self.coeffs.len().saturating_sub(1)
    }

    /// Evaluate at `x` by Horner's rule.
    pub fn evaluate(&self, x: f64) -> f64 {
        self.coeffs.iter().fold(0.0, |acc, &c| acc * x + c)
    }

    /// Coefficient of determination of this polynomial over `points`.
    ///
    /// Unclamped: negative when the polynomial does worse than the mean of
    /// `points`. Returns 1.0 for a perfect fit of constant data and 0.0 for
    /// no points.
    pub fn r_squared(&self, points: &[CurvePoint]) -> f64 {
        if points.is_empty() {
            return 0.0;
        }
        let y_mean = points.iter().map(|p| p.y).mean();

        let mut ss_res = 0.0;
        let mut ss_tot = 0.0;
        for p in points {
            let residual = p.y - self.evaluate(p.x);
            ss_res += residual * residual;
            ss_tot += (p.y - y_mean) * (p.y - y_mean);
        }

        if ss_tot.abs() < 1e-12 {
            return if ss_res.abs() < 1e-12 { 1.0 } else { 0.0 };
        }
        1.0 - ss_res / ss_tot
    }
}

fn count_distinct(xs: impl Iterator<Item = f64>) -> usize {
    let mut sorted: Vec<f64> = xs.collect();
    sorted.sort_by(f64::total_cmp);
    sorted.dedup();
    sorted.len()
}

/// Solve Ax = b by Gaussian elimination with partial pivoting.
///
/// Returns `None` when a pivot vanishes relative to the largest diagonal.
fn solve_linear_system(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Option<Vec<f64>> {
    let n = b.len();
    let scale = (0..n).map(|i| a[i][i].abs()).fold(0.0_f64, f64::max);
    if scale == 0.0 {
        return None;
    }

    for col in 0..n {
        let mut max_row = col;
        let mut max_val = a[col][col].abs();
        for row in (col + 1)..n {
            let v = a[row][col].abs();
            if v > max_val {
                max_val = v;
                max_row = row;
            }
        }
        if max_val < SINGULAR_PIVOT_RATIO * scale {
            return None;
        }
        if max_row != col {
            a.swap(col, max_row);
            b.swap(col, max_row);
        }

        let pivot = a[col][col];
        for row in (col + 1)..n {
            let factor = a[row][col] / pivot;
            if factor == 0.0 {
                continue;
            }
            for c in col..n {
                let v = a[col][c];
                a[row][c] -= factor * v;
            }
            let bv = b[col];
            b[row] -= factor * bv;
        }
    }

    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let mut sum = b[i];
        for j in (i + 1)..n {
            sum -= a[i][j] * x[j];
        }
        x[i] = sum / a[i][i];
    }
    Some(x)
}

/// Expand `sum_k a_k ((x - mu) / s)^k` into ascending powers of `x`.
fn expand_scaled(ascending_z: &[f64], mu: f64, scale: f64) -> Vec<f64> {
    let n = ascending_z.len();
    let mut out = vec![0.0; n];
    // Coefficients of (x - mu)^k, ascending in x, built by repeated multiplication
    let mut shifted = vec![1.0];
    let mut inv_scale_pow = 1.0;
    for (k, &a_k) in ascending_z.iter().enumerate() {
        if k > 0 {
            let mut next = vec![0.0; shifted.len() + 1];
            for (j, &c) in shifted.iter().enumerate() {
                next[j + 1] += c;
                next[j] -= mu * c;
            }
            shifted = next;
            inv_scale_pow /= scale;
        }
        for (j, &c) in shifted.iter().enumerate() {
            out[j] += a_k * inv_scale_pow * c;
        }
    }
    out
}
