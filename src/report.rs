//! Batch analysis report
//!
//! Plain serialisable summary of one CLI batch: per-run shaft speeds and the
//! band or interpolated curves resolved for each requested level. Plot and
//! CSV exporters read this JSON; nothing here formats for them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::curve_fit::{CalibrationBank, ResolvedCurve};
use crate::types::{RpmEstimate, ShaftPairEstimate};

/// RPM of both shafts for one named run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRpmSummary {
    pub name: String,
    pub shaft_a: RpmEstimate,
    pub shaft_b: RpmEstimate,
    /// Mean of the measured shafts, absent when both dropped out
    pub mean_rpm: Option<f64>,
}

impl RunRpmSummary {
    pub fn new(name: impl Into<String>, pair: &ShaftPairEstimate) -> Self {
        Self {
            name: name.into(),
            shaft_a: pair.a,
            shaft_b: pair.b,
            mean_rpm: pair.mean_rpm(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurveSource {
    Band,
    Interpolated,
}

/// Coefficients of one band or resolved query level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurveSummary {
    pub level: f64,
    pub source: CurveSource,
    /// Bracketing band ids for interpolated curves
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bracket: Option<(f64, f64)>,
    /// Highest degree first
    pub coeffs: Vec<f64>,
    /// Band fit quality; absent for interpolated curves
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r_squared: Option<f64>,
}

impl CurveSummary {
    pub fn from_resolved(level: f64, curve: &ResolvedCurve<'_>) -> Self {
        match curve {
            ResolvedCurve::Band(band) => Self {
                level,
                source: CurveSource::Band,
                bracket: None,
                coeffs: band.fit_coeffs().to_vec(),
                r_squared: Some(band.r_squared),
            },
            ResolvedCurve::Interpolated(c) => Self {
                level,
                source: CurveSource::Interpolated,
                bracket: Some((c.lower_band, c.upper_band)),
                coeffs: c.refit_coeffs().to_vec(),
                r_squared: None,
            },
        }
    }

    /// One summary per calibrated band, ascending.
    pub fn from_bank(bank: &CalibrationBank) -> Vec<Self> {
        bank.bands()
            .iter()
            .map(|band| Self::from_resolved(band.band_id, &ResolvedCurve::Band(band)))
            .collect()
    }
}

/// Output of one `selfprop` batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub experiment: String,
    pub generated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rpm: Vec<RunRpmSummary>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub curves: Vec<CurveSummary>,
}

impl AnalysisReport {
    pub fn new(experiment: impl Into<String>) -> Self {
        Self {
            experiment: experiment.into(),
            generated_at: Utc::now(),
            rpm: Vec::new(),
            curves: Vec::new(),
        }
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_summary_mean() {
        let pair = ShaftPairEstimate {
            a: RpmEstimate::from_cycles(500, 60.0),
            b: RpmEstimate::no_signal(),
        };
        let summary = RunRpmSummary::new("run-07", &pair);
        assert_eq!(summary.shaft_a.value, 500);
        assert_eq!(summary.mean_rpm, Some(500.0));
    }

    #[test]
    fn test_report_json_shape() {
        let mut report = AnalysisReport::new("Catamaran-SP");
        report.curves.push(CurveSummary {
            level: 0.425,
            source: CurveSource::Interpolated,
            bracket: Some((0.40, 0.45)),
            coeffs: vec![1.0, 2.0, 3.0, 4.0],
            r_squared: None,
        });

        let json = report.to_json_pretty().expect("report should serialize");
        let value: serde_json::Value = serde_json::from_str(&json).expect("valid JSON");

        assert_eq!(value["experiment"], "Catamaran-SP");
        assert!(value.get("rpm").is_none());
        assert_eq!(value["curves"][0]["source"], "interpolated");
        assert!(value["curves"][0].get("r_squared").is_none());

        let back: AnalysisReport = serde_json::from_str(&json).expect("report should deserialize");
        assert_eq!(back, report);
    }
}
