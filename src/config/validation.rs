//! Config validation: unknown-key detection with Levenshtein suggestions
//! and instrumentation range checks.
//!
//! The raw TOML is first parsed into `toml::Value` and its key tree compared
//! against the known field names, emitting "did you mean?" warnings. Serde
//! deserialization then proceeds as normal; warnings never break a config.

use std::collections::HashSet;

/// A non-fatal config warning (typo, suspicious value).
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref s) = self.suggestion {
            write!(f, " (did you mean '{s}'?)")?;
        }
        Ok(())
    }
}

// ============================================================================
// Known Config Keys
// ============================================================================

/// Returns the complete set of valid dotted key paths for `AnalysisConfig`.
///
/// Maintained by hand to match the struct hierarchy in analysis_config.rs.
pub fn known_config_keys() -> HashSet<&'static str> {
    let keys: &[&str] = &[
        // [experiment]
        "experiment",
        "experiment.name",
        "experiment.model",
        "experiment.description",
        // [rpm]
        "rpm",
        "rpm.sample_rate_hz",
        "rpm.peak_threshold_v",
        "rpm.warm_up_samples",
        "rpm.boundary_correction",
        // [curve_fit]
        "curve_fit",
        "curve_fit.degree",
        "curve_fit.refit_degree",
        // [interpolation]
        "interpolation",
        "interpolation.domain_step",
    ];
    keys.iter().copied().collect()
}

// ============================================================================
// Key Walking and Suggestions
// ============================================================================

/// Collect every dotted key path in a TOML value tree.
pub fn walk_toml_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let mut keys = Vec::new();
    if let Some(table) = value.as_table() {
        for (k, v) in table {
            let path = if prefix.is_empty() {
                k.clone()
            } else {
                format!("{prefix}.{k}")
            };
            keys.push(path.clone());
            if v.is_table() {
                keys.extend(walk_toml_keys(v, &path));
            }
        }
    }
    keys
}

fn levenshtein(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    let b_len = b_chars.len();
    if a.is_empty() {
        return b_len;
    }
    if b_len == 0 {
        return a.chars().count();
    }

    let mut prev: Vec<usize> = (0..=b_len).collect();
    let mut curr = vec![0; b_len + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, &cb) in b_chars.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b_len]
}

/// Closest known key within edit distance 3; ties go to the alphabetically
/// first key so suggestions are stable.
pub fn suggest_correction(unknown: &str, known: &HashSet<&str>) -> Option<String> {
    known
        .iter()
        .map(|&k| (levenshtein(unknown, k), k))
        .filter(|(dist, _)| *dist <= 3)
        .min()
        .map(|(_, k)| k.to_string())
}

/// Warn about keys that `AnalysisConfig` does not know.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let value: toml::Value = match raw_toml.parse() {
        Ok(v) => v,
        Err(_) => return Vec::new(), // parse errors are reported by serde later
    };

    let known = known_config_keys();
    walk_toml_keys(&value, "")
        .into_iter()
        .filter(|key| !known.contains(key.as_str()))
        .map(|key| ValidationWarning {
            suggestion: suggest_correction(&key, &known),
            message: format!("Unknown config key '{key}'"),
            field: key,
        })
        .collect()
}

// ============================================================================
// Range Checks
// ============================================================================

/// Check values against what the towing-tank instrumentation can produce.
///
/// Returns `(errors, warnings)`; errors fail validation, warnings are logged.
pub fn validate_physical_ranges(
    config: &super::AnalysisConfig,
) -> (Vec<String>, Vec<ValidationWarning>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let rpm = &config.rpm;

    // Proximity sensors are 0-10 V; a threshold above that never confirms a peak
    if rpm.peak_threshold_v.is_finite() && rpm.peak_threshold_v > 10.0 {
        errors.push(format!(
            "rpm.peak_threshold_v = {:.2} exceeds the 10 V sensor range",
            rpm.peak_threshold_v
        ));
    }

    // Corrections beyond a few samples distort the measurement window
    if rpm.boundary_correction > 50 {
        warnings.push(ValidationWarning {
            field: "rpm.boundary_correction".to_string(),
            message: format!(
                "rpm.boundary_correction = {} samples is unusually large",
                rpm.boundary_correction
            ),
            suggestion: None,
        });
    }

    if rpm.sample_rate_hz.is_finite() && !(50.0..=100_000.0).contains(&rpm.sample_rate_hz) {
        warnings.push(ValidationWarning {
            field: "rpm.sample_rate_hz".to_string(),
            message: format!(
                "rpm.sample_rate_hz = {:.1} is outside the typical range (50-100000 Hz)",
                rpm.sample_rate_hz
            ),
            suggestion: None,
        });
    }

    // Sub-millimetre steps only inflate the blend domain
    let step = config.interpolation.domain_step;
    if step.is_finite() && step > 0.0 && step < super::defaults::MIN_DOMAIN_STEP {
        errors.push(format!(
            "interpolation.domain_step = {step:e} is below the minimum {}",
            super::defaults::MIN_DOMAIN_STEP
        ));
    }

    // High-degree fits on raw speeds are badly conditioned
    if config.curve_fit.degree > 8 {
        warnings.push(ValidationWarning {
            field: "curve_fit.degree".to_string(),
            message: format!(
                "curve_fit.degree = {} risks oscillating fits between samples",
                config.curve_fit.degree
            ),
            suggestion: None,
        });
    }

    (errors, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levenshtein_identical() {
        assert_eq!(levenshtein("degree", "degree"), 0);
    }

    #[test]
    fn test_levenshtein_one_edit() {
        assert_eq!(levenshtein("sample_rate", "sampel_rate"), 2);
        assert_eq!(levenshtein("degre", "degree"), 1);
    }

    #[test]
    fn test_levenshtein_empty() {
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("abc", ""), 3);
    }

    #[test]
    fn test_walk_toml_keys_nested() {
        let toml: toml::Value = r#"
            [rpm]
            sample_rate_hz = 800.0
        "#
        .parse()
        .expect("valid toml");
        let keys = walk_toml_keys(&toml, "");
        assert!(keys.contains(&"rpm".to_string()));
        assert!(keys.contains(&"rpm.sample_rate_hz".to_string()));
    }

    #[test]
    fn test_typo_key_produces_warning_with_suggestion() {
        let toml_str = r#"
[rpm]
peak_treshold_v = 0.5
"#;
        let warnings = validate_unknown_keys(toml_str);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].field, "rpm.peak_treshold_v");
        assert_eq!(warnings[0].suggestion.as_deref(), Some("rpm.peak_threshold_v"));
    }

    #[test]
    fn test_unrelated_key_has_no_suggestion() {
        let warnings = validate_unknown_keys("completely_unrelated_section = 1\n");
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].suggestion.is_none());
    }

    #[test]
    fn test_threshold_above_sensor_range_is_error() {
        let mut config = super::super::AnalysisConfig::default();
        config.rpm.peak_threshold_v = 12.0;
        let (errors, _) = validate_physical_ranges(&config);
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_tiny_domain_step_is_error() {
        let mut config = super::super::AnalysisConfig::default();
        config.interpolation.domain_step = 1e-300;
        let (errors, _) = validate_physical_ranges(&config);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("interpolation.domain_step"));
        assert!(config.validate().is_err());

        config.interpolation.domain_step = super::super::defaults::MIN_DOMAIN_STEP;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults_have_no_range_findings() {
        let (errors, warnings) = validate_physical_ranges(&super::super::AnalysisConfig::default());
        assert!(errors.is_empty());
        assert!(warnings.is_empty());
    }
}
