//! Analysis Configuration - instrumentation and fitting constants as TOML values
//!
//! Each struct implements `Default` with the reference-rig values from
//! `defaults`, so an absent or empty config file changes nothing.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::defaults;

/// Environment variable naming the config file.
pub const CONFIG_ENV_VAR: &str = "SELFPROP_CONFIG";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "selfprop.toml";

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for one analysis campaign.
///
/// Load with `AnalysisConfig::load()` which searches:
/// 1. `$SELFPROP_CONFIG` env var
/// 2. `./selfprop.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Experiment identification
    #[serde(default)]
    pub experiment: ExperimentInfo,

    /// Shaft RPM extraction
    #[serde(default)]
    pub rpm: RpmConfig,

    /// Calibration band fitting
    #[serde(default)]
    pub curve_fit: CurveFitConfig,

    /// Band interpolation
    #[serde(default)]
    pub interpolation: InterpolationConfig,
}

impl AnalysisConfig {
    /// Load configuration using the standard search order:
    /// 1. `$SELFPROP_CONFIG` environment variable
    /// 2. `./selfprop.toml` in the current working directory
    /// 3. Built-in defaults
    pub fn load() -> Self {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), experiment = %config.experiment.name, "Loaded analysis config from SELFPROP_CONFIG");
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from SELFPROP_CONFIG, falling back");
                    }
                }
            } else {
                warn!(path = %path, "SELFPROP_CONFIG points to non-existent file, falling back");
            }
        }

        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!(experiment = %config.experiment.name, "Loaded analysis config from ./selfprop.toml");
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./selfprop.toml, using defaults");
                }
            }
        }

        info!("No selfprop.toml found, using built-in defaults");
        Self::default()
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;

        for w in super::validation::validate_unknown_keys(&contents) {
            warn!("{}", w);
        }

        let config: Self = toml::from_str(&contents)
            .map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Save config to a file.
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = self.to_toml()?;
        std::fs::write(path, contents).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        info!(path = %path.display(), "Analysis config saved");
        Ok(())
    }

    /// Validate all values for internal consistency.
    ///
    /// Rules:
    /// - Sample rate, peak threshold and domain step must be finite and > 0
    /// - Fit degree must be >= 1 and the refit degree must not exceed it
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<String> = Vec::new();

        Self::check_positive(self.rpm.sample_rate_hz, "rpm.sample_rate_hz", &mut errors);
        Self::check_positive(self.rpm.peak_threshold_v, "rpm.peak_threshold_v", &mut errors);
        Self::check_positive(
            self.interpolation.domain_step,
            "interpolation.domain_step",
            &mut errors,
        );

        let cf = &self.curve_fit;
        if cf.degree == 0 {
            errors.push("curve_fit.degree must be >= 1".to_string());
        }
        if cf.refit_degree == 0 {
            errors.push("curve_fit.refit_degree must be >= 1".to_string());
        }
        if cf.refit_degree > cf.degree {
            errors.push(format!(
                "curve_fit.refit_degree ({}) must be <= degree ({})",
                cf.refit_degree, cf.degree
            ));
        }

        let (range_errors, range_warnings) = super::validation::validate_physical_ranges(self);
        errors.extend(range_errors);
        for w in &range_warnings {
            warn!("{}", w);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    fn check_positive(value: f64, name: &str, errors: &mut Vec<String>) {
        if !value.is_finite() {
            errors.push(format!("{name}: value must be finite (got {value})"));
        } else if value <= 0.0 {
            errors.push(format!("{name} must be > 0 (got {value})"));
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config I/O error ({}): {}", .0.display(), .1)]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Config parse error ({}): {}", .0.display(), .1)]
    Parse(PathBuf, #[source] toml::de::Error),

    #[error("Config serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Config validation failed:\n  - {}", .0.join("\n  - "))]
    Validation(Vec<String>),
}

// ============================================================================
// Experiment Info
// ============================================================================

/// Identification metadata - not used for logic, but appears in logs and reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentInfo {
    /// Campaign name
    #[serde(default = "default_experiment_name")]
    pub name: String,

    /// Model designation
    #[serde(default)]
    pub model: String,

    #[serde(default)]
    pub description: String,
}

fn default_experiment_name() -> String {
    "DEFAULT".to_string()
}

impl Default for ExperimentInfo {
    fn default() -> Self {
        Self {
            name: default_experiment_name(),
            model: String::new(),
            description: String::new(),
        }
    }
}

// ============================================================================
// RPM Config
// ============================================================================

/// Proximity-sensor RPM extraction settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpmConfig {
    /// Acquisition rate (Hz)
    #[serde(default = "default_sample_rate")]
    pub sample_rate_hz: f64,

    /// Peak detection noise threshold (V)
    #[serde(default = "default_peak_threshold")]
    pub peak_threshold_v: f64,

    /// Leading samples dropped as acceleration transient
    #[serde(default = "default_warm_up")]
    pub warm_up_samples: usize,

    /// Samples added on each side of the minima window
    #[serde(default = "default_boundary_correction")]
    pub boundary_correction: usize,
}

fn default_sample_rate() -> f64 { defaults::SAMPLE_RATE_HZ }
fn default_peak_threshold() -> f64 { defaults::PEAK_THRESHOLD_V }
fn default_warm_up() -> usize { defaults::WARM_UP_SAMPLES }
fn default_boundary_correction() -> usize { defaults::BOUNDARY_CORRECTION_SAMPLES }

impl Default for RpmConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: default_sample_rate(),
            peak_threshold_v: default_peak_threshold(),
            warm_up_samples: default_warm_up(),
            boundary_correction: default_boundary_correction(),
        }
    }
}

// ============================================================================
// Curve Fit Config
// ============================================================================

/// Polynomial degrees for band fits and blended refits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurveFitConfig {
    #[serde(default = "default_fit_degree")]
    pub degree: usize,

    #[serde(default = "default_refit_degree")]
    pub refit_degree: usize,
}

fn default_fit_degree() -> usize { defaults::FIT_DEGREE }
fn default_refit_degree() -> usize { defaults::REFIT_DEGREE }

impl Default for CurveFitConfig {
    fn default() -> Self {
        Self {
            degree: default_fit_degree(),
            refit_degree: default_refit_degree(),
        }
    }
}

// ============================================================================
// Interpolation Config
// ============================================================================

/// Blend-domain settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterpolationConfig {
    /// Step between blend-domain points (x units)
    #[serde(default = "default_domain_step")]
    pub domain_step: f64,
}

fn default_domain_step() -> f64 { defaults::DOMAIN_STEP }

impl Default for InterpolationConfig {
    fn default() -> Self {
        Self {
            domain_step: default_domain_step(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
