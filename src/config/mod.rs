//! Analysis Configuration Module
//!
//! Provides per-campaign configuration loaded from TOML files: acquisition
//! rate, peak threshold, warm-up trimming, and curve-fit degrees.
//!
//! ## Loading Order
//!
//! 1. `SELFPROP_CONFIG` environment variable (path to TOML file)
//! 2. `selfprop.toml` in the current working directory
//! 3. Built-in defaults (reference towing-tank instrumentation)
//!
//! ## Usage
//!
//! Binaries call `config::init()` once at startup, then `config::get()`.
//! Library operations never read the global; they take their parameters
//! explicitly (`RpmParams`, `BandInterpolator`).
//!
//! ```ignore
//! config::init(AnalysisConfig::load());
//! let params = RpmParams::from_config(&config::get().rpm);
//! ```

mod analysis_config;
pub mod defaults;
pub mod validation;

pub use analysis_config::*;

use std::sync::OnceLock;

/// Global analysis configuration, initialized once at startup.
static ANALYSIS_CONFIG: OnceLock<AnalysisConfig> = OnceLock::new();

/// Initialize the global analysis configuration.
///
/// A second call is ignored with a warning.
pub fn init(config: AnalysisConfig) {
    if ANALYSIS_CONFIG.set(config).is_err() {
        tracing::warn!("config::init() called more than once, ignoring");
    }
}

/// Get a reference to the global analysis configuration.
///
/// Panics if `init()` has not been called; a missing config is a startup bug.
pub fn get() -> &'static AnalysisConfig {
    ANALYSIS_CONFIG
        .get()
        .expect("config::get() called before config::init()")
}

/// Check whether the config has been initialized.
pub fn is_initialized() -> bool {
    ANALYSIS_CONFIG.get().is_some()
}
