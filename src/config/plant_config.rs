//! Plant configuration - engine tunables as operator-editable TOML values
//!
//! Every threshold and tunable has a `Default` matching the built-in
//! regulatory constants, ensuring zero-change behavior when no config file
//! is present.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::types::voltage_bands;

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for a monitored installation.
///
/// Load with `PlantConfig::load()` which searches:
/// 1. `$VOLTGUARD_CONFIG` env var
/// 2. `./voltguard.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlantConfig {
    /// Installation identification
    #[serde(default)]
    pub plant: PlantInfo,

    /// Regulatory voltage tolerance bands
    #[serde(default)]
    pub voltage_bands: VoltageBands,

    /// Sampling and daily-report parameters
    #[serde(default)]
    pub reporting: ReportingConfig,

    /// Statistical classifier tuning
    #[serde(default)]
    pub model: ModelConfig,
}

impl Default for PlantConfig {
    fn default() -> Self {
        Self {
            plant: PlantInfo::default(),
            voltage_bands: VoltageBands::default(),
            reporting: ReportingConfig::default(),
            model: ModelConfig::default(),
        }
    }
}

/// Installation identification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlantInfo {
    /// Human-readable installation name
    #[serde(default = "default_plant_name")]
    pub name: String,
    /// Serving utility / concessionaire, for report headers
    #[serde(default)]
    pub utility: String,
}

fn default_plant_name() -> String {
    "unnamed-installation".to_string()
}

impl Default for PlantInfo {
    fn default() -> Self {
        Self {
            name: default_plant_name(),
            utility: String::new(),
        }
    }
}

/// Regulatory voltage tolerance bands (V).
///
/// Must be strictly ordered: inactive floor < under-critical <
/// under-precarious < over-precarious < over-critical. `validate()` flags
/// violations.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct VoltageBands {
    /// All phases below this mean the installation is idle
    #[serde(default = "default_inactive_floor")]
    pub inactive_floor_v: f64,
    /// Under-voltage below this is critical
    #[serde(default = "default_under_critical")]
    pub under_voltage_critical_v: f64,
    /// Under-voltage below this is precarious
    #[serde(default = "default_under_precarious")]
    pub under_voltage_precarious_v: f64,
    /// Over-voltage above this is precarious
    #[serde(default = "default_over_precarious")]
    pub over_voltage_precarious_v: f64,
    /// Over-voltage above this is critical
    #[serde(default = "default_over_critical")]
    pub over_voltage_critical_v: f64,
}

fn default_inactive_floor() -> f64 {
    voltage_bands::INACTIVE_FLOOR
}
fn default_under_critical() -> f64 {
    voltage_bands::UNDER_VOLTAGE_CRITICAL
}
fn default_under_precarious() -> f64 {
    voltage_bands::UNDER_VOLTAGE_PRECARIOUS
}
fn default_over_precarious() -> f64 {
    voltage_bands::OVER_VOLTAGE_PRECARIOUS
}
fn default_over_critical() -> f64 {
    voltage_bands::OVER_VOLTAGE_CRITICAL
}

impl Default for VoltageBands {
    fn default() -> Self {
        Self {
            inactive_floor_v: default_inactive_floor(),
            under_voltage_critical_v: default_under_critical(),
            under_voltage_precarious_v: default_under_precarious(),
            over_voltage_precarious_v: default_over_precarious(),
            over_voltage_critical_v: default_over_critical(),
        }
    }
}

/// Sampling and daily-report parameters
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ReportingConfig {
    /// Metering sample interval (minutes). Energy integration assumes
    /// uniform, gap-free sampling at this interval.
    #[serde(default = "default_sampling_interval")]
    pub sampling_interval_min: u32,
    /// Operational window start hour (inclusive)
    #[serde(default = "default_operational_start")]
    pub operational_start_hour: u32,
    /// Operational window end hour (exclusive)
    #[serde(default = "default_operational_end")]
    pub operational_end_hour: u32,
}

fn default_sampling_interval() -> u32 {
    5
}
fn default_operational_start() -> u32 {
    6
}
fn default_operational_end() -> u32 {
    19
}

impl Default for ReportingConfig {
    fn default() -> Self {
        Self {
            sampling_interval_min: default_sampling_interval(),
            operational_start_hour: default_operational_start(),
            operational_end_hour: default_operational_end(),
        }
    }
}

/// Statistical classifier tuning
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Number of trees in the ensemble
    #[serde(default = "default_trees")]
    pub trees: usize,
    /// Maximum tree depth
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    /// Random features considered per split (sqrt of the 7-feature vector)
    #[serde(default = "default_features_per_split")]
    pub features_per_split: usize,
    /// Master RNG seed - fixed so retraining on identical data yields
    /// identical trees and predictions
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Held-out fraction for the evaluation artifact
    #[serde(default = "default_holdout_fraction")]
    pub holdout_fraction: f64,
    /// Whether to produce the evaluation artifact on every fit
    #[serde(default = "default_evaluate_on_fit")]
    pub evaluate_on_fit: bool,
}

fn default_trees() -> usize {
    100
}
fn default_max_depth() -> usize {
    16
}
fn default_features_per_split() -> usize {
    3
}
fn default_seed() -> u64 {
    42
}
fn default_holdout_fraction() -> f64 {
    0.2
}
fn default_evaluate_on_fit() -> bool {
    true
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            trees: default_trees(),
            max_depth: default_max_depth(),
            features_per_split: default_features_per_split(),
            seed: default_seed(),
            holdout_fraction: default_holdout_fraction(),
            evaluate_on_fit: default_evaluate_on_fit(),
        }
    }
}

// ============================================================================
// Loading & Validation
// ============================================================================

impl PlantConfig {
    /// Load configuration using the standard search order:
    /// 1. `$VOLTGUARD_CONFIG` environment variable
    /// 2. `./voltguard.toml` in the current working directory
    /// 3. Built-in defaults (regulatory constants)
    pub fn load() -> Self {
        if let Ok(path) = std::env::var("VOLTGUARD_CONFIG") {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), plant = %config.plant.name, "Loaded plant config from VOLTGUARD_CONFIG");
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from VOLTGUARD_CONFIG, falling back");
                    }
                }
            } else {
                warn!(path = %path, "VOLTGUARD_CONFIG points to non-existent file, falling back");
            }
        }

        let local = Path::new("voltguard.toml");
        if local.exists() {
            match Self::load_from_file(local) {
                Ok(config) => {
                    info!(plant = %config.plant.name, "Loaded plant config from ./voltguard.toml");
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./voltguard.toml, using defaults");
                }
            }
        }

        info!("No config file found, using built-in defaults");
        Self::default()
    }

    /// Load and validate a specific TOML file
    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        use anyhow::Context;

        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config: Self = toml::from_str(&raw)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        for warning in config.validate() {
            warn!(warning = %warning, "Plant config validation");
        }
        Ok(config)
    }

    /// Sanity-check the configuration, returning human-readable warnings.
    ///
    /// Warnings are advisory: a misordered band table still loads (the
    /// operator may be experimenting), it just will not classify sensibly.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        let b = &self.voltage_bands;
        let ordered = b.inactive_floor_v < b.under_voltage_critical_v
            && b.under_voltage_critical_v < b.under_voltage_precarious_v
            && b.under_voltage_precarious_v < b.over_voltage_precarious_v
            && b.over_voltage_precarious_v < b.over_voltage_critical_v;
        if !ordered {
            warnings.push(format!(
                "voltage bands are not strictly ordered: floor {} / under-critical {} / under-precarious {} / over-precarious {} / over-critical {}",
                b.inactive_floor_v,
                b.under_voltage_critical_v,
                b.under_voltage_precarious_v,
                b.over_voltage_precarious_v,
                b.over_voltage_critical_v
            ));
        }

        let r = &self.reporting;
        if r.sampling_interval_min == 0 {
            warnings.push("sampling_interval_min must be positive".to_string());
        }
        if r.operational_start_hour >= r.operational_end_hour || r.operational_end_hour > 24 {
            warnings.push(format!(
                "operational window [{}, {}) is not a valid hour range",
                r.operational_start_hour, r.operational_end_hour
            ));
        }

        let m = &self.model;
        if m.trees == 0 {
            warnings.push("model.trees must be at least 1".to_string());
        }
        if m.features_per_split == 0 {
            warnings.push("model.features_per_split must be at least 1".to_string());
        }
        if !(m.holdout_fraction > 0.0 && m.holdout_fraction < 0.5) {
            warnings.push(format!(
                "model.holdout_fraction {} outside (0, 0.5)",
                m.holdout_fraction
            ));
        }

        warnings
    }
}
