//! Plant Configuration Module
//!
//! Operator-tunable engine configuration loaded from TOML, replacing
//! hardcoded regulatory thresholds with editable values.
//!
//! ## Loading Order
//!
//! 1. `VOLTGUARD_CONFIG` environment variable (path to TOML file)
//! 2. `voltguard.toml` in the current working directory
//! 3. Built-in defaults (matching the regulatory band constants)
//!
//! The loaded config is passed explicitly into [`crate::engine::PlantEngine`];
//! there is no process-global config state.

mod plant_config;

pub use plant_config::{ModelConfig, PlantConfig, PlantInfo, ReportingConfig, VoltageBands};
