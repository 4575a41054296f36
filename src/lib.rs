//! VoltGuard: Power-Quality Intelligence Engine
//!
//! Batch classification and diagnostic reporting for multi-phase electrical
//! measurements from a generation installation.
//!
//! ## Architecture
//!
//! - **Rule Classifier**: deterministic regulatory-band labeling (ground truth)
//! - **Statistical Classifier**: seeded random forest trained on rule labels
//! - **Diagnostic Generator**: per-phase findings with deduplicated actions
//! - **Daily Reporter**: energy/peak aggregates plus the operational risk list
//!
//! The [`engine::PlantEngine`] context object owns the loaded reading batch
//! and the trained model, publishing both atomically on reload. The HTTP,
//! dashboard, and ingestion layers live outside this crate and consume the
//! engine's two call shapes: `classify_and_diagnose` and `build_report`.

pub mod classifier;
pub mod config;
pub mod diagnosis;
pub mod engine;
pub mod report;
pub mod store;
pub mod types;

// Re-export plant configuration
pub use config::{PlantConfig, VoltageBands};

// Re-export commonly used types
pub use types::{
    voltage_bands, ClassifierMode, DailyReport, PeakDemand, QualityClass, Reading, RiskEntry,
};

// Re-export classifier surface
pub use classifier::{
    ForestSettings, ModelEvaluation, RowError, TrainError, TrainingSample, VoltageForest,
};

// Re-export the diagnosis surface
pub use diagnosis::{diagnose, Diagnosis};

// Re-export the engine context
pub use engine::PlantEngine;

// Re-export the store
pub use store::ReadingStore;
