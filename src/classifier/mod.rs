//! Voltage quality classification
//!
//! Two classifiers share one contract (`Reading` -> `QualityClass`):
//!
//! - `rules`: the deterministic regulatory-band classifier, used as ground
//!   truth for training labels and as the serving fallback.
//! - `forest`: a seeded random-forest ensemble fit on rule labels (minus
//!   `Inactive` rows), used at query time for robustness to feature
//!   combinations the band table does not enumerate.
//!
//! `features` defines the shared 7-feature vector; `evaluation` produces the
//! holdout metrics artifact.

pub mod evaluation;
pub mod features;
pub mod forest;
pub mod rules;

pub use evaluation::{holdout_evaluation, ClassMetrics, ModelEvaluation};
pub use features::{feature_vector, finite_feature_vector, RowError, FEATURE_COUNT, FEATURE_NAMES};
pub use forest::{ForestSettings, TrainingSample, VoltageForest};

use thiserror::Error;

use crate::config::VoltageBands;
use crate::types::{QualityClass, Reading};

/// Classify one reading, preferring the learned model.
///
/// The band rules run first: an `Inactive` reading short-circuits past the
/// forest (idle rows are excluded from training, so the model cannot emit
/// that class), and when no model is available the rule class serves
/// directly. Fails per-row only when the learned path cannot featurize the
/// reading.
pub fn predict_class(
    reading: &Reading,
    model: Option<&VoltageForest>,
    bands: &VoltageBands,
) -> Result<QualityClass, RowError> {
    let rule_class = rules::classify(reading, bands);
    match model {
        Some(forest) if rule_class != QualityClass::Inactive => {
            let features = finite_feature_vector(reading)?;
            Ok(forest.predict(&features))
        }
        _ => Ok(rule_class),
    }
}

/// Why a training run could not produce a model.
///
/// Until resolved by more varied data, the learned classifier is
/// unavailable and the engine serves with the band-rule fallback.
#[derive(Debug, Error)]
pub enum TrainError {
    #[error("training set is empty after excluding inactive readings")]
    EmptyTrainingSet,

    #[error("training set has {distinct} distinct class(es); at least 2 are required")]
    InsufficientClasses { distinct: usize },

    #[error("holdout split produced no test rows (need at least 2 samples in some class)")]
    HoldoutTooSmall,
}
