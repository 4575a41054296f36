//! Feature extraction for the statistical classifier

use thiserror::Error;

use crate::types::Reading;

/// Length of the canonical feature vector
pub const FEATURE_COUNT: usize = 7;

/// Feature names, in vector order. Reactive power and the derived factor
/// fields are deliberately not features.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "active_power_kw",
    "current_l1",
    "current_l2",
    "current_l3",
    "voltage_l1",
    "voltage_l2",
    "voltage_l3",
];

/// Per-row failure raised when a reading cannot be featurized.
///
/// Ingestion coerces unparseable values to zero, so a non-finite value here
/// means an upstream bug. The row is logged and skipped; it never aborts a
/// batch or a report.
#[derive(Debug, Error)]
pub enum RowError {
    #[error("non-finite value {value} in feature `{feature}`")]
    NonFinite { feature: &'static str, value: f64 },
}

/// The canonical feature vector for a reading
pub fn feature_vector(reading: &Reading) -> [f64; FEATURE_COUNT] {
    [
        reading.active_power_kw,
        reading.current_l1,
        reading.current_l2,
        reading.current_l3,
        reading.voltage_l1,
        reading.voltage_l2,
        reading.voltage_l3,
    ]
}

/// Feature vector with a finite guard, for row-isolated pipelines
pub fn finite_feature_vector(reading: &Reading) -> Result<[f64; FEATURE_COUNT], RowError> {
    let features = feature_vector(reading);
    for (value, name) in features.iter().zip(FEATURE_NAMES.iter()) {
        if !value.is_finite() {
            return Err(RowError::NonFinite {
                feature: name,
                value: *value,
            });
        }
    }
    Ok(features)
}
