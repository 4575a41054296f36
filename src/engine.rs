//! Plant engine: the service context owning the reading store and the
//! trained classifier
//!
//! Replaces module-level data/model globals with an explicit object the
//! calling service constructs at startup and shares by reference. Loading a
//! batch builds the store, trains and evaluates the forest, then publishes
//! everything through one atomic swap - in-flight report requests keep the
//! previous state and never observe a half-updated store/model pair.

use arc_swap::ArcSwap;
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{info, warn};

use crate::classifier::{
    self, holdout_evaluation, rules, ForestSettings, ModelEvaluation, TrainError, TrainingSample,
    VoltageForest,
};
use crate::config::PlantConfig;
use crate::diagnosis::diagnose;
use crate::report;
use crate::store::ReadingStore;
use crate::types::{ClassifierMode, DailyReport, QualityClass, Reading};

/// Write-once-per-load snapshot published behind the swap
#[derive(Default)]
struct EngineState {
    store: ReadingStore,
    model: Option<VoltageForest>,
    evaluation: Option<ModelEvaluation>,
}

/// Power-quality engine for one installation.
///
/// Construct once with a loaded [`PlantConfig`], call [`PlantEngine::load`]
/// at startup (and on every data reload), then serve
/// [`PlantEngine::classify_and_diagnose`] and [`PlantEngine::build_report`]
/// concurrently without locking.
pub struct PlantEngine {
    config: PlantConfig,
    state: ArcSwap<EngineState>,
}

impl PlantEngine {
    pub fn new(config: PlantConfig) -> Self {
        for warning in config.validate() {
            warn!(warning = %warning, "Plant config validation");
        }
        Self {
            config,
            state: ArcSwap::from_pointee(EngineState::default()),
        }
    }

    pub fn config(&self) -> &PlantConfig {
        &self.config
    }

    /// Whether a learned model is currently serving predictions
    pub fn model_ready(&self) -> bool {
        self.state.load().model.is_some()
    }

    /// Latest holdout evaluation artifact, if one was produced
    pub fn evaluation(&self) -> Option<ModelEvaluation> {
        self.state.load().evaluation.clone()
    }

    /// Load a batch of readings and retrain the classifier.
    ///
    /// The store is always published, even when training fails - reporting
    /// then degrades to the band-rule fallback instead of crashing. The
    /// returned error is informational: it tells the caller classification
    /// is running degraded until more varied data arrives.
    pub fn load(&self, readings: Vec<Reading>) -> Result<(), TrainError> {
        let bands = &self.config.voltage_bands;

        let mut samples = Vec::new();
        let mut unusable_rows = 0usize;
        for reading in &readings {
            let label = rules::classify(reading, bands);
            if label == QualityClass::Inactive {
                continue;
            }
            match classifier::finite_feature_vector(reading) {
                Ok(features) => samples.push(TrainingSample { features, label }),
                Err(e) => {
                    warn!(timestamp = %reading.timestamp, error = %e, "excluding unusable row from training");
                    unusable_rows += 1;
                }
            }
        }

        let settings = ForestSettings::from(&self.config.model);

        let evaluation = if self.config.model.evaluate_on_fit {
            match holdout_evaluation(&samples, settings, self.config.model.holdout_fraction) {
                Ok(evaluation) => {
                    info!(
                        accuracy = evaluation.accuracy,
                        train_rows = evaluation.train_rows,
                        test_rows = evaluation.test_rows,
                        "holdout evaluation complete"
                    );
                    Some(evaluation)
                }
                Err(e) => {
                    warn!(error = %e, "holdout evaluation skipped");
                    None
                }
            }
        } else {
            None
        };

        match VoltageForest::fit(&samples, settings) {
            Ok(model) => {
                info!(
                    readings = readings.len(),
                    training_rows = samples.len(),
                    unusable_rows,
                    trees = model.tree_count(),
                    "classifier trained, publishing new store and model"
                );
                self.state.store(Arc::new(EngineState {
                    store: ReadingStore::new(readings),
                    model: Some(model),
                    evaluation,
                }));
                Ok(())
            }
            Err(e) => {
                warn!(
                    readings = readings.len(),
                    training_rows = samples.len(),
                    error = %e,
                    "classifier training failed, serving with band-rule fallback"
                );
                self.state.store(Arc::new(EngineState {
                    store: ReadingStore::new(readings),
                    model: None,
                    evaluation,
                }));
                Err(e)
            }
        }
    }

    /// Bulk scoring: one (class, diagnosis text) pair per input reading.
    ///
    /// Total over its input - a row the learned path cannot featurize falls
    /// back to the band rules rather than being dropped, so the output
    /// stays aligned with the input sequence.
    pub fn classify_and_diagnose(&self, readings: &[Reading]) -> Vec<(QualityClass, String)> {
        let state = self.state.load_full();
        let bands = &self.config.voltage_bands;

        readings
            .iter()
            .map(|reading| {
                let class = classifier::predict_class(reading, state.model.as_ref(), bands)
                    .unwrap_or_else(|e| {
                        warn!(timestamp = %reading.timestamp, error = %e, "falling back to band rules for row");
                        rules::classify(reading, bands)
                    });
                let text = diagnose(reading, class, bands).render();
                (class, text)
            })
            .collect()
    }

    /// Build the daily report for `day`, defaulting to the most recent date
    /// in the store.
    pub fn build_report(&self, day: Option<NaiveDate>) -> DailyReport {
        let state = self.state.load_full();

        let Some(day) = day.or_else(|| state.store.latest_date()) else {
            // No batch loaded yet; epoch date keeps the payload well-formed
            let fallback_day = NaiveDate::default();
            return DailyReport::empty(
                fallback_day,
                ClassifierMode::RuleFallback,
                "no readings loaded".to_string(),
            );
        };

        report::build_report(
            day,
            state.store.readings(),
            state.model.as_ref(),
            &self.config,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn reading(day: NaiveDate, hour: u32, minute: u32, power_kw: f64, v1: f64) -> Reading {
        Reading {
            timestamp: day.and_hms_opt(hour, minute, 0).expect("valid timestamp"),
            active_power_kw: power_kw,
            reactive_power_kvar: None,
            voltage_l1: v1,
            voltage_l2: 220.0,
            voltage_l3: 220.0,
            current_l1: 90.0,
            current_l2: 91.0,
            current_l3: 89.0,
            power_factor: None,
            load_factor: None,
        }
    }

    fn varied_batch(day: NaiveDate) -> Vec<Reading> {
        let mut readings = Vec::new();
        for step in 0..30 {
            readings.push(reading(day, 8, step, 40.0, 219.0 + (f64::from(step)) * 0.05));
            readings.push(reading(day, 9, step, 45.0, 232.2 + (f64::from(step)) * 0.01));
            readings.push(reading(day, 10, step, 50.0, 235.0 + (f64::from(step)) * 0.02));
        }
        readings
    }

    fn small_model_config() -> PlantConfig {
        let mut config = PlantConfig::default();
        config.model.trees = 20;
        config
    }

    #[test]
    fn test_engine_starts_without_model() {
        let engine = PlantEngine::new(PlantConfig::default());
        assert!(!engine.model_ready());
        let report = engine.build_report(None);
        assert_eq!(report.error.as_deref(), Some("no readings loaded"));
        assert_eq!(report.classifier_mode, ClassifierMode::RuleFallback);
    }

    #[test]
    fn test_load_trains_and_publishes() {
        let day = NaiveDate::from_ymd_opt(2023, 1, 1).expect("valid date");
        let engine = PlantEngine::new(small_model_config());
        engine.load(varied_batch(day)).expect("training succeeds");
        assert!(engine.model_ready());

        let evaluation = engine.evaluation().expect("evaluation artifact present");
        assert!(evaluation.accuracy > 0.8, "accuracy {}", evaluation.accuracy);

        let report = engine.build_report(None);
        assert_eq!(report.day, day);
        assert_eq!(report.classifier_mode, ClassifierMode::Learned);
        assert!(!report.risk_entries.is_empty());
    }

    #[test]
    fn test_insufficient_variety_degrades_to_rule_fallback() {
        let day = NaiveDate::from_ymd_opt(2023, 1, 1).expect("valid date");
        let engine = PlantEngine::new(small_model_config());
        // Every reading adequate: one distinct class, training must fail
        let batch: Vec<Reading> = (0..20).map(|i| reading(day, 8, i, 30.0, 220.0)).collect();
        let result = engine.load(batch);
        assert!(matches!(
            result,
            Err(TrainError::InsufficientClasses { distinct: 1 })
        ));
        assert!(!engine.model_ready());

        // Reporting still works, degraded
        let report = engine.build_report(None);
        assert_eq!(report.classifier_mode, ClassifierMode::RuleFallback);
        assert!(report.error.is_none());
        assert_eq!(report.readings.len(), 20);
    }

    #[test]
    fn test_reload_swaps_atomically_visible_state() {
        let first_day = NaiveDate::from_ymd_opt(2023, 1, 1).expect("valid date");
        let second_day = NaiveDate::from_ymd_opt(2023, 2, 1).expect("valid date");
        let engine = PlantEngine::new(small_model_config());
        engine.load(varied_batch(first_day)).expect("first load");
        engine.load(varied_batch(second_day)).expect("second load");
        // Default report day follows the newly published store
        let report = engine.build_report(None);
        assert_eq!(report.day, second_day);
    }

    #[test]
    fn test_classify_and_diagnose_stays_aligned() {
        let day = NaiveDate::from_ymd_opt(2023, 1, 1).expect("valid date");
        let engine = PlantEngine::new(small_model_config());
        engine.load(varied_batch(day)).expect("training succeeds");

        let probes = vec![
            reading(day, 12, 0, 40.0, 219.5),
            reading(day, 12, 5, 45.0, 232.3),
            reading(day, 12, 10, 50.0, 235.3),
        ];
        let results = engine.classify_and_diagnose(&probes);
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].0, QualityClass::Adequate);
        assert_eq!(results[0].1, crate::diagnosis::NORMAL_OPERATION_MSG);
        assert_eq!(results[1].0, QualityClass::Precarious);
        assert_eq!(results[2].0, QualityClass::Critical);
        assert!(results[2].1.contains("Phase L1 critical over-voltage (235.3 V)"));
    }

    #[test]
    fn test_all_dead_phases_classify_inactive_through_engine() {
        let day = NaiveDate::from_ymd_opt(2023, 1, 1).expect("valid date");
        let engine = PlantEngine::new(small_model_config());
        engine.load(varied_batch(day)).expect("training succeeds");

        let mut idle = reading(day, 12, 0, 0.0, 0.0);
        idle.voltage_l2 = 0.0;
        idle.voltage_l3 = 0.0;
        let results = engine.classify_and_diagnose(&[idle]);
        assert_eq!(results[0].0, QualityClass::Inactive);
        assert_eq!(
            results[0].1,
            crate::diagnosis::NORMAL_OPERATION_MSG
        );
    }
}
