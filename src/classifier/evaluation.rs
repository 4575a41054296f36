//! Holdout evaluation artifact for the statistical classifier
//!
//! A stratified 80/20 split scored with accuracy, per-class
//! precision/recall/F1, and a confusion matrix. This is observability
//! tooling: the serving model is fit on the full training set afterwards,
//! and an evaluation failure is logged, never propagated into serving.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

use super::forest::{ForestSettings, TrainingSample, VoltageForest};
use super::TrainError;
use crate::types::QualityClass;

/// Per-class precision/recall/F1 with support counts
#[derive(Debug, Clone, Serialize)]
pub struct ClassMetrics {
    pub class: QualityClass,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    /// Test rows whose true label is this class
    pub support: usize,
}

/// Evaluation artifact from a stratified holdout split.
///
/// `confusion[actual][predicted]` counts test rows, with both axes indexed
/// by position in `classes` (ascending severity).
#[derive(Debug, Clone, Serialize)]
pub struct ModelEvaluation {
    pub accuracy: f64,
    pub per_class: Vec<ClassMetrics>,
    pub classes: Vec<QualityClass>,
    pub confusion: Vec<Vec<usize>>,
    pub train_rows: usize,
    pub test_rows: usize,
}

/// Train on a stratified subset and score the held-out remainder.
///
/// The split is seeded from the forest seed, so the artifact is reproducible
/// for a given batch. Classes with a single row go entirely to the training
/// side; if that leaves no test rows, evaluation fails with
/// `HoldoutTooSmall`.
pub fn holdout_evaluation(
    samples: &[TrainingSample],
    settings: ForestSettings,
    holdout_fraction: f64,
) -> Result<ModelEvaluation, TrainError> {
    if samples.is_empty() {
        return Err(TrainError::EmptyTrainingSet);
    }

    // Stratify: indices grouped by label, deterministic class order
    let mut by_class: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (index, sample) in samples.iter().enumerate() {
        by_class.entry(sample.label.index()).or_default().push(index);
    }

    let mut rng = StdRng::seed_from_u64(settings.seed);
    let mut train_indices = Vec::new();
    let mut test_indices = Vec::new();
    for indices in by_class.values() {
        let mut shuffled = indices.clone();
        shuffled.shuffle(&mut rng);
        let test_count = if shuffled.len() < 2 {
            0
        } else {
            (((shuffled.len() as f64) * holdout_fraction).round() as usize)
                .clamp(1, shuffled.len() - 1)
        };
        test_indices.extend_from_slice(&shuffled[..test_count]);
        train_indices.extend_from_slice(&shuffled[test_count..]);
    }

    if test_indices.is_empty() {
        return Err(TrainError::HoldoutTooSmall);
    }

    let train_set: Vec<TrainingSample> = train_indices.iter().map(|&i| samples[i]).collect();
    let forest = VoltageForest::fit(&train_set, settings)?;

    let classes: Vec<QualityClass> = by_class
        .keys()
        .filter_map(|&index| QualityClass::from_index(index))
        .collect();
    let position: BTreeMap<usize, usize> = classes
        .iter()
        .enumerate()
        .map(|(position, class)| (class.index(), position))
        .collect();

    let mut confusion = vec![vec![0usize; classes.len()]; classes.len()];
    let mut correct = 0usize;
    for &index in &test_indices {
        let actual = samples[index].label;
        let predicted = forest.predict(&samples[index].features);
        if predicted == actual {
            correct += 1;
        }
        let row = position.get(&actual.index()).copied();
        let column = position.get(&predicted.index()).copied();
        if let (Some(row), Some(column)) = (row, column) {
            confusion[row][column] += 1;
        } else {
            // Predicted class absent from the training label set; count it
            // nowhere but keep the accuracy denominator honest.
            debug!(%predicted, "prediction outside evaluated class set");
        }
    }

    let per_class = classes
        .iter()
        .enumerate()
        .map(|(position, &class)| {
            let true_positives = confusion[position][position];
            let actual_total: usize = confusion[position].iter().sum();
            let predicted_total: usize = confusion.iter().map(|row| row[position]).sum();
            let precision = ratio(true_positives, predicted_total);
            let recall = ratio(true_positives, actual_total);
            let f1 = if precision + recall > 0.0 {
                2.0 * precision * recall / (precision + recall)
            } else {
                0.0
            };
            ClassMetrics {
                class,
                precision,
                recall,
                f1,
                support: actual_total,
            }
        })
        .collect();

    Ok(ModelEvaluation {
        accuracy: ratio(correct, test_indices.len()),
        per_class,
        classes,
        confusion,
        train_rows: train_indices.len(),
        test_rows: test_indices.len(),
    })
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}
