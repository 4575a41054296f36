//! Seeded random-forest classifier over the canonical feature vector
//!
//! An ensemble of CART trees fit on band-rule labels. Bootstrap row
//! sampling, gini impurity, and a random feature subset per split. Every
//! tree draws its RNG from a per-tree seed derived from the master seed, so
//! training is deterministic regardless of how rayon schedules the trees.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use super::features::FEATURE_COUNT;
use super::TrainError;
use crate::config::ModelConfig;
use crate::types::{QualityClass, CLASS_COUNT};

/// Minimum rows required to attempt a split
const MIN_SAMPLES_SPLIT: usize = 2;

/// One labeled training row
#[derive(Debug, Clone, Copy)]
pub struct TrainingSample {
    pub features: [f64; FEATURE_COUNT],
    pub label: QualityClass,
}

/// Ensemble hyperparameters
#[derive(Debug, Clone, Copy)]
pub struct ForestSettings {
    pub trees: usize,
    pub max_depth: usize,
    pub features_per_split: usize,
    pub seed: u64,
}

impl Default for ForestSettings {
    fn default() -> Self {
        Self {
            trees: 100,
            max_depth: 16,
            features_per_split: 3,
            seed: 42,
        }
    }
}

impl From<&ModelConfig> for ForestSettings {
    fn from(config: &ModelConfig) -> Self {
        Self {
            trees: config.trees,
            max_depth: config.max_depth,
            features_per_split: config.features_per_split,
            seed: config.seed,
        }
    }
}

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        class: QualityClass,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

/// Trained tree ensemble.
///
/// Write-once: fit on a batch, then read-only for the rest of the process
/// lifetime (the engine republishes a fresh forest on reload).
#[derive(Debug, Clone)]
pub struct VoltageForest {
    trees: Vec<Node>,
}

impl VoltageForest {
    /// Fit the ensemble on band-rule-labeled rows.
    ///
    /// The caller has already excluded `Inactive` rows; this function only
    /// checks that enough class variety remains to learn a decision
    /// boundary.
    pub fn fit(samples: &[TrainingSample], settings: ForestSettings) -> Result<Self, TrainError> {
        if samples.is_empty() {
            return Err(TrainError::EmptyTrainingSet);
        }
        let distinct = distinct_class_count(samples);
        if distinct < 2 {
            return Err(TrainError::InsufficientClasses { distinct });
        }

        let tree_count = settings.trees.max(1);
        let features_per_split = settings.features_per_split.clamp(1, FEATURE_COUNT);

        let trees: Vec<Node> = (0..tree_count)
            .into_par_iter()
            .map(|tree_index| {
                let mut rng = StdRng::seed_from_u64(settings.seed.wrapping_add(tree_index as u64));
                let indices: Vec<usize> = (0..samples.len())
                    .map(|_| rng.gen_range(0..samples.len()))
                    .collect();
                grow_tree(
                    samples,
                    &indices,
                    0,
                    settings.max_depth,
                    features_per_split,
                    &mut rng,
                )
            })
            .collect();

        Ok(Self { trees })
    }

    /// Predict the quality class for one feature vector.
    ///
    /// Majority vote across trees; ties resolve to the more severe class
    /// (under-alarming is the worse failure mode for a quality monitor).
    pub fn predict(&self, features: &[f64; FEATURE_COUNT]) -> QualityClass {
        let mut votes = [0usize; CLASS_COUNT];
        for tree in &self.trees {
            votes[predict_tree(tree, features).index()] += 1;
        }
        severity_biased_majority(&votes)
    }

    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }
}

/// Number of distinct labels present in a training set
pub(crate) fn distinct_class_count(samples: &[TrainingSample]) -> usize {
    let mut seen = [false; CLASS_COUNT];
    for sample in samples {
        seen[sample.label.index()] = true;
    }
    seen.iter().filter(|&&present| present).count()
}

/// Argmax over class counts; ties go to the higher-severity index
fn severity_biased_majority(counts: &[usize; CLASS_COUNT]) -> QualityClass {
    let mut best = 0usize;
    for index in 1..CLASS_COUNT {
        if counts[index] >= counts[best] {
            best = index;
        }
    }
    QualityClass::from_index(best).unwrap_or(QualityClass::Critical)
}

fn class_counts(samples: &[TrainingSample], indices: &[usize]) -> [usize; CLASS_COUNT] {
    let mut counts = [0usize; CLASS_COUNT];
    for &index in indices {
        counts[samples[index].label.index()] += 1;
    }
    counts
}

fn gini(counts: &[usize; CLASS_COUNT], n: f64) -> f64 {
    if n <= 0.0 {
        return 0.0;
    }
    let mut sum_sq = 0.0;
    for &count in counts {
        let p = count as f64 / n;
        sum_sq += p * p;
    }
    1.0 - sum_sq
}

fn grow_tree(
    samples: &[TrainingSample],
    indices: &[usize],
    depth: usize,
    max_depth: usize,
    features_per_split: usize,
    rng: &mut StdRng,
) -> Node {
    let counts = class_counts(samples, indices);
    let pure = counts.iter().filter(|&&count| count > 0).count() <= 1;
    if pure || depth >= max_depth || indices.len() < MIN_SAMPLES_SPLIT {
        return Node::Leaf {
            class: severity_biased_majority(&counts),
        };
    }

    let mut candidate_features: Vec<usize> = (0..FEATURE_COUNT).collect();
    candidate_features.shuffle(rng);
    candidate_features.truncate(features_per_split);

    // (impurity, feature, threshold) of the best candidate split
    let mut best: Option<(f64, usize, f64)> = None;
    for &feature in &candidate_features {
        if let Some((impurity, threshold)) = best_split_on_feature(samples, indices, feature) {
            let better = match best {
                None => true,
                Some((best_impurity, _, _)) => impurity < best_impurity,
            };
            if better {
                best = Some((impurity, feature, threshold));
            }
        }
    }

    // No candidate feature had two distinct values
    let Some((_, feature, threshold)) = best else {
        return Node::Leaf {
            class: severity_biased_majority(&counts),
        };
    };

    let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
        .iter()
        .copied()
        .partition(|&index| samples[index].features[feature] <= threshold);

    if left_indices.is_empty() || right_indices.is_empty() {
        return Node::Leaf {
            class: severity_biased_majority(&counts),
        };
    }

    Node::Split {
        feature,
        threshold,
        left: Box::new(grow_tree(
            samples,
            &left_indices,
            depth + 1,
            max_depth,
            features_per_split,
            rng,
        )),
        right: Box::new(grow_tree(
            samples,
            &right_indices,
            depth + 1,
            max_depth,
            features_per_split,
            rng,
        )),
    }
}

/// Best gini-weighted split on one feature, scanning midpoints between
/// consecutive distinct values. Returns `(impurity, threshold)`.
fn best_split_on_feature(
    samples: &[TrainingSample],
    indices: &[usize],
    feature: usize,
) -> Option<(f64, f64)> {
    if indices.len() < MIN_SAMPLES_SPLIT {
        return None;
    }

    let mut ordered: Vec<(f64, usize)> = indices
        .iter()
        .map(|&index| (samples[index].features[feature], samples[index].label.index()))
        .collect();
    ordered.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut total = [0usize; CLASS_COUNT];
    for &(_, class) in &ordered {
        total[class] += 1;
    }

    let n = ordered.len();
    let mut left = [0usize; CLASS_COUNT];
    let mut best: Option<(f64, f64)> = None;

    for split_at in 1..n {
        left[ordered[split_at - 1].1] += 1;
        let previous = ordered[split_at - 1].0;
        let next = ordered[split_at].0;
        if next <= previous {
            continue;
        }

        let mut right = [0usize; CLASS_COUNT];
        for class in 0..CLASS_COUNT {
            right[class] = total[class] - left[class];
        }
        let n_left = split_at as f64;
        let n_right = (n - split_at) as f64;
        let impurity = (n_left * gini(&left, n_left) + n_right * gini(&right, n_right)) / n as f64;

        let better = match best {
            None => true,
            Some((best_impurity, _)) => impurity < best_impurity,
        };
        if better {
            best = Some((impurity, (previous + next) / 2.0));
        }
    }

    best
}

fn predict_tree(node: &Node, features: &[f64; FEATURE_COUNT]) -> QualityClass {
    match node {
        Node::Leaf { class } => *class,
        Node::Split {
            feature,
            threshold,
            left,
            right,
        } => {
            if features[*feature] <= *threshold {
                predict_tree(left, features)
            } else {
                predict_tree(right, features)
            }
        }
    }
}
