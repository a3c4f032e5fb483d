//! Reference classifiers
//!
//! Labels are class indices stored as `f64`; every classifier votes by
//! majority and breaks ties towards the smallest class.

mod dummy;
mod forest;
mod tree;

pub use dummy::DummyClassifier;
pub use forest::{MaxFeatures, RandomForestClassifier};
pub use tree::DecisionTreeClassifier;

use crate::core::PipelineError;
use ndarray::{Array1, Array2};
use std::collections::BTreeMap;

/// Seed used when no `random_state` is configured
pub const DEFAULT_SEED: u64 = 42;

/// Class counts keyed by the rounded label
pub(crate) fn class_counts(labels: impl IntoIterator<Item = f64>) -> BTreeMap<i64, usize> {
    let mut counts = BTreeMap::new();
    for label in labels {
        *counts.entry(label.round() as i64).or_insert(0) += 1;
    }
    counts
}

/// Most frequent class; the smallest class wins ties
pub(crate) fn majority(counts: &BTreeMap<i64, usize>) -> f64 {
    let mut best: Option<(i64, usize)> = None;
    for (&class, &count) in counts {
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((class, count));
        }
    }
    best.map(|(class, _)| class as f64).unwrap_or(0.0)
}

/// Check the feature count seen at prediction time
pub(crate) fn check_features(expected: usize, x: &Array2<f64>) -> Result<(), PipelineError> {
    if x.ncols() != expected {
        return Err(PipelineError::Shape {
            expected: format!("{} features", expected),
            actual: format!("{} features", x.ncols()),
        });
    }
    Ok(())
}

/// Fraction of predictions equal to the true labels
pub fn accuracy(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<f64, PipelineError> {
    if y_true.len() != y_pred.len() {
        return Err(PipelineError::Shape {
            expected: format!("{} predictions", y_true.len()),
            actual: format!("{} predictions", y_pred.len()),
        });
    }
    if y_true.is_empty() {
        return Ok(0.0);
    }
    let hits = y_true
        .iter()
        .zip(y_pred.iter())
        .filter(|(t, p)| (*t - *p).abs() < 1e-9)
        .count();
    Ok(hits as f64 / y_true.len() as f64)
}
