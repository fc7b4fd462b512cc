//! Shared model traits and training preconditions

use ndarray::{Array1, Array2};

use super::Algorithm;
use crate::error::{Result, SketchError};

/// A fitted model that assigns a class label to each row of `x`.
///
/// Labels are returned as `f64` to match the training target layout.
pub trait Classifier: Send + Sync {
    fn predict_labels(&self, x: &Array2<f64>) -> Result<Array1<f64>>;
}

/// Sorted distinct integer labels
pub fn unique_classes(y: &Array1<f64>) -> Vec<i64> {
    let mut classes: Vec<i64> = y.iter().map(|&v| v.round() as i64).collect();
    classes.sort_unstable();
    classes.dedup();
    classes
}

/// Reject point sets smaller than the family minimum
pub fn ensure_min_points(algorithm: Algorithm, n_points: usize) -> Result<()> {
    let required = algorithm.min_points();
    if n_points < required {
        return Err(SketchError::InsufficientData {
            algorithm: algorithm.to_string(),
            required,
            actual: n_points,
        });
    }
    Ok(())
}

/// Reject label sets with fewer than two classes; returns the sorted classes
pub fn ensure_class_diversity(algorithm: Algorithm, y: &Array1<f64>) -> Result<Vec<i64>> {
    let classes = unique_classes(y);
    if classes.len() < 2 {
        return Err(SketchError::InsufficientClassDiversity {
            algorithm: algorithm.to_string(),
        });
    }
    Ok(classes)
}

/// Position of the largest score; the first one wins on ties
pub(crate) fn argmax(scores: impl IntoIterator<Item = f64>) -> usize {
    let mut best_idx = 0;
    let mut best = f64::NEG_INFINITY;
    for (i, s) in scores.into_iter().enumerate() {
        if s > best {
            best = s;
            best_idx = i;
        }
    }
    best_idx
}
