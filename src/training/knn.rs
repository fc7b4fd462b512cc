//! K-Nearest Neighbors classifier
//!
//! Euclidean distance with uniform majority voting. Ties are deterministic:
//! equal distances keep training order, equal vote counts pick the smaller
//! label.

use ndarray::{Array1, Array2, ArrayView1};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use super::models::Classifier;
use crate::error::{Result, SketchError};

/// KNN configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KNNConfig {
    /// Number of neighbors
    pub n_neighbors: usize,
}

impl Default for KNNConfig {
    fn default() -> Self {
        Self { n_neighbors: 5 }
    }
}

/// K-Nearest Neighbors Classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KNNClassifier {
    config: KNNConfig,
    x_train: Option<Array2<f64>>,
    y_train: Vec<i64>,
    classes: Vec<i64>,
}

impl KNNClassifier {
    pub fn new(config: KNNConfig) -> Self {
        Self {
            config,
            x_train: None,
            y_train: Vec::new(),
            classes: Vec::new(),
        }
    }

    /// Create with default config and specified k
    pub fn with_k(k: usize) -> Self {
        Self::new(KNNConfig { n_neighbors: k })
    }

    /// Fit the classifier (stores training data)
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        if self.config.n_neighbors == 0 {
            return Err(SketchError::invalid_parameter(
                "n_neighbors",
                self.config.n_neighbors,
                "must be at least 1",
            ));
        }
        if x.nrows() < self.config.n_neighbors {
            return Err(SketchError::ComputationError(format!(
                "n_neighbors ({}) exceeds the number of samples ({})",
                self.config.n_neighbors,
                x.nrows()
            )));
        }

        self.y_train = y.iter().map(|&v| v.round() as i64).collect();
        let mut classes = self.y_train.clone();
        classes.sort_unstable();
        classes.dedup();
        self.classes = classes;
        self.x_train = Some(x.clone());

        Ok(self)
    }

    /// Predict class labels (parallelized over query rows)
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let x_train = self
            .x_train
            .as_ref()
            .ok_or_else(|| SketchError::EvaluationFailure("knn model is not fitted".to_string()))?;
        if x.ncols() != x_train.ncols() {
            return Err(SketchError::EvaluationFailure(format!(
                "expected {} features, got {}",
                x_train.ncols(),
                x.ncols()
            )));
        }

        let predictions: Vec<f64> = (0..x.nrows())
            .into_par_iter()
            .map(|i| {
                let neighbors = self.k_nearest(&x.row(i), x_train);
                self.vote(&neighbors) as f64
            })
            .collect();

        Ok(Array1::from_vec(predictions))
    }

    /// Indices of the k closest training rows
    fn k_nearest(&self, query: &ArrayView1<f64>, x_train: &Array2<f64>) -> Vec<usize> {
        let mut distances: Vec<(f64, usize)> = x_train
            .rows()
            .into_iter()
            .enumerate()
            .map(|(idx, row)| (euclidean(query, &row), idx))
            .collect();

        distances.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal).then(a.1.cmp(&b.1)));
        distances
            .into_iter()
            .take(self.config.n_neighbors)
            .map(|(_, idx)| idx)
            .collect()
    }

    fn vote(&self, neighbors: &[usize]) -> i64 {
        let mut counts = vec![0usize; self.classes.len()];
        for &idx in neighbors {
            if let Ok(c) = self.classes.binary_search(&self.y_train[idx]) {
                counts[c] += 1;
            }
        }

        // Strict comparison keeps the smaller label on ties
        let mut best = 0;
        for (c, &count) in counts.iter().enumerate() {
            if count > counts[best] {
                best = c;
            }
        }
        self.classes.get(best).copied().unwrap_or_default()
    }

    pub fn classes(&self) -> &[i64] {
        &self.classes
    }
}

impl Classifier for KNNClassifier {
    fn predict_labels(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        self.predict(x)
    }
}

fn euclidean(a: &ArrayView1<f64>, b: &ArrayView1<f64>) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}
