//! Naive Bayes classifier
//!
//! Gaussian Naive Bayes for continuous features.

use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use super::models::{argmax, Classifier};
use crate::error::{Result, SketchError};

/// Gaussian Naive Bayes Classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GaussianNaiveBayes {
    /// Mean of each feature, one row per class
    theta: Vec<Vec<f64>>,
    /// Variance of each feature (smoothed), one row per class
    var: Vec<Vec<f64>>,
    /// Prior probability of each class
    priors: Vec<f64>,
    /// Sorted class labels
    classes: Vec<i64>,
    /// Portion of the largest feature variance added to every variance
    var_smoothing: f64,
}

impl Default for GaussianNaiveBayes {
    fn default() -> Self {
        Self::new()
    }
}

impl GaussianNaiveBayes {
    pub fn new() -> Self {
        Self {
            theta: Vec::new(),
            var: Vec::new(),
            priors: Vec::new(),
            classes: Vec::new(),
            var_smoothing: 1e-9,
        }
    }

    /// Fit the classifier
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        let n_samples = x.nrows();
        let n_features = x.ncols();
        if n_samples == 0 {
            return Err(SketchError::ComputationError(
                "naive bayes needs at least one sample".to_string(),
            ));
        }

        let labels: Vec<i64> = y.iter().map(|&v| v.round() as i64).collect();
        let mut classes = labels.clone();
        classes.sort_unstable();
        classes.dedup();

        // Smoothing is relative to the widest feature spread; a fully
        // degenerate input falls back to the absolute value.
        let max_var = x
            .columns()
            .into_iter()
            .map(|col| col.var(0.0))
            .fold(0.0_f64, f64::max);
        let epsilon = if max_var > 0.0 {
            self.var_smoothing * max_var
        } else {
            self.var_smoothing
        };

        let mut theta = Vec::with_capacity(classes.len());
        let mut var = Vec::with_capacity(classes.len());
        let mut priors = Vec::with_capacity(classes.len());

        for &class in &classes {
            // Single-pass Welford's algorithm for mean and variance
            let mut feature_means = vec![0.0; n_features];
            let mut feature_m2 = vec![0.0; n_features];
            let mut count = 0usize;
            for (idx, _) in labels.iter().enumerate().filter(|(_, &l)| l == class) {
                count += 1;
                for (j, &val) in x.row(idx).iter().enumerate() {
                    let delta = val - feature_means[j];
                    feature_means[j] += delta / count as f64;
                    let delta2 = val - feature_means[j];
                    feature_m2[j] += delta * delta2;
                }
            }

            let feature_vars: Vec<f64> = feature_m2
                .iter()
                .map(|&m2| m2 / count as f64 + epsilon)
                .collect();

            theta.push(feature_means);
            var.push(feature_vars);
            priors.push(count as f64 / n_samples as f64);
        }

        self.theta = theta;
        self.var = var;
        self.priors = priors;
        self.classes = classes;
        Ok(self)
    }

    /// Predict class labels
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.classes.is_empty() {
            return Err(SketchError::EvaluationFailure(
                "naive bayes model is not fitted".to_string(),
            ));
        }
        let n_features = self.theta.first().map(|t| t.len()).unwrap_or(0);
        if x.ncols() != n_features {
            return Err(SketchError::EvaluationFailure(format!(
                "expected {} features, got {}",
                n_features,
                x.ncols()
            )));
        }

        Ok(x.rows()
            .into_iter()
            .map(|row| {
                let scores = (0..self.classes.len()).map(|c| self.joint_log_likelihood(&row, c));
                self.classes[argmax(scores)] as f64
            })
            .collect())
    }

    fn joint_log_likelihood(&self, row: &ArrayView1<f64>, class_idx: usize) -> f64 {
        let means = &self.theta[class_idx];
        let vars = &self.var[class_idx];

        let log_likelihood: f64 = row
            .iter()
            .zip(means.iter())
            .zip(vars.iter())
            .map(|((&xi, &mean), &var)| -0.5 * ((xi - mean).powi(2) / var + var.ln() + (2.0 * PI).ln()))
            .sum();

        self.priors[class_idx].ln() + log_likelihood
    }

    /// Per-class feature means, rows ordered by class
    pub fn theta(&self) -> &[Vec<f64>] {
        &self.theta
    }

    /// Per-class feature variances, rows ordered by class
    pub fn var(&self) -> &[Vec<f64>] {
        &self.var
    }

    pub fn classes(&self) -> &[i64] {
        &self.classes
    }
}

impl Classifier for GaussianNaiveBayes {
    fn predict_labels(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        self.predict(x)
    }
}
