//! Random Forest implementation
//!
//! Bagged Gini trees with a random feature subset at each split. Prediction
//! averages the leaf class distributions of every tree (soft voting).

use super::config::RANDOM_SEED;
use super::decision_tree::DecisionTree;
use super::models::{argmax, unique_classes, Classifier};
use crate::error::{Result, SketchError};
use ndarray::{Array1, Array2, Axis};
use rand::RngCore;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Random Forest classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    /// Number of trees
    pub n_estimators: usize,
    /// Maximum depth per tree
    pub max_depth: Option<usize>,
    pub random_state: u64,
    feature_importances: Option<Array1<f64>>,
    n_features: usize,
    classes: Vec<i64>,
}

impl Default for RandomForest {
    fn default() -> Self {
        Self::new_classifier(100)
    }
}

impl RandomForest {
    pub fn new_classifier(n_estimators: usize) -> Self {
        Self {
            trees: Vec::new(),
            n_estimators,
            max_depth: None,
            random_state: RANDOM_SEED,
            feature_importances: None,
            n_features: 0,
            classes: Vec::new(),
        }
    }

    /// Set maximum depth
    pub fn with_max_depth(mut self, depth: Option<usize>) -> Self {
        self.max_depth = depth;
        self
    }

    /// Set random state
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    /// Features examined per split: floor of the square root, at least one
    fn max_features(n_features: usize) -> usize {
        ((n_features as f64).sqrt().floor() as usize).max(1)
    }

    /// Fit the forest to training data
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        let n_samples = x.nrows();
        let n_features = x.ncols();

        if self.n_estimators == 0 {
            return Err(SketchError::invalid_parameter(
                "n_estimators",
                self.n_estimators,
                "must be at least 1",
            ));
        }
        if self.max_depth == Some(0) {
            return Err(SketchError::invalid_parameter("max_depth", 0, "must be at least 1"));
        }
        if n_samples != y.len() || n_samples == 0 {
            return Err(SketchError::ComputationError(format!(
                "x has {} rows but y has {} labels",
                n_samples,
                y.len()
            )));
        }

        self.n_features = n_features;
        self.classes = unique_classes(y);
        let max_features = Self::max_features(n_features);

        // Build trees in parallel; collect keeps tree order
        let trees: Vec<Result<DecisionTree>> = (0..self.n_estimators)
            .into_par_iter()
            .map(|tree_idx| -> Result<DecisionTree> {
                let seed = self.random_state.wrapping_add(tree_idx as u64);
                let mut rng = ChaCha8Rng::seed_from_u64(seed);

                // Bootstrap sample of the same size
                let sample_indices: Vec<usize> = (0..n_samples)
                    .map(|_| (rng.next_u64() as usize) % n_samples)
                    .collect();

                let x_boot = x.select(Axis(0), &sample_indices);
                let y_boot: Array1<f64> = sample_indices.iter().map(|&i| y[i]).collect();

                let mut tree = DecisionTree::new_classifier()
                    .with_max_features(max_features)
                    .with_random_state(rng.next_u64())
                    .with_classes(self.classes.clone());
                tree.max_depth = self.max_depth;
                tree.fit(&x_boot, &y_boot)?;
                Ok(tree)
            })
            .collect();

        self.trees = trees.into_iter().collect::<Result<Vec<_>>>()?;
        self.compute_feature_importances();

        Ok(self)
    }

    /// Mean of per-tree importances over trees that split at least once,
    /// renormalized to sum to one
    fn compute_feature_importances(&mut self) {
        let mut total_importances = vec![0.0; self.n_features];
        let mut contributing = 0usize;

        for tree in &self.trees {
            if tree.get_n_leaves() <= 1 {
                continue;
            }
            if let Some(imp) = tree.feature_importances() {
                contributing += 1;
                for (total, &val) in total_importances.iter_mut().zip(imp.iter()) {
                    *total += val;
                }
            }
        }

        if contributing > 0 {
            for imp in &mut total_importances {
                *imp /= contributing as f64;
            }
        }

        let total: f64 = total_importances.iter().sum();
        if total > 0.0 {
            for imp in &mut total_importances {
                *imp /= total;
            }
        }

        self.feature_importances = Some(Array1::from_vec(total_importances));
    }

    /// Averaged class probabilities, columns in class order
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if self.trees.is_empty() {
            return Err(SketchError::EvaluationFailure(
                "random forest is not fitted".to_string(),
            ));
        }
        if x.ncols() != self.n_features {
            return Err(SketchError::EvaluationFailure(format!(
                "expected {} features, got {}",
                self.n_features,
                x.ncols()
            )));
        }

        let n_classes = self.classes.len();
        let n_trees = self.trees.len() as f64;

        let rows: Vec<Vec<f64>> = (0..x.nrows())
            .into_par_iter()
            .map(|i| -> Result<Vec<f64>> {
                let row = x.row(i);
                let mut proba = vec![0.0; n_classes];
                for tree in &self.trees {
                    let dist = tree.predict_proba_row(&row)?;
                    for (p, &d) in proba.iter_mut().zip(dist.iter()) {
                        *p += d;
                    }
                }
                for p in &mut proba {
                    *p /= n_trees;
                }
                Ok(proba)
            })
            .collect::<Result<Vec<_>>>()?;

        let flat: Vec<f64> = rows.into_iter().flatten().collect();
        Ok(Array2::from_shape_vec((x.nrows(), n_classes), flat)?)
    }

    /// Make predictions
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let proba = self.predict_proba(x)?;
        Ok(proba
            .rows()
            .into_iter()
            .map(|row| self.classes[argmax(row.iter().copied())] as f64)
            .collect())
    }

    /// Get feature importances
    pub fn feature_importances(&self) -> Option<&Array1<f64>> {
        self.feature_importances.as_ref()
    }

    /// Get number of trees
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn classes(&self) -> &[i64] {
        &self.classes
    }
}

impl Classifier for RandomForest {
    fn predict_labels(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        self.predict(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_classifier() {
        let x = array![
            [0.0, 0.0],
            [0.1, 0.1],
            [0.2, 0.2],
            [1.0, 1.0],
            [1.1, 1.1],
            [1.2, 1.2],
        ];
        let y = array![0.0, 0.0, 0.0, 1.0, 1.0, 1.0];

        let mut rf = RandomForest::new_classifier(10);
        rf.fit(&x, &y).unwrap();

        let predictions = rf.predict(&x).unwrap();
        let accuracy = predictions
            .iter()
            .zip(y.iter())
            .filter(|(p, a)| (*p - *a).abs() < 0.5)
            .count() as f64
            / y.len() as f64;

        assert!(accuracy >= 0.8, "Accuracy too low: {}", accuracy);
        assert_eq!(rf.n_trees(), 10);
    }

    #[test]
    fn test_predict_proba() {
        let x = array![[0.0, 0.0], [1.0, 1.0]];
        let y = array![0.0, 1.0];

        let mut rf = RandomForest::new_classifier(10);
        rf.fit(&x, &y).unwrap();

        let proba = rf.predict_proba(&x).unwrap();
        assert_eq!(proba.dim(), (2, 2));
        for i in 0..proba.nrows() {
            let row_sum: f64 = proba.row(i).sum();
            assert!((row_sum - 1.0).abs() < 1e-6, "Row {} sum: {}", i, row_sum);
        }
    }

    #[test]
    fn test_feature_importances() {
        let x = array![[1.0, 0.0], [2.0, 0.0], [3.0, 0.0], [4.0, 0.0]];
        let y = array![0.0, 0.0, 1.0, 1.0];

        let mut rf = RandomForest::new_classifier(10);
        rf.fit(&x, &y).unwrap();

        let importances = rf.feature_importances().unwrap();
        assert_eq!(importances.len(), 2);
        // The second feature is constant and can never split
        assert_eq!(importances[1], 0.0);
        assert!((importances.sum() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_deterministic() {
        let x = array![[0.0, 1.0], [1.0, 0.0], [2.0, 2.0], [3.0, 1.0], [0.5, 2.5]];
        let y = array![0.0, 1.0, 0.0, 1.0, 2.0];
        let mut a = RandomForest::new_classifier(20);
        let mut b = RandomForest::new_classifier(20);
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();
        assert_eq!(a.predict_proba(&x).unwrap(), b.predict_proba(&x).unwrap());
        assert_eq!(a.feature_importances(), b.feature_importances());
    }

    #[test]
    fn test_zero_estimators_rejected() {
        let x = array![[0.0, 0.0], [1.0, 1.0]];
        let y = array![0.0, 1.0];
        assert!(matches!(
            RandomForest::new_classifier(0).fit(&x, &y),
            Err(SketchError::InvalidParameter { .. })
        ));
    }
}
