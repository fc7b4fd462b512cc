//! Linear model implementations

use crate::error::{Result, SketchError};
use super::config::LOGISTIC_MAX_ITER;
use super::models::{argmax, unique_classes, Classifier};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// Ordinary least squares with intercept
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearRegression {
    /// Fitted coefficients (weights)
    pub coefficients: Option<Array1<f64>>,
    /// Fitted intercept (bias)
    pub intercept: Option<f64>,
    pub is_fitted: bool,
}

impl Default for LinearRegression {
    fn default() -> Self {
        Self::new()
    }
}

impl LinearRegression {
    pub fn new() -> Self {
        Self {
            coefficients: None,
            intercept: None,
            is_fitted: false,
        }
    }

    /// Fit `y = slope · x + intercept` on a single feature column.
    ///
    /// When every x is equal the slope is 0 and the intercept is the mean of y.
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        let n_samples = x.nrows();

        if n_samples != y.len() {
            return Err(SketchError::ComputationError(format!(
                "x has {} rows but y has {} values",
                n_samples,
                y.len()
            )));
        }
        if n_samples == 0 {
            return Err(SketchError::ComputationError("no samples to fit".to_string()));
        }
        if x.ncols() != 1 {
            return Err(SketchError::ComputationError(format!(
                "expected a single feature, got {}",
                x.ncols()
            )));
        }

        let xs = x.column(0);
        let x_mean = xs.sum() / n_samples as f64;
        let y_mean = y.sum() / n_samples as f64;

        let first = xs[0];
        let slope = if xs.iter().all(|&v| v == first) {
            0.0
        } else {
            let sxx: f64 = xs.iter().map(|&v| (v - x_mean).powi(2)).sum();
            let sxy: f64 = xs
                .iter()
                .zip(y.iter())
                .map(|(&xv, &yv)| (xv - x_mean) * (yv - y_mean))
                .sum();
            sxy / sxx
        };

        self.coefficients = Some(Array1::from_elem(1, slope));
        self.intercept = Some(y_mean - slope * x_mean);
        self.is_fitted = true;
        Ok(self)
    }

    /// Make predictions
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let coefficients = self
            .coefficients
            .as_ref()
            .filter(|_| self.is_fitted)
            .ok_or_else(|| SketchError::EvaluationFailure("linear model is not fitted".to_string()))?;
        if x.ncols() != coefficients.len() {
            return Err(SketchError::EvaluationFailure(format!(
                "expected {} features, got {}",
                coefficients.len(),
                x.ncols()
            )));
        }
        Ok(x.dot(coefficients) + self.intercept.unwrap_or(0.0))
    }

    /// Slope of a single-feature fit
    pub fn slope(&self) -> f64 {
        self.coefficients
            .as_ref()
            .and_then(|c| c.get(0).copied())
            .unwrap_or(0.0)
    }
}

/// One linear scorer per class (a single one for binary problems)
#[derive(Debug, Clone, Serialize, Deserialize)]
struct LinearScorer {
    weights: Array1<f64>,
    bias: f64,
}

/// L2-regularized logistic regression.
///
/// `c` is the inverse regularization strength. Binary problems train one
/// scorer for the greater label; more classes train one-vs-rest scorers.
/// Optimization runs on standardized features and the weights are mapped
/// back to the input scale afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegression {
    pub c: f64,
    pub max_iter: usize,
    pub tol: f64,
    classes: Vec<i64>,
    scorers: Vec<LinearScorer>,
    pub is_fitted: bool,
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl LogisticRegression {
    pub fn new(c: f64) -> Self {
        Self {
            c,
            max_iter: LOGISTIC_MAX_ITER,
            tol: 1e-6,
            classes: Vec::new(),
            scorers: Vec::new(),
            is_fitted: false,
        }
    }

    fn sigmoid(z: f64) -> f64 {
        1.0 / (1.0 + (-z).exp())
    }

    /// Fit the model using gradient descent
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        if self.c.is_nan() || self.c <= 0.0 {
            return Err(SketchError::invalid_parameter("C", self.c, "must be positive"));
        }
        let n_samples = x.nrows();
        if n_samples != y.len() || n_samples == 0 {
            return Err(SketchError::ComputationError(format!(
                "x has {} rows but y has {} values",
                n_samples,
                y.len()
            )));
        }

        self.classes = unique_classes(y);
        if self.classes.len() < 2 {
            return Err(SketchError::ComputationError(
                "logistic regression needs at least two classes".to_string(),
            ));
        }

        let mean = x
            .mean_axis(Axis(0))
            .ok_or_else(|| SketchError::ComputationError("empty feature matrix".to_string()))?;
        let std = x.std_axis(Axis(0), 0.0).mapv(|s| if s > 0.0 { s } else { 1.0 });
        let x_std = (x - &mean.clone().insert_axis(Axis(0))) / &std.clone().insert_axis(Axis(0));

        let positives: Vec<i64> = if self.classes.len() == 2 {
            vec![self.classes[1]]
        } else {
            self.classes.clone()
        };

        self.scorers = positives
            .iter()
            .map(|&cls| {
                let target = y.mapv(|v| if v.round() as i64 == cls { 1.0 } else { 0.0 });
                let (w, b) = self.gradient_descent(&x_std, &target);
                // Undo standardization: w·((x - m)/s) + b
                let weights = &w / &std;
                let bias = b - weights.dot(&mean);
                LinearScorer { weights, bias }
            })
            .collect();

        self.is_fitted = true;
        Ok(self)
    }

    fn gradient_descent(&self, x: &Array2<f64>, y: &Array1<f64>) -> (Array1<f64>, f64) {
        let n = x.nrows() as f64;
        let lambda = 1.0 / (self.c * n);
        // Lipschitz bound of the mean log-loss gradient on standardized features
        let lr = 1.0 / (0.25 * x.ncols() as f64 + lambda);

        let mut weights = Array1::zeros(x.ncols());
        let mut bias = 0.0;

        for _iter in 0..self.max_iter {
            let linear = x.dot(&weights) + bias;
            let errors = linear.mapv(Self::sigmoid) - y;

            let dw = x.t().dot(&errors) / n + lambda * &weights;
            let db = errors.mean().unwrap_or(0.0);

            let grad_norm = (dw.mapv(|v| v * v).sum() + db * db).sqrt();
            if grad_norm < self.tol {
                break;
            }

            weights = weights - lr * dw;
            bias -= lr * db;
        }

        (weights, bias)
    }

    /// Predict class labels
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if !self.is_fitted {
            return Err(SketchError::EvaluationFailure(
                "logistic model is not fitted".to_string(),
            ));
        }

        let scores: Vec<Array1<f64>> = self
            .scorers
            .iter()
            .map(|s| x.dot(&s.weights) + s.bias)
            .collect();

        let predictions = (0..x.nrows())
            .map(|i| {
                if self.classes.len() == 2 {
                    let cls = if scores[0][i] > 0.0 { self.classes[1] } else { self.classes[0] };
                    cls as f64
                } else {
                    self.classes[argmax(scores.iter().map(|s| s[i]))] as f64
                }
            })
            .collect();
        Ok(predictions)
    }

    /// Weight rows, one per scorer
    pub fn weights(&self) -> Vec<Vec<f64>> {
        self.scorers.iter().map(|s| s.weights.to_vec()).collect()
    }

    pub fn intercepts(&self) -> Vec<f64> {
        self.scorers.iter().map(|s| s.bias).collect()
    }
}

impl Classifier for LogisticRegression {
    fn predict_labels(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        self.predict(x)
    }
}
