//! Support vector classifier
//!
//! Kernel SVC trained with SMO (Sequential Minimal Optimization). Two classes
//! are trained directly, more classes train one binary machine per class.

use super::config::RANDOM_SEED;
use super::models::{argmax, Classifier};
use crate::error::{Result, SketchError};
use ndarray::{Array1, Array2, ArrayView1};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kernel family selected by name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KernelKind {
    /// K(x, y) = x · y
    Linear,
    /// K(x, y) = (γ x · y + r)^d
    Poly,
    /// K(x, y) = exp(-γ ||x - y||²)
    Rbf,
    /// K(x, y) = tanh(γ x · y + r)
    Sigmoid,
}

impl KernelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            KernelKind::Linear => "linear",
            KernelKind::Poly => "poly",
            KernelKind::Rbf => "rbf",
            KernelKind::Sigmoid => "sigmoid",
        }
    }
}

impl fmt::Display for KernelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KernelKind {
    type Err = SketchError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "linear" => Ok(KernelKind::Linear),
            "poly" => Ok(KernelKind::Poly),
            "rbf" => Ok(KernelKind::Rbf),
            "sigmoid" => Ok(KernelKind::Sigmoid),
            other => Err(SketchError::invalid_parameter(
                "kernel",
                other,
                "expected one of linear, poly, rbf, sigmoid",
            )),
        }
    }
}

/// Kernel coefficient setting
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Gamma {
    /// 1 / (n_features · Var(X))
    Scale,
    /// 1 / n_features
    Auto,
    Value(f64),
}

impl Gamma {
    /// Concrete coefficient for a training matrix
    pub fn resolve(&self, x: &Array2<f64>) -> f64 {
        let n_features = x.ncols().max(1) as f64;
        match self {
            Gamma::Scale => {
                let n = x.len().max(1) as f64;
                let mean = x.sum() / n;
                let var = x.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
                if var > 0.0 {
                    1.0 / (n_features * var)
                } else {
                    1.0
                }
            }
            Gamma::Auto => 1.0 / n_features,
            Gamma::Value(g) => *g,
        }
    }
}

impl fmt::Display for Gamma {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gamma::Scale => f.write_str("scale"),
            Gamma::Auto => f.write_str("auto"),
            // Debug keeps the trailing ".0" on whole numbers
            Gamma::Value(g) => write!(f, "{:?}", g),
        }
    }
}

impl FromStr for Gamma {
    type Err = SketchError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "scale" => Ok(Gamma::Scale),
            "auto" => Ok(Gamma::Auto),
            other => match other.parse::<f64>() {
                Ok(g) if g > 0.0 && g.is_finite() => Ok(Gamma::Value(g)),
                _ => Err(SketchError::invalid_parameter(
                    "gamma",
                    other,
                    "expected \"scale\", \"auto\" or a positive number",
                )),
            },
        }
    }
}

/// SVM configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SVMConfig {
    /// Regularization parameter (C)
    pub c: f64,
    pub kernel: KernelKind,
    pub gamma: Gamma,
    /// Polynomial degree
    pub degree: i32,
    /// Independent term of the poly and sigmoid kernels
    pub coef0: f64,
    /// Tolerance for the KKT check
    pub tol: f64,
    /// Maximum number of sweeps over the data
    pub max_iter: usize,
    pub random_state: u64,
}

impl Default for SVMConfig {
    fn default() -> Self {
        Self {
            c: 1.0,
            kernel: KernelKind::Rbf,
            gamma: Gamma::Scale,
            degree: 3,
            coef0: 0.0,
            tol: 1e-3,
            max_iter: 1000,
            random_state: RANDOM_SEED,
        }
    }
}

impl SVMConfig {
    pub fn with_c(mut self, c: f64) -> Self {
        self.c = c;
        self
    }

    pub fn with_kernel(mut self, kernel: KernelKind) -> Self {
        self.kernel = kernel;
        self
    }

    pub fn with_gamma(mut self, gamma: Gamma) -> Self {
        self.gamma = gamma;
        self
    }
}

/// A single binary machine; labels are ±1
#[derive(Debug, Clone, Serialize, Deserialize)]
struct BinarySVM {
    support_indices: Vec<usize>,
    /// alpha_i · y_i for each support vector
    dual_coef: Vec<f64>,
    bias: f64,
}

/// Support Vector Classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SVMClassifier {
    config: SVMConfig,
    /// Resolved kernel coefficient
    gamma: f64,
    /// Training rows, kept so support vectors can be referenced by index
    train_x: Option<Array2<f64>>,
    /// Training labels by row
    train_y: Vec<i64>,
    classes: Vec<i64>,
    /// One machine for binary problems, one per class otherwise
    machines: Vec<BinarySVM>,
    /// Union of support indices, grouped by class ascending
    support: Vec<usize>,
    n_support: Vec<usize>,
    is_fitted: bool,
}

impl SVMClassifier {
    pub fn new(config: SVMConfig) -> Self {
        Self {
            config,
            gamma: 1.0,
            train_x: None,
            train_y: Vec::new(),
            classes: Vec::new(),
            machines: Vec::new(),
            support: Vec::new(),
            n_support: Vec::new(),
            is_fitted: false,
        }
    }

    /// Fit the classifier (binary directly, multi-class via one-vs-rest)
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        if self.config.c.is_nan() || self.config.c <= 0.0 {
            return Err(SketchError::invalid_parameter("C", self.config.c, "must be positive"));
        }

        let labels: Vec<i64> = y.iter().map(|&v| v.round() as i64).collect();
        let mut classes = labels.clone();
        classes.sort_unstable();
        classes.dedup();
        if classes.len() < 2 {
            return Err(SketchError::InsufficientClassDiversity {
                algorithm: "svm".to_string(),
            });
        }

        self.gamma = self.config.gamma.resolve(x);
        let kernel_matrix = self.compute_kernel_matrix(x);

        // Binary problems train one machine with classes[1] as the positive side
        let positives: Vec<i64> = if classes.len() == 2 {
            vec![classes[1]]
        } else {
            classes.clone()
        };

        let mut machines = Vec::with_capacity(positives.len());
        for cls in positives {
            let y_binary: Array1<f64> = labels
                .iter()
                .map(|&l| if l == cls { 1.0 } else { -1.0 })
                .collect();
            let (alphas, bias) = self.smo_train(&kernel_matrix, &y_binary);

            let support_indices: Vec<usize> = alphas
                .iter()
                .enumerate()
                .filter(|(_, &a)| a > 1e-8)
                .map(|(i, _)| i)
                .collect();
            let dual_coef = support_indices
                .iter()
                .map(|&i| alphas[i] * y_binary[i])
                .collect();

            machines.push(BinarySVM {
                support_indices,
                dual_coef,
                bias,
            });
        }

        let mut support: Vec<usize> = machines
            .iter()
            .flat_map(|m| m.support_indices.iter().copied())
            .collect();
        support.sort_unstable_by_key(|&i| (labels[i], i));
        support.dedup();

        self.n_support = classes
            .iter()
            .map(|&c| support.iter().filter(|&&i| labels[i] == c).count())
            .collect();
        self.support = support;
        self.machines = machines;
        self.classes = classes;
        self.train_y = labels;
        self.train_x = Some(x.clone());
        self.is_fitted = true;
        Ok(self)
    }

    /// SMO over a precomputed kernel matrix; returns (alphas, bias)
    fn smo_train(&self, kernel_matrix: &Array2<f64>, y: &Array1<f64>) -> (Array1<f64>, f64) {
        let n = y.len();
        let c = self.config.c;
        let tol = self.config.tol;
        let mut alphas = Array1::zeros(n);
        let mut bias = 0.0;

        if n <= 1 {
            return (alphas, bias);
        }

        let mut rng = Xoshiro256PlusPlus::seed_from_u64(self.config.random_state);

        let decision = |alphas: &Array1<f64>, bias: f64, i: usize| -> f64 {
            let mut sum = bias;
            for k in 0..n {
                if alphas[k] > 0.0 {
                    sum += alphas[k] * y[k] * kernel_matrix[[k, i]];
                }
            }
            sum
        };

        let mut passes = 0;
        let max_passes = 5;
        let mut total_iter = 0;

        while passes < max_passes && total_iter < self.config.max_iter {
            let mut num_changed = 0;

            for i in 0..n {
                let e_i = decision(&alphas, bias, i) - y[i];

                if (y[i] * e_i < -tol && alphas[i] < c) || (y[i] * e_i > tol && alphas[i] > 0.0) {
                    let j = loop {
                        let j = rng.gen_range(0..n);
                        if j != i {
                            break j;
                        }
                    };

                    let e_j = decision(&alphas, bias, j) - y[j];
                    let alpha_i_old = alphas[i];
                    let alpha_j_old = alphas[j];

                    let (l, h) = if y[i] != y[j] {
                        ((alphas[j] - alphas[i]).max(0.0), (c + alphas[j] - alphas[i]).min(c))
                    } else {
                        ((alphas[i] + alphas[j] - c).max(0.0), (alphas[i] + alphas[j]).min(c))
                    };
                    if (l - h).abs() < 1e-10 {
                        continue;
                    }

                    let eta = 2.0 * kernel_matrix[[i, j]] - kernel_matrix[[i, i]] - kernel_matrix[[j, j]];
                    if eta >= 0.0 {
                        continue;
                    }

                    alphas[j] = (alphas[j] - y[j] * (e_i - e_j) / eta).max(l).min(h);
                    if (alphas[j] - alpha_j_old).abs() < 1e-5 {
                        continue;
                    }

                    alphas[i] += y[i] * y[j] * (alpha_j_old - alphas[j]);

                    let b1 = bias
                        - e_i
                        - y[i] * (alphas[i] - alpha_i_old) * kernel_matrix[[i, i]]
                        - y[j] * (alphas[j] - alpha_j_old) * kernel_matrix[[i, j]];
                    let b2 = bias
                        - e_j
                        - y[i] * (alphas[i] - alpha_i_old) * kernel_matrix[[i, j]]
                        - y[j] * (alphas[j] - alpha_j_old) * kernel_matrix[[j, j]];

                    bias = if alphas[i] > 0.0 && alphas[i] < c {
                        b1
                    } else if alphas[j] > 0.0 && alphas[j] < c {
                        b2
                    } else {
                        (b1 + b2) / 2.0
                    };

                    num_changed += 1;
                }
            }

            total_iter += 1;
            if num_changed == 0 {
                passes += 1;
            } else {
                passes = 0;
            }
        }

        (alphas, bias)
    }

    fn compute_kernel_matrix(&self, x: &Array2<f64>) -> Array2<f64> {
        let n = x.nrows();
        let mut k = Array2::zeros((n, n));
        for i in 0..n {
            for j in i..n {
                let val = self.kernel(&x.row(i), &x.row(j));
                k[[i, j]] = val;
                k[[j, i]] = val;
            }
        }
        k
    }

    fn kernel(&self, a: &ArrayView1<f64>, b: &ArrayView1<f64>) -> f64 {
        match self.config.kernel {
            KernelKind::Linear => a.dot(b),
            KernelKind::Poly => (self.gamma * a.dot(b) + self.config.coef0).powi(self.config.degree),
            KernelKind::Rbf => {
                let sq: f64 = a.iter().zip(b.iter()).map(|(p, q)| (p - q).powi(2)).sum();
                (-self.gamma * sq).exp()
            }
            KernelKind::Sigmoid => (self.gamma * a.dot(b) + self.config.coef0).tanh(),
        }
    }

    /// Signed distance of one row per machine
    fn decision_values(&self, train_x: &Array2<f64>, row: &ArrayView1<f64>) -> Vec<f64> {
        self.machines
            .iter()
            .map(|m| {
                m.support_indices
                    .iter()
                    .zip(m.dual_coef.iter())
                    .map(|(&i, &coef)| coef * self.kernel(&train_x.row(i), row))
                    .sum::<f64>()
                    + m.bias
            })
            .collect()
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let train_x = match (&self.train_x, self.is_fitted) {
            (Some(train_x), true) => train_x,
            _ => return Err(SketchError::EvaluationFailure("svm model is not fitted".to_string())),
        };
        if x.ncols() != train_x.ncols() {
            return Err(SketchError::EvaluationFailure(format!(
                "expected {} features, got {}",
                train_x.ncols(),
                x.ncols()
            )));
        }

        let preds: Vec<f64> = (0..x.nrows())
            .into_par_iter()
            .map(|r| {
                let scores = self.decision_values(train_x, &x.row(r));
                let cls = if self.classes.len() == 2 {
                    if scores[0] > 0.0 {
                        self.classes[1]
                    } else {
                        self.classes[0]
                    }
                } else {
                    self.classes[argmax(scores)]
                };
                cls as f64
            })
            .collect();

        Ok(Array1::from_vec(preds))
    }

    /// Support vector coordinates grouped by class ascending
    pub fn support_vectors(&self) -> Vec<Vec<f64>> {
        match &self.train_x {
            Some(train_x) => self.support.iter().map(|&i| train_x.row(i).to_vec()).collect(),
            None => Vec::new(),
        }
    }

    /// Support vector count per class, in class order
    pub fn n_support(&self) -> &[usize] {
        &self.n_support
    }

    pub fn classes(&self) -> &[i64] {
        &self.classes
    }

}

impl Classifier for SVMClassifier {
    fn predict_labels(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        self.predict(x)
    }
}
