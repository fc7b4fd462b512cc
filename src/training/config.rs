//! Training configuration: algorithm identifiers and fixed constants

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::SketchError;

/// Seed shared by every stochastic family so repeated retrains redraw identically
pub const RANDOM_SEED: u64 = 42;

/// Number of k-means restarts; the lowest-inertia run wins
pub const KMEANS_N_INIT: usize = 10;

/// Iteration cap for logistic regression
pub const LOGISTIC_MAX_ITER: usize = 1000;

/// Kind of learning problem a family solves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskType {
    Regression,
    Classification,
    Clustering,
}

/// The seven supported model families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    /// Ordinary least squares on x → y
    LinearRegression,
    /// L2-regularized logistic regression
    LogisticRegression,
    /// Lloyd's k-means with k-means++ seeding
    #[serde(rename = "kmeans")]
    KMeans,
    /// Kernel support vector classifier
    Svm,
    /// Gaussian naive Bayes
    NaiveBayes,
    /// Bagged CART ensemble
    RandomForest,
    /// K-nearest-neighbors majority vote
    Knn,
}

impl Algorithm {
    pub const ALL: [Algorithm; 7] = [
        Algorithm::LinearRegression,
        Algorithm::LogisticRegression,
        Algorithm::KMeans,
        Algorithm::Svm,
        Algorithm::NaiveBayes,
        Algorithm::RandomForest,
        Algorithm::Knn,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::LinearRegression => "linear_regression",
            Algorithm::LogisticRegression => "logistic_regression",
            Algorithm::KMeans => "kmeans",
            Algorithm::Svm => "svm",
            Algorithm::NaiveBayes => "naive_bayes",
            Algorithm::RandomForest => "random_forest",
            Algorithm::Knn => "knn",
        }
    }

    pub fn task_type(&self) -> TaskType {
        match self {
            Algorithm::LinearRegression => TaskType::Regression,
            Algorithm::KMeans => TaskType::Clustering,
            _ => TaskType::Classification,
        }
    }

    pub fn is_regression(&self) -> bool {
        self.task_type() == TaskType::Regression
    }

    pub fn is_classifier(&self) -> bool {
        self.task_type() == TaskType::Classification
    }

    /// Minimum number of training points
    pub fn min_points(&self) -> usize {
        match self {
            Algorithm::KMeans => 1,
            _ => 2,
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Algorithm {
    type Err = SketchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Algorithm::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| SketchError::UnknownAlgorithm(s.to_string()))
    }
}
