//! Model training module
//!
//! The seven supported model families:
//! - Linear regression (OLS)
//! - Logistic regression (L2, one-vs-rest for more than two classes)
//! - K-Means clustering
//! - Support Vector Machines
//! - Gaussian Naive Bayes
//! - Random Forests (on CART decision trees)
//! - K-Nearest Neighbors

mod config;
mod engine;
mod models;
pub mod metrics;
pub mod linear_models;
pub mod decision_tree;
pub mod random_forest;
pub mod knn;
pub mod naive_bayes;
pub mod svm;
pub mod clustering;

pub use config::{Algorithm, TaskType, KMEANS_N_INIT, LOGISTIC_MAX_ITER, RANDOM_SEED};
pub use engine::{
    fit_kmeans, fit_knn, fit_linear_regression, fit_logistic_regression, fit_naive_bayes,
    fit_random_forest, fit_svm, FitOutput, FittedModel,
};
pub use models::{ensure_class_diversity, ensure_min_points, unique_classes, Classifier};
pub use linear_models::{LinearRegression, LogisticRegression};
pub use decision_tree::{DecisionTree, TreeNode};
pub use random_forest::RandomForest;
pub use knn::{KNNClassifier, KNNConfig};
pub use naive_bayes::GaussianNaiveBayes;
pub use svm::{Gamma, KernelKind, SVMClassifier, SVMConfig};
pub use clustering::KMeans;
