//! Algorithm registry: identifier → family fit function

use crate::data::{Params, Point};
use crate::error::Result;
use crate::training::{
    fit_kmeans, fit_knn, fit_linear_regression, fit_logistic_regression, fit_naive_bayes,
    fit_random_forest, fit_svm, Algorithm, FitOutput,
};

/// Fit the family named by `algorithm` on `points`
pub fn dispatch(algorithm: Algorithm, points: &[Point], params: &Params) -> Result<FitOutput> {
    let fit = match algorithm {
        Algorithm::LinearRegression => fit_linear_regression,
        Algorithm::LogisticRegression => fit_logistic_regression,
        Algorithm::KMeans => fit_kmeans,
        Algorithm::Svm => fit_svm,
        Algorithm::NaiveBayes => fit_naive_bayes,
        Algorithm::RandomForest => fit_random_forest,
        Algorithm::Knn => fit_knn,
    };
    fit(points, params)
}
