//! Training engine implementation
//!
//! One fit function per family. Each turns a point set and its parameters
//! into a [`FitOutput`]: the client-facing [`FitResult`] plus the fitted model
//! that the session store keeps for later predictions.

use super::clustering::KMeans;
use super::config::Algorithm;
use super::knn::KNNClassifier;
use super::linear_models::{LinearRegression, LogisticRegression};
use super::metrics::{accuracy, confusion_matrix, mean_squared_error, r2_score};
use super::models::{ensure_class_diversity, ensure_min_points, Classifier};
use super::naive_bayes::GaussianNaiveBayes;
use super::random_forest::RandomForest;
use super::svm::{Gamma, KernelKind, SVMClassifier, SVMConfig};
use crate::data::{
    feature_matrix, label_vector, Coordinate, FitResult, Metrics, Parameters, Params, Point,
    Prediction, TestPoint, Visualization,
};
use crate::error::{Result, SketchError};
use crate::visualization::{decision_boundary, regression_line, Bounds};
use ndarray::{array, Array1, Array2};
use serde_json::{Number, Value};

/// A fitted model of one of the seven families
#[derive(Debug, Clone)]
pub enum FittedModel {
    LinearRegression(LinearRegression),
    LogisticRegression(LogisticRegression),
    KMeans(KMeans),
    Svm(SVMClassifier),
    NaiveBayes(GaussianNaiveBayes),
    RandomForest(RandomForest),
    Knn(KNNClassifier),
}

impl FittedModel {
    pub fn algorithm(&self) -> Algorithm {
        match self {
            FittedModel::LinearRegression(_) => Algorithm::LinearRegression,
            FittedModel::LogisticRegression(_) => Algorithm::LogisticRegression,
            FittedModel::KMeans(_) => Algorithm::KMeans,
            FittedModel::Svm(_) => Algorithm::Svm,
            FittedModel::NaiveBayes(_) => Algorithm::NaiveBayes,
            FittedModel::RandomForest(_) => Algorithm::RandomForest,
            FittedModel::Knn(_) => Algorithm::Knn,
        }
    }

    /// Evaluate a single point.
    ///
    /// Regression reads only `x` and yields a value; every other family reads
    /// `(x, y)` and yields a label or cluster index.
    pub fn predict(&self, point: &TestPoint) -> Result<Prediction> {
        let x = array![[point.x, point.y]];
        let raw = match self {
            FittedModel::LinearRegression(model) => {
                let value = first(model.predict(&array![[point.x]])?)?;
                if !value.is_finite() {
                    return Err(SketchError::EvaluationFailure(format!(
                        "regression produced a non-finite value at x = {}",
                        point.x
                    )));
                }
                return Ok(Prediction::Value(value));
            }
            FittedModel::KMeans(model) => model.predict(&x)?,
            FittedModel::LogisticRegression(model) => model.predict_labels(&x)?,
            FittedModel::Svm(model) => model.predict_labels(&x)?,
            FittedModel::NaiveBayes(model) => model.predict_labels(&x)?,
            FittedModel::RandomForest(model) => model.predict_labels(&x)?,
            FittedModel::Knn(model) => model.predict_labels(&x)?,
        };
        Ok(Prediction::Label(first(raw)?.round() as i64))
    }
}

fn first(values: Array1<f64>) -> Result<f64> {
    values
        .get(0)
        .copied()
        .ok_or_else(|| SketchError::EvaluationFailure("model returned no prediction".to_string()))
}

/// A successful fit: the client payload and the model that produced it
#[derive(Debug, Clone)]
pub struct FitOutput {
    pub model: FittedModel,
    pub result: FitResult,
}

/// Ordinary least squares of y on x
pub fn fit_linear_regression(points: &[Point], _params: &Params) -> Result<FitOutput> {
    ensure_min_points(Algorithm::LinearRegression, points.len())?;

    let xs: Vec<f64> = points.iter().map(|p| p.x).collect();
    let x = Array2::from_shape_vec((points.len(), 1), xs)?;
    let y: Array1<f64> = points.iter().map(|p| p.y).collect();

    let mut model = LinearRegression::new();
    model.fit(&x, &y)?;

    let y_pred = model.predict(&x)?;
    let bounds = Bounds::from_points(points)?;
    let line = regression_line(&model, bounds.min_x, bounds.max_x)?;

    let result = FitResult {
        visualization: Visualization::Line { line },
        parameters: Parameters::LinearRegression {
            slope: model.slope(),
            intercept: model.intercept.unwrap_or(0.0),
        },
        metrics: Metrics::Regression {
            mse: mean_squared_error(&y, &y_pred),
            r_squared: r2_score(&y, &y_pred),
        },
    };

    Ok(FitOutput {
        model: FittedModel::LinearRegression(model),
        result,
    })
}

/// L2-regularized logistic regression
pub fn fit_logistic_regression(points: &[Point], params: &Params) -> Result<FitOutput> {
    let (x, y) = labeled_data(Algorithm::LogisticRegression, points)?;
    let c = positive_c(params)?;

    let mut model = LogisticRegression::new(c);
    model.fit(&x, &y)?;

    let result = classifier_result(
        &model,
        points,
        &x,
        &y,
        None,
        Parameters::LogisticRegression {
            weights: model.weights(),
            intercept: model.intercepts(),
            c: echo_number(params, "C", c),
        },
    )?;

    Ok(FitOutput {
        model: FittedModel::LogisticRegression(model),
        result,
    })
}

/// K-means clustering; labels on points are ignored
pub fn fit_kmeans(points: &[Point], params: &Params) -> Result<FitOutput> {
    ensure_min_points(Algorithm::KMeans, points.len())?;

    let requested = params.usize_or("n_clusters", 3)?;
    if requested == 0 {
        return Err(SketchError::invalid_parameter("n_clusters", 0, "must be at least 1"));
    }
    let n_clusters = requested.min(points.len());

    let x = feature_matrix(points);
    let mut model = KMeans::new(n_clusters);
    model.fit(&x)?;

    let centers = model
        .centroids()
        .map(|c| {
            c.rows()
                .into_iter()
                .map(|row| Coordinate { x: row[0], y: row[1] })
                .collect()
        })
        .unwrap_or_default();
    let labels = model.labels().map(|l| l.to_vec()).unwrap_or_default();
    let inertia = model.inertia().unwrap_or(0.0);

    let result = FitResult {
        visualization: Visualization::Clusters { centers, labels },
        parameters: Parameters::KMeans { n_clusters },
        metrics: Metrics::Clustering { inertia },
    };

    Ok(FitOutput {
        model: FittedModel::KMeans(model),
        result,
    })
}

/// Kernel support vector classifier
pub fn fit_svm(points: &[Point], params: &Params) -> Result<FitOutput> {
    let (x, y) = labeled_data(Algorithm::Svm, points)?;
    let c = positive_c(params)?;
    let kernel: KernelKind = params.str_or("kernel", "rbf")?.parse()?;
    let gamma = parse_gamma(params)?;

    let config = SVMConfig::default()
        .with_c(c)
        .with_kernel(kernel)
        .with_gamma(gamma);
    let mut model = SVMClassifier::new(config);
    model.fit(&x, &y)?;

    let support_vectors = model
        .support_vectors()
        .into_iter()
        .map(|sv| [sv[0], sv[1]])
        .collect();

    let result = classifier_result(
        &model,
        points,
        &x,
        &y,
        Some(support_vectors),
        Parameters::Svm {
            c: echo_number(params, "C", c),
            kernel: kernel.to_string(),
            gamma: echo_gamma(params, gamma),
            n_support: model.n_support().to_vec(),
        },
    )?;

    Ok(FitOutput {
        model: FittedModel::Svm(model),
        result,
    })
}

/// Gaussian naive Bayes
pub fn fit_naive_bayes(points: &[Point], _params: &Params) -> Result<FitOutput> {
    let (x, y) = labeled_data(Algorithm::NaiveBayes, points)?;

    let mut model = GaussianNaiveBayes::new();
    model.fit(&x, &y)?;

    let result = classifier_result(
        &model,
        points,
        &x,
        &y,
        None,
        Parameters::NaiveBayes {
            theta: model.theta().to_vec(),
            var: model.var().to_vec(),
        },
    )?;

    Ok(FitOutput {
        model: FittedModel::NaiveBayes(model),
        result,
    })
}

/// Bagged Gini trees
pub fn fit_random_forest(points: &[Point], params: &Params) -> Result<FitOutput> {
    let (x, y) = labeled_data(Algorithm::RandomForest, points)?;

    let n_estimators = params.usize_or("n_estimators", 100)?;
    if n_estimators == 0 {
        return Err(SketchError::invalid_parameter("n_estimators", 0, "must be at least 1"));
    }
    let max_depth = params.opt_usize("max_depth")?;
    if max_depth == Some(0) {
        return Err(SketchError::invalid_parameter("max_depth", 0, "must be at least 1"));
    }

    let mut model = RandomForest::new_classifier(n_estimators).with_max_depth(max_depth);
    model.fit(&x, &y)?;

    let feature_importances = model
        .feature_importances()
        .map(|imp| imp.to_vec())
        .unwrap_or_else(|| vec![0.0; x.ncols()]);

    let result = classifier_result(
        &model,
        points,
        &x,
        &y,
        None,
        Parameters::RandomForest {
            n_estimators,
            max_depth,
            feature_importances,
        },
    )?;

    Ok(FitOutput {
        model: FittedModel::RandomForest(model),
        result,
    })
}

/// K-nearest-neighbors vote; `n_neighbors` is capped at the point count
pub fn fit_knn(points: &[Point], params: &Params) -> Result<FitOutput> {
    let (x, y) = labeled_data(Algorithm::Knn, points)?;

    let requested = params.usize_or("n_neighbors", 5)?;
    if requested == 0 {
        return Err(SketchError::invalid_parameter("n_neighbors", 0, "must be at least 1"));
    }
    let n_neighbors = requested.min(points.len());

    let mut model = KNNClassifier::with_k(n_neighbors);
    model.fit(&x, &y)?;

    let result = classifier_result(
        &model,
        points,
        &x,
        &y,
        None,
        Parameters::Knn { n_neighbors },
    )?;

    Ok(FitOutput {
        model: FittedModel::Knn(model),
        result,
    })
}

/// Count check, then labels, then class diversity
fn labeled_data(algorithm: Algorithm, points: &[Point]) -> Result<(Array2<f64>, Array1<f64>)> {
    ensure_min_points(algorithm, points.len())?;
    let y = label_vector(points, algorithm.as_str())?;
    ensure_class_diversity(algorithm, &y)?;
    Ok((feature_matrix(points), y))
}

fn positive_c(params: &Params) -> Result<f64> {
    let c = params.f64_or("C", 1.0)?;
    if c.is_nan() || c <= 0.0 {
        return Err(SketchError::invalid_parameter("C", c, "must be positive"));
    }
    Ok(c)
}

/// The client's own number when given, so `1` stays `1` and `1.0` stays `1.0`
fn echo_number(params: &Params, name: &str, value: f64) -> Number {
    match params.get(name) {
        Some(Value::Number(n)) => n.clone(),
        _ => Number::from_f64(value).unwrap_or_else(|| Number::from(0)),
    }
}

fn echo_gamma(params: &Params, gamma: Gamma) -> String {
    match params.get("gamma") {
        Some(Value::Number(n)) => n.to_string(),
        _ => gamma.to_string(),
    }
}

fn parse_gamma(params: &Params) -> Result<Gamma> {
    match params.get("gamma") {
        None => Ok(Gamma::Scale),
        Some(Value::String(s)) => s.parse(),
        Some(Value::Number(n)) => match n.as_f64() {
            Some(g) if g > 0.0 => Ok(Gamma::Value(g)),
            _ => Err(SketchError::invalid_parameter("gamma", n, "must be positive")),
        },
        Some(other) => Err(SketchError::invalid_parameter(
            "gamma",
            other,
            "expected \"scale\", \"auto\" or a number",
        )),
    }
}

/// Shared tail of every classifier fit: grid, training metrics, payload
fn classifier_result(
    model: &dyn Classifier,
    points: &[Point],
    x: &Array2<f64>,
    y: &Array1<f64>,
    support_vectors: Option<Vec<[f64; 2]>>,
    parameters: Parameters,
) -> Result<FitResult> {
    let bounds = Bounds::from_points(points)?;
    let grid = decision_boundary(model, &bounds)?;
    let y_pred = model.predict_labels(x)?;

    Ok(FitResult {
        visualization: Visualization::DecisionBoundary {
            decision_boundary: grid,
            support_vectors,
        },
        parameters,
        metrics: Metrics::Classification {
            accuracy: accuracy(y, &y_pred),
            confusion_matrix: confusion_matrix(y, &y_pred),
        },
    })
}
