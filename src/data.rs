//! Request and response types exchanged with clients
//!
//! Everything here is plain serde data. Model handles never appear in these
//! types; see [`crate::training::FitOutput`] for the pairing of a result with
//! its fitted model.

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Number, Value};

use crate::error::{Result, SketchError};

/// A point placed on the canvas
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub label: Option<i64>,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y, label: None }
    }

    pub fn labeled(x: f64, y: f64, label: i64) -> Self {
        Self {
            x,
            y,
            label: Some(label),
        }
    }
}

/// One retrain message. Replaces the session's training set entirely.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingRequest {
    pub points: Vec<Point>,
    pub algorithm: String,
    #[serde(default)]
    pub params: Params,
}

impl TrainingRequest {
    pub fn new(algorithm: impl Into<String>, points: Vec<Point>) -> Self {
        Self {
            points,
            algorithm: algorithm.into(),
            params: Params::default(),
        }
    }

    pub fn with_param(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.params.insert(name, value);
        self
    }
}

/// A single prediction query
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TestPoint {
    pub x: f64,
    pub y: f64,
}

/// Free-form hyperparameters with typed accessors.
///
/// A missing key or an explicit `null` selects the default. A value of the
/// wrong type is an [`SketchError::InvalidParameter`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Params(Map<String, Value>);

impl Params {
    pub fn new() -> Self {
        Self(Map::new())
    }

    pub fn insert(&mut self, name: &str, value: impl Into<Value>) {
        self.0.insert(name.to_string(), value.into());
    }

    /// Raw value, with `null` treated as absent
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name).filter(|v| !v.is_null())
    }

    pub fn f64_or(&self, name: &str, default: f64) -> Result<f64> {
        match self.get(name) {
            None => Ok(default),
            Some(v) => v
                .as_f64()
                .ok_or_else(|| SketchError::invalid_parameter(name, v, "expected a number")),
        }
    }

    pub fn usize_or(&self, name: &str, default: usize) -> Result<usize> {
        Ok(self.opt_usize(name)?.unwrap_or(default))
    }

    pub fn opt_usize(&self, name: &str) -> Result<Option<usize>> {
        let Some(v) = self.get(name) else {
            return Ok(None);
        };
        if let Some(n) = v.as_u64() {
            return Ok(Some(n as usize));
        }
        match v.as_f64() {
            Some(f) if f >= 0.0 && f.fract() == 0.0 && f.is_finite() => Ok(Some(f as usize)),
            _ => Err(SketchError::invalid_parameter(
                name,
                v,
                "expected a non-negative integer",
            )),
        }
    }

    pub fn str_or(&self, name: &str, default: &str) -> Result<String> {
        match self.get(name) {
            None => Ok(default.to_string()),
            Some(Value::String(s)) => Ok(s.clone()),
            Some(v) => Err(SketchError::invalid_parameter(name, v, "expected a string")),
        }
    }
}

impl From<Map<String, Value>> for Params {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// A renderable `{x, y}` coordinate
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinate {
    pub x: f64,
    pub y: f64,
}

/// Three parallel 50×50 arrays describing a classifier's decision regions
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecisionBoundary {
    pub x: Vec<Vec<f64>>,
    pub y: Vec<Vec<f64>>,
    pub z: Vec<Vec<i64>>,
}

/// Family-specific drawing payload
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Visualization {
    Line {
        line: Vec<Coordinate>,
    },
    DecisionBoundary {
        decision_boundary: DecisionBoundary,
        #[serde(skip_serializing_if = "Option::is_none")]
        support_vectors: Option<Vec<[f64; 2]>>,
    },
    Clusters {
        centers: Vec<Coordinate>,
        labels: Vec<usize>,
    },
}

impl Visualization {
    pub fn decision_boundary(&self) -> Option<&DecisionBoundary> {
        match self {
            Visualization::DecisionBoundary {
                decision_boundary, ..
            } => Some(decision_boundary),
            _ => None,
        }
    }
}

/// Fitted parameters surfaced to the client
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Parameters {
    LinearRegression {
        slope: f64,
        intercept: f64,
    },
    LogisticRegression {
        weights: Vec<Vec<f64>>,
        intercept: Vec<f64>,
        /// Echoed as the client sent it
        #[serde(rename = "C")]
        c: Number,
    },
    KMeans {
        n_clusters: usize,
    },
    Svm {
        /// Echoed as the client sent it
        #[serde(rename = "C")]
        c: Number,
        kernel: String,
        gamma: String,
        n_support: Vec<usize>,
    },
    NaiveBayes {
        theta: Vec<Vec<f64>>,
        var: Vec<Vec<f64>>,
    },
    RandomForest {
        n_estimators: usize,
        #[serde(serialize_with = "serialize_max_depth")]
        max_depth: Option<usize>,
        feature_importances: Vec<f64>,
    },
    Knn {
        n_neighbors: usize,
    },
}

fn serialize_max_depth<S: Serializer>(depth: &Option<usize>, s: S) -> std::result::Result<S::Ok, S::Error> {
    match depth {
        Some(d) => s.serialize_u64(*d as u64),
        None => s.serialize_str("None"),
    }
}

/// Fit quality on the training data
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Metrics {
    Regression {
        mse: f64,
        r_squared: f64,
    },
    Classification {
        accuracy: f64,
        confusion_matrix: Vec<Vec<usize>>,
    },
    Clustering {
        inertia: f64,
    },
}

/// What a client receives after a successful retrain
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FitResult {
    pub visualization: Visualization,
    pub parameters: Parameters,
    pub metrics: Metrics,
}

/// Output of a single-point evaluation
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Prediction {
    /// Regression output
    Value(f64),
    /// Class label or cluster index
    Label(i64),
}

/// `n × 2` feature matrix from point coordinates
pub fn feature_matrix(points: &[Point]) -> Array2<f64> {
    let mut x = Array2::zeros((points.len(), 2));
    for (i, p) in points.iter().enumerate() {
        x[[i, 0]] = p.x;
        x[[i, 1]] = p.y;
    }
    x
}

/// Label vector; every point must carry a label
pub fn label_vector(points: &[Point], algorithm: &str) -> Result<Array1<f64>> {
    points
        .iter()
        .enumerate()
        .map(|(index, p)| {
            p.label.map(|l| l as f64).ok_or_else(|| SketchError::MissingLabel {
                algorithm: algorithm.to_string(),
                index,
            })
        })
        .collect()
}
