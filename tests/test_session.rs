//! Integration test: session engine lifecycle across every model family

use sketchml::data::{Metrics, Parameters, Point, Prediction, TestPoint, TrainingRequest, Visualization};
use sketchml::session::SessionEngine;
use sketchml::training::Algorithm;
use sketchml::SketchError;

fn two_blobs() -> Vec<Point> {
    vec![
        Point::labeled(0.0, 0.0, 0),
        Point::labeled(0.5, 0.2, 0),
        Point::labeled(0.2, 0.6, 0),
        Point::labeled(4.0, 4.0, 1),
        Point::labeled(4.5, 3.8, 1),
        Point::labeled(3.8, 4.4, 1),
    ]
}

fn request_for(algorithm: Algorithm) -> TrainingRequest {
    match algorithm {
        Algorithm::LinearRegression => TrainingRequest::new(
            algorithm.as_str(),
            vec![Point::new(0.0, 1.0), Point::new(1.0, 3.0), Point::new(2.0, 5.0)],
        ),
        Algorithm::KMeans => TrainingRequest::new(
            algorithm.as_str(),
            two_blobs().into_iter().map(|p| Point::new(p.x, p.y)).collect(),
        )
        .with_param("n_clusters", 2),
        _ => TrainingRequest::new(algorithm.as_str(), two_blobs()),
    }
}

// ============================================================================
// Every family
// ============================================================================

#[test]
fn test_every_family_fits_and_serializes_without_model() {
    let engine = SessionEngine::default();
    for algorithm in Algorithm::ALL {
        let result = engine
            .retrain("s", &request_for(algorithm))
            .unwrap_or_else(|e| panic!("{} failed: {}", algorithm, e));

        let json = serde_json::to_value(&result).unwrap();
        let obj = json.as_object().unwrap();
        assert!(obj.contains_key("visualization"));
        assert!(obj.contains_key("parameters"));
        assert!(obj.contains_key("metrics"));
        assert!(!obj.contains_key("model"), "{} leaked its model", algorithm);
    }
}

#[test]
fn test_classifier_grids_are_50_by_50() {
    let engine = SessionEngine::default();
    for algorithm in Algorithm::ALL.into_iter().filter(|a| a.is_classifier()) {
        let result = engine.retrain("grid", &request_for(algorithm)).unwrap();
        let grid = result
            .visualization
            .decision_boundary()
            .unwrap_or_else(|| panic!("{} has no decision boundary", algorithm));

        for axis in [&grid.x, &grid.y] {
            assert_eq!(axis.len(), 50);
            assert!(axis.iter().all(|row| row.len() == 50));
        }
        assert_eq!(grid.z.len(), 50);
        assert!(grid.z.iter().all(|row| row.len() == 50));
        assert!(grid.z.iter().flatten().all(|label| *label == 0 || *label == 1));
    }
}

#[test]
fn test_predictions_by_family() {
    let engine = SessionEngine::default();
    for algorithm in Algorithm::ALL {
        engine.retrain("p", &request_for(algorithm)).unwrap();
        let prediction = engine.predict("p", &TestPoint { x: 4.2, y: 4.1 }).unwrap();
        match (algorithm, prediction) {
            (Algorithm::LinearRegression, Prediction::Value(v)) => assert!((v - 9.4).abs() < 1e-9),
            (Algorithm::KMeans, Prediction::Label(c)) => assert!(c == 0 || c == 1),
            (_, Prediction::Label(label)) => assert_eq!(label, 1, "{} misclassified", algorithm),
            (a, p) => panic!("{} returned {:?}", a, p),
        }
    }
}

// ============================================================================
// Session semantics
// ============================================================================

#[test]
fn test_sessions_are_isolated() {
    let engine = SessionEngine::default();
    engine.retrain("A", &request_for(Algorithm::LinearRegression)).unwrap();
    engine.retrain("B", &request_for(Algorithm::Knn)).unwrap();

    // Retraining A leaves B untouched
    engine.retrain("A", &request_for(Algorithm::KMeans)).unwrap();
    assert_eq!(
        engine.predict("B", &TestPoint { x: 0.1, y: 0.1 }).unwrap(),
        Prediction::Label(0)
    );

    engine.destroy("A");
    assert!(engine.predict("B", &TestPoint { x: 0.1, y: 0.1 }).is_ok());
    assert_eq!(engine.session_count(), 1);
}

#[test]
fn test_second_retrain_replaces_model() {
    let engine = SessionEngine::default();
    engine.retrain("s", &request_for(Algorithm::LinearRegression)).unwrap();
    engine.retrain("s", &request_for(Algorithm::NaiveBayes)).unwrap();

    assert!(matches!(
        engine.predict("s", &TestPoint { x: 0.0, y: 0.0 }).unwrap(),
        Prediction::Label(0)
    ));
    assert_eq!(engine.session_count(), 1);
}

#[test]
fn test_failed_retrain_keeps_previous_model() {
    let engine = SessionEngine::default();
    engine.retrain("s", &request_for(Algorithm::RandomForest)).unwrap();

    let bad = TrainingRequest::new("logistic_regression", vec![Point::labeled(0.0, 0.0, 0)]);
    assert!(engine.retrain("s", &bad).is_err());

    assert_eq!(
        engine.predict("s", &TestPoint { x: 4.0, y: 4.0 }).unwrap(),
        Prediction::Label(1)
    );
}

#[test]
fn test_unlabeled_point_rejected_for_classifier() {
    let engine = SessionEngine::default();
    let mut points = two_blobs();
    points.push(Point::new(2.0, 2.0));
    let err = engine
        .retrain("s", &TrainingRequest::new("naive_bayes", points))
        .unwrap_err();
    assert!(matches!(err, SketchError::MissingLabel { index: 6, .. }));
}

// ============================================================================
// Worked examples
// ============================================================================

#[test]
fn test_example_linear_regression_identity() {
    let engine = SessionEngine::default();
    let req = TrainingRequest::new(
        "linear_regression",
        vec![Point::new(0.0, 0.0), Point::new(1.0, 1.0), Point::new(2.0, 2.0)],
    );
    let result = engine.retrain("s", &req).unwrap();

    match result.parameters {
        Parameters::LinearRegression { slope, intercept } => {
            assert!((slope - 1.0).abs() < 1e-9);
            assert!(intercept.abs() < 1e-9);
        }
        other => panic!("unexpected parameters {:?}", other),
    }
    match result.metrics {
        Metrics::Regression { mse, r_squared } => {
            assert!(mse.abs() < 1e-12);
            assert!((r_squared - 1.0).abs() < 1e-9);
        }
        other => panic!("unexpected metrics {:?}", other),
    }
    match result.visualization {
        Visualization::Line { line } => assert_eq!(line.len(), 100),
        other => panic!("unexpected visualization {:?}", other),
    }
}

#[test]
fn test_linear_regression_tiny_x_spread() {
    let engine = SessionEngine::default();
    let req = TrainingRequest::new(
        "linear_regression",
        vec![Point::new(0.0, 0.0), Point::new(1e-6, 1.0), Point::new(2e-7, 0.2)],
    );
    let result = engine.retrain("s", &req).unwrap();

    match result.parameters {
        Parameters::LinearRegression { slope, intercept } => {
            assert!((slope - 1e6).abs() < 1e-3);
            assert!(intercept.abs() < 1e-9);
        }
        other => panic!("unexpected parameters {:?}", other),
    }
    match result.metrics {
        Metrics::Regression { mse, r_squared } => {
            assert!(mse < 1e-18);
            assert!((r_squared - 1.0).abs() < 1e-9);
        }
        other => panic!("unexpected metrics {:?}", other),
    }
}

#[test]
fn test_example_svm_single_class() {
    let engine = SessionEngine::default();
    let req = TrainingRequest::new(
        "svm",
        vec![Point::labeled(0.0, 0.0, 1), Point::labeled(1.0, 1.0, 1)],
    );
    assert!(matches!(
        engine.retrain("s", &req),
        Err(SketchError::InsufficientClassDiversity { .. })
    ));
    assert_eq!(engine.session_count(), 0);
}

#[test]
fn test_example_knn_neighbors_clamped() {
    let engine = SessionEngine::default();
    let points = vec![
        Point::labeled(0.0, 0.0, 0),
        Point::labeled(1.0, 0.0, 0),
        Point::labeled(0.0, 1.0, 0),
        Point::labeled(5.0, 5.0, 1),
        Point::labeled(6.0, 5.0, 1),
    ];
    let req = TrainingRequest::new("knn", points).with_param("n_neighbors", 10);
    let result = engine.retrain("s", &req).unwrap();
    assert_eq!(result.parameters, Parameters::Knn { n_neighbors: 5 });

    // Every query sees all five points, so the majority class wins everywhere
    assert_eq!(
        result.metrics,
        Metrics::Classification {
            accuracy: 0.6,
            confusion_matrix: vec![vec![3, 0], vec![2, 0]],
        }
    );
}

#[test]
fn test_example_predict_without_fit() {
    let engine = SessionEngine::default();
    assert!(matches!(
        engine.predict("never-trained", &TestPoint { x: 1.0, y: 1.0 }),
        Err(SketchError::SessionNotFound(id)) if id == "never-trained"
    ));
}

#[test]
fn test_example_unknown_algorithm_leaves_state() {
    let engine = SessionEngine::default();
    engine.retrain("s", &request_for(Algorithm::LinearRegression)).unwrap();

    let req = TrainingRequest::new("quantum_regression", vec![Point::new(0.0, 0.0), Point::new(1.0, 1.0)]);
    assert!(matches!(
        engine.retrain("s", &req),
        Err(SketchError::UnknownAlgorithm(name)) if name == "quantum_regression"
    ));
    assert!(matches!(
        engine.predict("s", &TestPoint { x: 1.0, y: 0.0 }),
        Ok(Prediction::Value(_))
    ));
}
