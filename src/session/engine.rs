//! Session engine: validate, dispatch, store, return

use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use super::prediction;
use super::registry::dispatch;
use super::store::{InMemorySessionStore, SessionStore};
use crate::data::{FitResult, Prediction, TestPoint, TrainingRequest};
use crate::error::Result;
use crate::training::Algorithm;

/// Owns the session store and drives every model lifecycle operation
pub struct SessionEngine<S: SessionStore = InMemorySessionStore> {
    store: S,
}

impl Default for SessionEngine<InMemorySessionStore> {
    fn default() -> Self {
        Self::new(InMemorySessionStore::new())
    }
}

impl<S: SessionStore> SessionEngine<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Refit the session's model from scratch.
    ///
    /// On success the new model replaces the old one and only the client
    /// payload is returned. On failure the stored model is left as it was.
    pub fn retrain(&self, session_id: &str, request: &TrainingRequest) -> Result<FitResult> {
        let start = Instant::now();
        let n_points = request.points.len();

        let outcome = request
            .algorithm
            .parse::<Algorithm>()
            .and_then(|algorithm| dispatch(algorithm, &request.points, &request.params));

        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
        match outcome {
            Ok(output) => {
                let replaced = self.store.replace(session_id, Arc::new(output.model));
                info!(
                    session_id = %session_id,
                    algorithm = %request.algorithm,
                    n_points,
                    elapsed_ms,
                    replaced = replaced.is_some(),
                    "Model retrained"
                );
                Ok(output.result)
            }
            Err(err) => {
                warn!(
                    session_id = %session_id,
                    algorithm = %request.algorithm,
                    n_points,
                    elapsed_ms,
                    error = %err,
                    "Retrain rejected"
                );
                Err(err)
            }
        }
    }

    /// Forget the session's model. Unknown ids are ignored.
    pub fn destroy(&self, session_id: &str) {
        let removed = self.store.remove(session_id);
        debug!(
            session_id = %session_id,
            had_model = removed.is_some(),
            sessions = self.store.len(),
            "Session destroyed"
        );
    }

    pub fn predict(&self, session_id: &str, point: &TestPoint) -> Result<Prediction> {
        let start = Instant::now();
        let result = prediction::predict(&self.store, session_id, point);
        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

        match &result {
            Ok(prediction) => debug!(
                session_id = %session_id,
                x = point.x,
                y = point.y,
                prediction = ?prediction,
                elapsed_ms,
                "Prediction served"
            ),
            Err(err) => warn!(session_id = %session_id, error = %err, "Prediction failed"),
        }
        result
    }

    /// Number of sessions currently holding a model
    pub fn session_count(&self) -> usize {
        self.store.len()
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Point;
    use crate::error::SketchError;

    #[test]
    fn test_failed_retrain_keeps_previous_model() {
        let engine = SessionEngine::default();
        let good = TrainingRequest::new(
            "linear_regression",
            vec![Point::new(0.0, 0.0), Point::new(1.0, 2.0)],
        );
        engine.retrain("s", &good).unwrap();

        let bad = TrainingRequest::new("svm", vec![Point::labeled(0.0, 0.0, 1)]);
        assert!(matches!(
            engine.retrain("s", &bad),
            Err(SketchError::InsufficientData { .. })
        ));

        match engine.predict("s", &TestPoint { x: 1.0, y: 0.0 }).unwrap() {
            Prediction::Value(v) => assert!((v - 2.0).abs() < 1e-9),
            other => panic!("expected a value, got {:?}", other),
        }
    }

    #[test]
    fn test_destroy_is_idempotent() {
        let engine = SessionEngine::default();
        let req = TrainingRequest::new("kmeans", vec![Point::new(1.0, 1.0)]);
        engine.retrain("s", &req).unwrap();
        assert_eq!(engine.session_count(), 1);

        engine.destroy("s");
        engine.destroy("s");
        assert_eq!(engine.session_count(), 0);
        assert!(matches!(
            engine.predict("s", &TestPoint { x: 0.0, y: 0.0 }),
            Err(SketchError::SessionNotFound(_))
        ));
    }
}
