//! Single-point prediction against a session's current model

use crate::data::{Prediction, TestPoint};
use crate::error::{Result, SketchError};

use super::store::SessionStore;

/// Evaluate `point` with the model stored for `session_id`.
///
/// Model-level failures surface as [`SketchError::EvaluationFailure`].
pub fn predict<S: SessionStore + ?Sized>(
    store: &S,
    session_id: &str,
    point: &TestPoint,
) -> Result<Prediction> {
    let model = store
        .get(session_id)
        .ok_or_else(|| SketchError::SessionNotFound(session_id.to_string()))?;

    model.predict(point).map_err(|err| match err {
        SketchError::EvaluationFailure(msg) => SketchError::EvaluationFailure(msg),
        other => SketchError::EvaluationFailure(other.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Params, Point};
    use crate::session::store::InMemorySessionStore;
    use crate::training::{fit_knn, fit_linear_regression};
    use std::sync::Arc;

    #[test]
    fn test_missing_session() {
        let store = InMemorySessionStore::new();
        let err = predict(&store, "ghost", &TestPoint { x: 0.0, y: 0.0 }).unwrap_err();
        assert_eq!(err, SketchError::SessionNotFound("ghost".to_string()));
    }

    #[test]
    fn test_regression_and_label_branches() {
        let store = InMemorySessionStore::new();
        let line = vec![Point::new(0.0, 0.0), Point::new(2.0, 4.0)];
        store.replace("r", Arc::new(fit_linear_regression(&line, &Params::new()).unwrap().model));

        let labeled = vec![
            Point::labeled(0.0, 0.0, 3),
            Point::labeled(0.2, 0.0, 3),
            Point::labeled(9.0, 9.0, 8),
        ];
        store.replace("c", Arc::new(fit_knn(&labeled, &Params::new()).unwrap().model));

        match predict(&store, "r", &TestPoint { x: 1.0, y: 50.0 }).unwrap() {
            Prediction::Value(v) => assert!((v - 2.0).abs() < 1e-9),
            other => panic!("expected a value, got {:?}", other),
        }
        // Three neighbors over three points: the majority label wins
        assert_eq!(
            predict(&store, "c", &TestPoint { x: 9.0, y: 9.0 }).unwrap(),
            Prediction::Label(3)
        );
    }
}
