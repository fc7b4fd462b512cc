//! Session store: session id → current fitted model

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use crate::training::FittedModel;

/// Keyed storage of one model handle per session.
///
/// Implementations must make `replace` atomic per key: a reader sees either
/// the previous handle or the new one.
pub trait SessionStore: Send + Sync {
    /// Install `model` for `session_id`, returning the handle it replaced
    fn replace(&self, session_id: &str, model: Arc<FittedModel>) -> Option<Arc<FittedModel>>;

    fn get(&self, session_id: &str) -> Option<Arc<FittedModel>>;

    /// Drop the session's handle; absent ids are a no-op
    fn remove(&self, session_id: &str) -> Option<Arc<FittedModel>>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Process-local store behind a read-write lock
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, Arc<FittedModel>>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for InMemorySessionStore {
    fn replace(&self, session_id: &str, model: Arc<FittedModel>) -> Option<Arc<FittedModel>> {
        self.sessions.write().insert(session_id.to_string(), model)
    }

    fn get(&self, session_id: &str) -> Option<Arc<FittedModel>> {
        self.sessions.read().get(session_id).cloned()
    }

    fn remove(&self, session_id: &str) -> Option<Arc<FittedModel>> {
        self.sessions.write().remove(session_id)
    }

    fn len(&self) -> usize {
        self.sessions.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Params, Point};
    use crate::training::fit_linear_regression;

    fn model(slope: f64) -> Arc<FittedModel> {
        let points = vec![Point::new(0.0, 0.0), Point::new(1.0, slope)];
        Arc::new(fit_linear_regression(&points, &Params::new()).unwrap().model)
    }

    #[test]
    fn test_replace_get_remove() {
        let store = InMemorySessionStore::new();
        assert!(store.is_empty());

        assert!(store.replace("a", model(1.0)).is_none());
        assert!(store.replace("a", model(2.0)).is_some());
        assert_eq!(store.len(), 1);
        assert!(store.get("a").is_some());
        assert!(store.get("b").is_none());

        assert!(store.remove("a").is_some());
        assert!(store.remove("a").is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_handle_outlives_removal() {
        let store = InMemorySessionStore::new();
        store.replace("a", model(1.0));
        let held = store.get("a").unwrap();
        store.remove("a");
        assert_eq!(held.algorithm().as_str(), "linear_regression");
    }
}
