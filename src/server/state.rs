//! Application state management

use std::sync::Arc;

use crate::session::SessionEngine;

use super::ServerConfig;

/// Application state shared across handlers
pub struct AppState {
    pub config: ServerConfig,
    /// Shared with blocking fit tasks, hence the extra `Arc`
    pub engine: Arc<SessionEngine>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        Self::with_engine(config, Arc::new(SessionEngine::default()))
    }

    pub fn with_engine(config: ServerConfig, engine: Arc<SessionEngine>) -> Self {
        Self { config, engine }
    }

    pub fn session_count(&self) -> usize {
        self.engine.session_count()
    }
}
