//! SketchML - interactive 2-D model playground backend
//!
//! Clients place points on a plane and pick a model family. Every update
//! retrains that client's model from scratch and streams back renderable
//! geometry (a regression line, a 50×50 decision grid or cluster centers)
//! together with fitted parameters and metrics.
//!
//! # Modules
//!
//! - [`data`] - Wire types: points, requests, fit results
//! - [`training`] - The seven model families and their fit adapters
//! - [`visualization`] - Decision-grid and regression-line geometry
//! - [`session`] - Per-session model store, retrain and prediction
//! - [`server`] - axum HTTP/WebSocket server
//! - [`cli`] - Command-line interface

pub mod error;
pub mod data;
pub mod training;
pub mod visualization;
pub mod session;
pub mod server;
pub mod cli;

pub use error::{Result, SketchError};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::{Result, SketchError};

    pub use crate::data::{
        FitResult, Metrics, Parameters, Params, Point, Prediction, TestPoint, TrainingRequest,
        Visualization,
    };

    pub use crate::training::{Algorithm, Classifier, FittedModel, TaskType};

    pub use crate::session::{InMemorySessionStore, SessionEngine, SessionStore};

    pub use crate::server::{create_router, run_server, AppState, ServerConfig};
}
