//! Error types for the SketchML engine

use thiserror::Error;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, SketchError>;

/// Errors surfaced by training, session management and prediction.
///
/// Every variant is recoverable: the server turns them into a structured
/// `{"error": message}` payload and keeps the session channel open.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SketchError {
    #[error("Unknown algorithm: {0}")]
    UnknownAlgorithm(String),

    #[error("Insufficient data: {algorithm} needs at least {required} points, got {actual}")]
    InsufficientData {
        algorithm: String,
        required: usize,
        actual: usize,
    },

    #[error("Insufficient class diversity: {algorithm} needs at least 2 distinct labels")]
    InsufficientClassDiversity { algorithm: String },

    #[error("Missing label: {algorithm} requires a label on every point (point {index} has none)")]
    MissingLabel { algorithm: String, index: usize },

    #[error("Invalid parameter: {name} = {value}, {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },

    #[error("No trained model found for session {0}")]
    SessionNotFound(String),

    #[error("Evaluation failed: {0}")]
    EvaluationFailure(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Computation error: {0}")]
    ComputationError(String),
}

impl SketchError {
    pub(crate) fn invalid_parameter(
        name: &str,
        value: impl std::fmt::Display,
        reason: &str,
    ) -> Self {
        SketchError::InvalidParameter {
            name: name.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl From<serde_json::Error> for SketchError {
    fn from(err: serde_json::Error) -> Self {
        SketchError::InvalidRequest(err.to_string())
    }
}

impl From<ndarray::ShapeError> for SketchError {
    fn from(err: ndarray::ShapeError) -> Self {
        SketchError::ComputationError(err.to_string())
    }
}
