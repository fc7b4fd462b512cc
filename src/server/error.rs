//! Error types for the server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::error::SketchError;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error(transparent)]
    Engine(#[from] SketchError),

    #[error("Invalid request: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServerError {
    /// Message shown to the client
    pub fn client_message(&self) -> String {
        match self {
            ServerError::Internal(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        // Engine and payload errors stay 200 so clients always get a structured body
        let status = match &self {
            ServerError::Engine(_) | ServerError::Json(_) => StatusCode::OK,
            ServerError::Internal(detail) => {
                tracing::error!(detail = %detail, "Internal server error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, Json(json!({ "error": self.client_message() }))).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ServerError>;

impl From<tokio::task::JoinError> for ServerError {
    fn from(err: tokio::task::JoinError) -> Self {
        ServerError::Internal(format!("worker task failed: {}", err))
    }
}
