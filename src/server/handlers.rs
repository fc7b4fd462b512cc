//! HTTP and WebSocket request handlers

use std::sync::Arc;
use axum::{
    body::Bytes,
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    response::IntoResponse,
    Json,
};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::data::{TestPoint, TrainingRequest};
use crate::session::SessionEngine;

use super::error::{Result, ServerError};
use super::state::AppState;

// ============================================================================
// Training channel
// ============================================================================

/// Upgrade to the per-session training channel
pub async fn training_socket(
    ws: WebSocketUpgrade,
    Path(session_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| run_training_session(socket, session_id, state))
}

async fn run_training_session(mut socket: WebSocket, session_id: String, state: Arc<AppState>) {
    info!(session_id = %session_id, sessions = state.session_count(), "Training session opened");

    while let Some(frame) = socket.recv().await {
        match frame {
            Ok(Message::Text(text)) => {
                let reply =
                    handle_training_message(Arc::clone(&state.engine), &session_id, &text).await;
                if let Err(err) = socket.send(Message::Text(reply)).await {
                    warn!(session_id = %session_id, error = %err, "Failed to send training reply");
                    break;
                }
            }
            Ok(Message::Close(_)) => break,
            // Binary frames carry nothing we understand; ping/pong is answered by axum
            Ok(_) => {}
            Err(err) => {
                warn!(session_id = %session_id, error = %err, "Training channel error");
                break;
            }
        }
    }

    state.engine.destroy(&session_id);
    info!(session_id = %session_id, sessions = state.session_count(), "Training session closed");
}

/// Process one training frame and produce the JSON reply text.
///
/// The fit runs on the blocking pool and is awaited here, so a session
/// never has two retrains in flight.
pub async fn handle_training_message(
    engine: Arc<SessionEngine>,
    session_id: &str,
    text: &str,
) -> String {
    let request: TrainingRequest = match serde_json::from_str(text) {
        Ok(request) => request,
        Err(err) => {
            debug!(session_id = %session_id, error = %err, "Unparseable training frame");
            return error_body(format!("Invalid training request: {}", err));
        }
    };

    let id = session_id.to_string();
    let outcome = tokio::task::spawn_blocking(move || engine.retrain(&id, &request))
        .await
        .map_err(ServerError::from)
        .and_then(|result| result.map_err(ServerError::from))
        .and_then(|fit| serde_json::to_string(&fit).map_err(|e| ServerError::Internal(e.to_string())));

    match outcome {
        Ok(body) => body,
        Err(err) => {
            if let ServerError::Internal(detail) = &err {
                tracing::error!(session_id = %session_id, detail = %detail, "Training failed internally");
            }
            error_body(err.client_message())
        }
    }
}

fn error_body(message: String) -> String {
    json!({ "error": message }).to_string()
}

// ============================================================================
// Inference
// ============================================================================

/// Evaluate the session's model at one point
pub async fn predict(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    body: Bytes,
) -> Result<Json<Value>> {
    let point: TestPoint = serde_json::from_slice(&body)?;
    let prediction = state.engine.predict(&session_id, &point)?;
    Ok(Json(json!({ "prediction": prediction })))
}

// ============================================================================
// Liveness
// ============================================================================

pub async fn root() -> Json<Value> {
    Json(json!({ "message": "SketchML Backend API" }))
}

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "sessions": state.session_count(),
    }))
}
