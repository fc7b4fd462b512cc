//! Integration test: Server API endpoints and the training frame handler

use sketchml::server::{create_router, handle_training_message, AppState, ServerConfig};
use sketchml::session::SessionEngine;
use std::sync::Arc;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::time::Duration;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tower::ServiceExt;

fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
    }
}

fn test_app() -> (axum::Router, Arc<SessionEngine>) {
    let config = test_config();
    let engine = Arc::new(SessionEngine::default());
    let state = Arc::new(AppState::with_engine(config, Arc::clone(&engine)));
    (create_router(state), engine)
}

/// Serve the router on an ephemeral port; the returned router shares its state
async fn spawn_server() -> (SocketAddr, axum::Router, Arc<SessionEngine>) {
    let (app, engine) = test_app();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let served = app.clone();
    tokio::spawn(async move {
        axum::serve(listener, served).await.unwrap();
    });
    (addr, app, engine)
}

async fn wait_for_sessions(engine: &SessionEngine, expected: usize) {
    for _ in 0..100 {
        if engine.session_count() == expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(engine.session_count(), expected);
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn predict_request(session_id: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(format!("/predict/{}", session_id))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn linear_frame() -> String {
    json!({
        "algorithm": "linear_regression",
        "points": [{"x": 0, "y": 0}, {"x": 1, "y": 2}, {"x": 2, "y": 4}],
        "params": {}
    })
    .to_string()
}

// ============================================================================
// Liveness
// ============================================================================

#[tokio::test]
async fn test_root_endpoint() {
    let (app, _) = test_app();
    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({"message": "SketchML Backend API"}));
}

#[tokio::test]
async fn test_health_endpoint() {
    let (app, engine) = test_app();
    handle_training_message(Arc::clone(&engine), "h", &linear_frame()).await;

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(body["sessions"], 1);
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let (app, _) = test_app();
    let response = app
        .oneshot(Request::builder().uri("/api/models").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await, json!({"error": "Not found"}));
}

#[tokio::test]
async fn test_cors_allows_configured_origin() {
    let (app, _) = test_app();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .header(header::ORIGIN, "http://localhost:5173")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(
        response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "http://localhost:5173"
    );
}

// ============================================================================
// Training frames
// ============================================================================

#[tokio::test]
async fn test_training_frame_returns_fit_result() {
    let engine = Arc::new(SessionEngine::default());
    let reply = handle_training_message(Arc::clone(&engine), "s", &linear_frame()).await;
    let body: Value = serde_json::from_str(&reply).unwrap();

    assert!((body["parameters"]["slope"].as_f64().unwrap() - 2.0).abs() < 1e-9);
    assert_eq!(body["visualization"]["line"].as_array().unwrap().len(), 100);
    assert!(body["metrics"]["mse"].as_f64().unwrap() < 1e-12);
    assert!(body.get("model").is_none());
    assert_eq!(engine.session_count(), 1);
}

#[tokio::test]
async fn test_classifier_frame_streams_grid() {
    let engine = Arc::new(SessionEngine::default());
    let frame = json!({
        "algorithm": "svm",
        "points": [
            {"x": 0, "y": 0, "label": 0}, {"x": 1, "y": 0, "label": 0},
            {"x": 5, "y": 5, "label": 1}, {"x": 6, "y": 5, "label": 1}
        ],
        "params": {"C": 1.0, "kernel": "linear"}
    })
    .to_string();

    let reply = handle_training_message(engine, "s", &frame).await;
    let body: Value = serde_json::from_str(&reply).unwrap();
    let z = body["visualization"]["decision_boundary"]["z"].as_array().unwrap();
    assert_eq!(z.len(), 50);
    assert_eq!(body["parameters"]["kernel"], "linear");
    assert!(body["visualization"]["support_vectors"].is_array());
}

#[tokio::test]
async fn test_malformed_frame_reports_error() {
    let engine = Arc::new(SessionEngine::default());
    let reply = handle_training_message(Arc::clone(&engine), "s", "{not json").await;
    let body: Value = serde_json::from_str(&reply).unwrap();
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Invalid training request:"));
    assert_eq!(engine.session_count(), 0);
}

#[tokio::test]
async fn test_engine_error_frame() {
    let engine = Arc::new(SessionEngine::default());
    let frame = json!({"algorithm": "quantum_regression", "points": []}).to_string();
    let reply = handle_training_message(engine, "s", &frame).await;
    let body: Value = serde_json::from_str(&reply).unwrap();
    assert_eq!(body["error"], "Unknown algorithm: quantum_regression");
}

// ============================================================================
// Prediction
// ============================================================================

#[tokio::test]
async fn test_predict_after_training() {
    let (app, engine) = test_app();
    handle_training_message(Arc::clone(&engine), "s", &linear_frame()).await;

    let response = app
        .oneshot(predict_request("s", r#"{"x": 3, "y": 0}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!((body["prediction"].as_f64().unwrap() - 6.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_predict_classifier_returns_label() {
    let (app, engine) = test_app();
    let frame = json!({
        "algorithm": "knn",
        "points": [
            {"x": 0, "y": 0, "label": 3}, {"x": 1, "y": 0, "label": 3},
            {"x": 5, "y": 5, "label": 7}, {"x": 6, "y": 5, "label": 7}
        ],
        "params": {"n_neighbors": 1}
    })
    .to_string();
    handle_training_message(engine, "k", &frame).await;

    let response = app
        .oneshot(predict_request("k", r#"{"x": 5.5, "y": 5.2}"#))
        .await
        .unwrap();
    assert_eq!(body_json(response).await, json!({"prediction": 7}));
}

#[tokio::test]
async fn test_predict_unknown_session() {
    let (app, _) = test_app();
    let response = app
        .oneshot(predict_request("ghost", r#"{"x": 1, "y": 1}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["error"], "No trained model found for session ghost");
}

#[tokio::test]
async fn test_predict_malformed_body() {
    let (app, _) = test_app();
    let response = app
        .oneshot(predict_request("s", r#"{"x": "one"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().starts_with("Invalid request:"));
}

// ============================================================================
// Training channel over a real socket
// ============================================================================

#[tokio::test]
async fn test_socket_close_destroys_session() {
    let (addr, app, engine) = spawn_server().await;
    let (mut ws, _) = tokio_tungstenite::connect_async(format!("ws://{}/ws/live", addr))
        .await
        .unwrap();

    // Binary frames are skipped, so the first reply answers the text frame
    ws.send(WsMessage::Binary(vec![1, 2, 3])).await.unwrap();
    ws.send(WsMessage::Text(linear_frame())).await.unwrap();

    let reply = ws.next().await.unwrap().unwrap().into_text().unwrap();
    let body: Value = serde_json::from_str(&reply).unwrap();
    assert!((body["parameters"]["slope"].as_f64().unwrap() - 2.0).abs() < 1e-9);
    assert_eq!(engine.session_count(), 1);

    ws.send(WsMessage::Text("{not json".to_string())).await.unwrap();
    let reply = ws.next().await.unwrap().unwrap().into_text().unwrap();
    assert!(reply.contains("Invalid training request"));
    assert_eq!(engine.session_count(), 1);

    ws.close(None).await.unwrap();
    wait_for_sessions(&engine, 0).await;

    let response = app
        .oneshot(predict_request("live", r#"{"x": 1, "y": 1}"#))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["error"], "No trained model found for session live");
}

#[tokio::test]
async fn test_dropped_connection_destroys_session() {
    let (addr, _, engine) = spawn_server().await;
    let (mut ws, _) = tokio_tungstenite::connect_async(format!("ws://{}/ws/gone", addr))
        .await
        .unwrap();

    ws.send(WsMessage::Text(linear_frame())).await.unwrap();
    ws.next().await.unwrap().unwrap();
    assert_eq!(engine.session_count(), 1);

    // No close handshake: the server sees the transport end
    drop(ws);
    wait_for_sessions(&engine, 0).await;
}
