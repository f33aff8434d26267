//! Browser session control.

use axum::{Json, extract::State, http::StatusCode};
use serde_json::{Value, json};
use tracing::warn;

use crate::server::GatewayState;

/// `POST /start`: `started` or `already_running`.
pub async fn start(State(state): State<GatewayState>) -> (StatusCode, Json<Value>) {
    match state.sessions.start().await {
        Ok(outcome) => (StatusCode::OK, Json(json!({ "status": outcome }))),
        Err(e) => {
            warn!(error = %format!("{e:#}"), "Session start failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "status": "error", "error": format!("{e:#}") })),
            )
        }
    }
}

/// `POST /stop`: always reports `stopped`.
pub async fn stop(State(state): State<GatewayState>) -> Json<Value> {
    state.sessions.stop().await;
    Json(json!({ "status": "stopped" }))
}

/// `GET /status`
pub async fn status(State(state): State<GatewayState>) -> Json<Value> {
    Json(json!({ "running": state.sessions.is_running().await }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{failing_state, idle_state};

    #[tokio::test]
    async fn start_status_stop_cycle() {
        let state = idle_state();
        assert_eq!(status(State(state.clone())).await.0, json!({"running": false}));

        let (code, Json(body)) = start(State(state.clone())).await;
        assert_eq!(code, StatusCode::OK);
        assert_eq!(body, json!({"status": "started"}));
        let (_, Json(body)) = start(State(state.clone())).await;
        assert_eq!(body, json!({"status": "already_running"}));
        assert_eq!(status(State(state.clone())).await.0, json!({"running": true}));

        assert_eq!(stop(State(state.clone())).await.0, json!({"status": "stopped"}));
        assert_eq!(status(State(state.clone())).await.0, json!({"running": false}));
        assert_eq!(stop(State(state)).await.0, json!({"status": "stopped"}));
    }

    #[tokio::test]
    async fn start_failure_is_500() {
        let (code, Json(body)) = start(State(failing_state())).await;
        assert_eq!(code, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["status"], "error");
        assert!(body["error"].as_str().unwrap().contains("chrome not found"));
    }
}
