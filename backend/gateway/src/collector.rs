//! Hook endpoint: accepts whatever the page sends.

use approvetap_logging::{ApprovalLogger, MessageSource};
use axum::{Json, body::Bytes, extract::State, http::StatusCode};
use chrono::Utc;
use serde_json::{Value, json};

use crate::server::{CollectedEvent, GatewayState};

/// JSON if it parses, `{"raw": text}` otherwise, `null` for an empty body.
pub fn parse_payload(body: &[u8]) -> Value {
    let text = String::from_utf8_lossy(body);
    if text.is_empty() {
        return Value::Null;
    }
    serde_json::from_str(&text).unwrap_or_else(|_| json!({ "raw": text }))
}

/// `POST <hookPath>`
pub async fn collect(State(state): State<GatewayState>, body: Bytes) -> StatusCode {
    let payload = parse_payload(&body);
    ApprovalLogger::log_message(MessageSource::Collector, &payload);
    *state.last_event.write().await = Some(CollectedEvent {
        received_at: Utc::now(),
        payload,
    });
    StatusCode::NO_CONTENT
}

/// `GET /events/last`
pub async fn last_event(State(state): State<GatewayState>) -> Json<Value> {
    let last = state.last_event.read().await;
    Json(last.as_ref().map_or(Value::Null, |e| e.payload.clone()))
}
