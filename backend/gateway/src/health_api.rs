//! Gateway Health API

use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::server::GatewayState;

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub uptime_seconds: u64,
    pub session_running: bool,
    pub last_event_at: Option<DateTime<Utc>>,
    pub timestamp: DateTime<Utc>,
}

/// Handler for `GET /api/health`
pub async fn get_health(State(state): State<GatewayState>) -> Json<HealthReport> {
    let last_event_at = state.last_event.read().await.as_ref().map(|e| e.received_at);
    Json(HealthReport {
        status: "ok",
        uptime_seconds: state.started_at.elapsed().as_secs(),
        session_running: state.sessions.is_running().await,
        last_event_at,
        timestamp: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::collect;
    use crate::test_support::idle_state;
    use axum::body::Bytes;

    #[tokio::test]
    async fn reports_last_collection_time() {
        let state = idle_state();
        let Json(report) = get_health(State(state.clone())).await;
        assert_eq!(report.status, "ok");
        assert!(report.last_event_at.is_none());
        assert!(!report.session_running);

        collect(State(state.clone()), Bytes::from_static(b"{}")).await;
        let Json(report) = get_health(State(state)).await;
        assert!(report.last_event_at.is_some());
    }
}
