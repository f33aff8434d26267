//! Collector HTTP server.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use approvetap_browser::SessionController;
use axum::{
    Router,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, instrument};

use crate::{collector, control, health_api};

/// Latest payload received on the hook endpoint.
#[derive(Debug, Clone)]
pub struct CollectedEvent {
    pub received_at: DateTime<Utc>,
    pub payload: Value,
}

/// Application state shared across routes.
#[derive(Clone)]
pub struct GatewayState {
    pub sessions: Arc<SessionController>,
    pub last_event: Arc<RwLock<Option<CollectedEvent>>>,
    pub started_at: Instant,
}

impl GatewayState {
    pub fn new(sessions: Arc<SessionController>) -> Self {
        Self {
            sessions,
            last_event: Arc::default(),
            started_at: Instant::now(),
        }
    }
}

/// All routes. Every origin may call them; the page posts cross-origin.
pub fn build_router(state: GatewayState, hook_path: &str) -> Router {
    Router::new()
        .route(hook_path, post(collector::collect))
        .route("/events/last", get(collector::last_event))
        .route("/start", post(control::start))
        .route("/stop", post(control::stop))
        .route("/status", get(control::status))
        .route("/api/health", get(health_api::get_health))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve until Ctrl-C, then stop any running session.
#[instrument(skip(state))]
pub async fn start_server(addr: SocketAddr, hook_path: &str, state: GatewayState) -> Result<()> {
    let sessions = Arc::clone(&state.sessions);
    let app = build_router(state, hook_path);

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind collector on {addr}"))?;
    info!("Collector listening on {} (hook: {})", addr, hook_path);
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown requested");
        })
        .await?;

    sessions.stop().await;
    Ok(())
}
