use thiserror::Error;

#[derive(Debug, Error)]
pub enum CdpError {
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("CDP error {code}: {message}")]
    Protocol { code: i64, message: String },

    #[error("CDP connection closed")]
    Closed,

    #[error("timed out waiting for {0}")]
    Timeout(String),

    #[error("page script threw: {0}")]
    Script(String),

    #[error("navigation failed: {0}")]
    Navigation(String),

    #[error("no page target on debug port {0}")]
    NoPageTarget(u16),

    #[error("DevTools discovery failed: {0}")]
    Discovery(#[from] reqwest::Error),

    #[error("failed to launch browser: {0}")]
    Launch(#[source] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
