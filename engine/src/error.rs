use thiserror::Error;

/// Errors surfaced by the upstream REST/WebSocket clients and the feed
/// synchronizer's state machine. None of these escape the synchronizer
/// into the controller except via its cancellation signal — see
/// `spec.md` §7.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("http error {status}: {body}")]
    Http { status: u16, body: String },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("connection closed")]
    ConnectionClosed,

    #[error("pong timeout")]
    PongTimeout,

    #[error("snapshot had zero last_update_id")]
    InvalidSnapshot,
}

pub type Result<T> = std::result::Result<T, EngineError>;
