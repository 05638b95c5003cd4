//! CDP error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CdpError {
    /// Nothing answered on the debugging endpoint.
    #[error("No browser at {0}; run Chrome with --remote-debugging-port")]
    Unreachable(String),

    #[error("WebSocket error: {0}")]
    Socket(String),

    /// The browser rejected a command.
    #[error("{method} failed: {message} ({code})")]
    Protocol {
        method: String,
        code: i64,
        message: String,
    },

    #[error("Malformed message: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    /// A page script threw.
    #[error("JavaScript error: {0}")]
    JavaScript(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    /// The socket closed while a command was in flight.
    #[error("Session closed")]
    SessionClosed,

    #[error("Unexpected reply: {0}")]
    InvalidResponse(String),
}

impl CdpError {
    /// Whether the browser connection itself is gone.
    pub fn is_disconnect(&self) -> bool {
        matches!(
            self,
            CdpError::SessionClosed | CdpError::Socket(_) | CdpError::Unreachable(_)
        )
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for CdpError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        CdpError::Socket(e.to_string())
    }
}

impl From<reqwest::Error> for CdpError {
    fn from(e: reqwest::Error) -> Self {
        CdpError::Http(e.to_string())
    }
}
