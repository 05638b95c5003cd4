//! Error types for the extraction cycle.

use fenharvest_browser::CdpError;
use fenharvest_store::StoreError;
use thiserror::Error;

/// A fault raised by one interaction with the live page.
#[derive(Debug, Error)]
pub enum PageError {
    /// Bounded wait expired.
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Element or target not present.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Page script raised.
    #[error("Script error: {0}")]
    Script(String),

    /// Any other protocol-level failure.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The browser session itself is unusable.
    #[error("Session lost: {0}")]
    SessionLost(String),
}

impl PageError {
    /// Only a lost session ends the run; everything else is absorbed.
    pub fn is_fatal(&self) -> bool {
        matches!(self, PageError::SessionLost(_))
    }
}

impl From<CdpError> for PageError {
    fn from(e: CdpError) -> Self {
        if e.is_disconnect() {
            return PageError::SessionLost(e.to_string());
        }
        match e {
            CdpError::Timeout(msg) => PageError::Timeout(msg),
            CdpError::ElementNotFound(msg) => PageError::NotFound(msg),
            CdpError::JavaScript(msg) => PageError::Script(msg),
            other => PageError::Protocol(other.to_string()),
        }
    }
}

/// Errors that end a harvest run.
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Browser session lost: {0}")]
    SessionLost(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Login failed: {0}")]
    Login(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl HarvestError {
    /// Convert a fatal page fault; `None` for faults the caller should absorb.
    pub fn from_fatal(e: &PageError) -> Option<Self> {
        match e {
            PageError::SessionLost(msg) => Some(HarvestError::SessionLost(msg.clone())),
            _ => None,
        }
    }
}
