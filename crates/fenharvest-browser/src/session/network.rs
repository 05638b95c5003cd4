//! Network domain: passive observation of responses.
//!
//! Observation only. Requests are never paused or rewritten, so whatever the
//! observer does with a response cannot stall the page's own exchange.

use base64::Engine;
use serde_json::json;
use tokio::sync::mpsc;
use tracing::trace;

use crate::error::CdpError;
use crate::protocol::{Incoming, LoadingFailed, LoadingFinished, ResponseBody, ResponseReceived};

use super::core::PageSession;

/// A network event relevant to response observation.
#[derive(Debug, Clone)]
pub enum NetworkEvent {
    /// Headers arrived for a request; the body may still be streaming.
    ResponseReceived(ResponseReceived),
    /// The body of a request is complete and can be fetched.
    LoadingFinished(LoadingFinished),
    /// The request failed or was cancelled; no body will follow.
    LoadingFailed(LoadingFailed),
}

impl NetworkEvent {
    /// Decode a raw CDP event, ignoring anything outside the methods above.
    pub fn from_cdp(event: &Incoming) -> Option<Self> {
        let params = event.params.clone()?;
        match event.method.as_deref()? {
            "Network.responseReceived" => serde_json::from_value(params)
                .ok()
                .map(NetworkEvent::ResponseReceived),
            "Network.loadingFinished" => serde_json::from_value(params)
                .ok()
                .map(NetworkEvent::LoadingFinished),
            "Network.loadingFailed" => serde_json::from_value(params)
                .ok()
                .map(NetworkEvent::LoadingFailed),
            _ => None,
        }
    }
}

/// Stream of network events for one page session.
pub struct NetworkEvents {
    rx: mpsc::UnboundedReceiver<Incoming>,
}

impl NetworkEvents {
    /// Next network event, or `None` once the session is gone.
    pub async fn next(&mut self) -> Option<NetworkEvent> {
        while let Some(raw) = self.rx.recv().await {
            if let Some(event) = NetworkEvent::from_cdp(&raw) {
                return Some(event);
            }
            trace!("Skipping event {:?}", raw.method);
        }
        None
    }
}

impl PageSession {
    /// Take the session's network event stream. Only the first call gets it.
    pub fn take_network_events(&self) -> Option<NetworkEvents> {
        self.events.lock().take().map(|rx| NetworkEvents { rx })
    }

    /// Fetch the body of a finished response as text.
    pub async fn response_body(&self, request_id: &str) -> Result<String, CdpError> {
        let reply = self
            .call(
                "Network.getResponseBody",
                Some(json!({ "requestId": request_id })),
            )
            .await?;
        Self::decode_body(serde_json::from_value(reply)?)
    }

    pub(super) fn decode_body(body: ResponseBody) -> Result<String, CdpError> {
        if !body.base64_encoded {
            return Ok(body.body);
        }
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(body.body.as_bytes())
            .map_err(|e| CdpError::InvalidResponse(format!("Bad base64 body: {}", e)))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}
