//! Page session handle and the commands that act on the page as a whole.

use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tracing::debug;

use crate::client::Transport;
use crate::error::CdpError;
use crate::protocol::{Incoming, ScreenshotFormat};

/// Domains enabled on every new page. `Network` feeds the response observer.
const DOMAINS: [&str; 4] = ["Page", "DOM", "Runtime", "Network"];

/// One attached tab.
pub struct PageSession {
    pub(super) target_id: String,
    pub(super) session_id: String,
    pub(super) transport: Transport,
    /// Handed out once, to whoever observes network traffic.
    pub(super) events: Mutex<Option<mpsc::UnboundedReceiver<Incoming>>>,
}

impl PageSession {
    pub(crate) fn new(
        target_id: String,
        session_id: String,
        transport: Transport,
        events: mpsc::UnboundedReceiver<Incoming>,
    ) -> Self {
        Self {
            target_id,
            session_id,
            transport,
            events: Mutex::new(Some(events)),
        }
    }

    pub fn target_id(&self) -> &str {
        &self.target_id
    }

    /// Command scoped to this page.
    pub async fn call(&self, method: &str, params: Option<Value>) -> Result<Value, CdpError> {
        self.transport
            .send(method, params, Some(&self.session_id))
            .await
    }

    pub(crate) async fn enable_domains(&self) -> Result<(), CdpError> {
        for domain in DOMAINS {
            self.call(&format!("{}.enable", domain), None).await?;
        }
        debug!(session = %self.session_id, "Page domains enabled");
        Ok(())
    }

    pub async fn set_viewport(&self, width: u32, height: u32) -> Result<(), CdpError> {
        self.call(
            "Emulation.setDeviceMetricsOverride",
            Some(json!({
                "width": width,
                "height": height,
                "deviceScaleFactor": 1,
                "mobile": false,
            })),
        )
        .await?;
        Ok(())
    }

    /// `innerText` of the body, empty before the body exists.
    pub async fn body_text(&self) -> Result<String, CdpError> {
        let text = self
            .evaluate("document.body ? document.body.innerText : ''")
            .await?;
        Ok(text.as_str().unwrap_or_default().to_string())
    }

    /// Capture the viewport; returns the base64 image.
    pub async fn screenshot(&self, format: ScreenshotFormat) -> Result<String, CdpError> {
        let shot = self
            .call("Page.captureScreenshot", Some(json!({ "format": format })))
            .await?;
        match shot["data"].as_str() {
            Some(data) => Ok(data.to_string()),
            None => Err(CdpError::InvalidResponse("screenshot without data".into())),
        }
    }
}
