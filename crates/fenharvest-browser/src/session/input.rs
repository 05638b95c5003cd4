//! Synthetic input.

use serde_json::json;
use tracing::trace;

use crate::error::CdpError;

use super::core::PageSession;

impl PageSession {
    /// Left click at viewport coordinates: hover, press, release.
    pub async fn click_at(&self, x: f64, y: f64) -> Result<(), CdpError> {
        let phases = [("mouseMoved", "none", 0), ("mousePressed", "left", 1), ("mouseReleased", "left", 1)];
        for (kind, button, clicks) in phases {
            self.call(
                "Input.dispatchMouseEvent",
                Some(json!({
                    "type": kind,
                    "x": x,
                    "y": y,
                    "button": button,
                    "clickCount": clicks,
                })),
            )
            .await?;
        }
        trace!("Clicked at ({:.0}, {:.0})", x, y);
        Ok(())
    }

    /// Insert text at the caret, replacing any selection.
    pub async fn insert_text(&self, text: &str) -> Result<(), CdpError> {
        self.call("Input.insertText", Some(json!({ "text": text })))
            .await?;
        Ok(())
    }
}
