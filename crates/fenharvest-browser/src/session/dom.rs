//! Element lookup and element-level actions.

use serde_json::{Value, json};
use tracing::debug;

use crate::error::CdpError;
use crate::protocol::ElementBox;

use super::core::PageSession;

impl PageSession {
    async fn root_node(&self) -> Result<i64, CdpError> {
        let doc = self
            .call("DOM.getDocument", Some(json!({ "depth": 0 })))
            .await?;
        doc["root"]["nodeId"]
            .as_i64()
            .ok_or_else(|| CdpError::InvalidResponse("document without root".into()))
    }

    /// Node ids of every element matching `selector`, in document order.
    pub async fn query_all(&self, selector: &str) -> Result<Vec<i64>, CdpError> {
        let root = self.root_node().await?;
        let found = self
            .call(
                "DOM.querySelectorAll",
                Some(json!({ "nodeId": root, "selector": selector })),
            )
            .await?;
        Ok(found["nodeIds"]
            .as_array()
            .map(|ids| ids.iter().filter_map(Value::as_i64).collect())
            .unwrap_or_default())
    }

    /// Trimmed visible text of every element matching `selector`.
    pub async fn element_texts(&self, selector: &str) -> Result<Vec<String>, CdpError> {
        let script = format!(
            "Array.from(document.querySelectorAll({})).map(e => (e.innerText || e.textContent || '').trim())",
            Self::js_string(selector)?
        );
        let texts = self.evaluate(&script).await?;
        Ok(texts
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .map(|t| t.as_str().unwrap_or_default().to_string())
                    .collect()
            })
            .unwrap_or_default())
    }

    /// Layout box, or `None` for nodes that are not rendered.
    async fn element_box(&self, node_id: i64) -> Result<Option<ElementBox>, CdpError> {
        match self
            .call("DOM.getBoxModel", Some(json!({ "nodeId": node_id })))
            .await
        {
            Ok(mut reply) => Ok(Some(serde_json::from_value(reply["model"].take())?)),
            Err(CdpError::Protocol { code: -32000, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Click the `nth` (zero-based) element matching `selector`.
    ///
    /// A rendered element gets a real mouse click at its center. Anything
    /// without a box is clicked through `HTMLElement.click()`.
    pub async fn click_nth(&self, selector: &str, nth: usize) -> Result<(), CdpError> {
        let missing = || CdpError::ElementNotFound(format!("{} #{}", selector, nth));
        let node_id = *self.query_all(selector).await?.get(nth).ok_or_else(missing)?;

        // Detached nodes fail here; the click reports it.
        let _ = self
            .call("DOM.scrollIntoViewIfNeeded", Some(json!({ "nodeId": node_id })))
            .await;

        let center = self
            .element_box(node_id)
            .await?
            .filter(ElementBox::is_rendered)
            .and_then(|b| b.center());
        if let Some((x, y)) = center {
            return self.click_at(x, y).await;
        }

        debug!("{} #{} has no box, clicking via script", selector, nth);
        let script = format!(
            "(() => {{ const el = document.querySelectorAll({})[{}]; if (!el) return false; el.click(); return true; }})()",
            Self::js_string(selector)?,
            nth
        );
        match self.evaluate(&script).await? {
            Value::Bool(true) => Ok(()),
            _ => Err(missing()),
        }
    }

    /// Replace the value of the first input matching `selector`.
    pub async fn fill(&self, selector: &str, value: &str) -> Result<(), CdpError> {
        let script = format!(
            "(() => {{ const el = document.querySelector({}); if (!el) return false; el.focus(); if (el.select) el.select(); return true; }})()",
            Self::js_string(selector)?
        );
        match self.evaluate(&script).await? {
            Value::Bool(true) => self.insert_text(value).await,
            _ => Err(CdpError::ElementNotFound(selector.to_string())),
        }
    }
}
