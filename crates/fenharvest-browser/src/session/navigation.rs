//! Navigation and bounded waits.

use std::time::Duration;

use serde_json::json;
use tracing::debug;

use crate::error::CdpError;

use super::core::PageSession;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

impl PageSession {
    /// Poll `check` until it yields a value or `timeout` elapses.
    async fn poll_until<T, F, Fut>(
        &self,
        timeout: Duration,
        what: impl Fn() -> String,
        mut check: F,
    ) -> Result<T, CdpError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Option<T>, CdpError>>,
    {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if let Some(value) = check().await? {
                return Ok(value);
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(CdpError::Timeout(what()));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    /// Navigate and wait until the document is interactive. Returns the frame id.
    pub async fn navigate(&self, url: &str, timeout: Duration) -> Result<String, CdpError> {
        let reply = self
            .call("Page.navigate", Some(json!({ "url": url })))
            .await?;
        if let Some(reason) = reply["errorText"].as_str() {
            return Err(CdpError::Navigation {
                url: url.to_string(),
                reason: reason.to_string(),
            });
        }

        self.poll_until(
            timeout,
            || format!("loading {}", url),
            move || async move {
                let state = self.evaluate("document.readyState").await?;
                Ok::<_, CdpError>(matches!(state.as_str(), Some("interactive" | "complete")).then_some(()))
            },
        )
        .await?;

        debug!("Loaded {}", url);
        Ok(reply["frameId"].as_str().unwrap_or_default().to_string())
    }

    pub async fn current_url(&self) -> Result<String, CdpError> {
        let href = self.evaluate("window.location.href").await?;
        Ok(href.as_str().unwrap_or_default().to_string())
    }

    /// Wait for an element matching `selector`; returns its node id.
    pub async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> Result<i64, CdpError> {
        self.poll_until(
            timeout,
            || format!("waiting for '{}'", selector),
            move || async move { Ok::<_, CdpError>(self.query_all(selector).await?.first().copied()) },
        )
        .await
    }

    /// Wait until the location contains `fragment`; returns the URL.
    pub async fn wait_for_url(&self, fragment: &str, timeout: Duration) -> Result<String, CdpError> {
        self.poll_until(
            timeout,
            || format!("waiting for URL containing '{}'", fragment),
            move || async move {
                let url = self.current_url().await?;
                Ok::<_, CdpError>(url.contains(fragment).then_some(url))
            },
        )
        .await
    }
}
