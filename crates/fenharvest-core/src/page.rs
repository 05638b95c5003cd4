//! The live page seam.
//!
//! The extraction cycle talks to the browser only through [`LivePage`], so
//! it can run against a scripted page in tests.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use fenharvest_browser::{PageSession, ScreenshotFormat};
use serde_json::Value;

use crate::error::PageError;

/// Operations the extraction cycle needs from a live page.
#[async_trait]
pub trait LivePage: Send + Sync {
    /// Wait until an element matching `selector` exists.
    async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> Result<(), PageError>;

    /// Evaluate a JavaScript expression and return its value.
    async fn evaluate(&self, expression: &str) -> Result<Value, PageError>;

    /// Trimmed visible text of every element matching `selector`, in document order.
    async fn element_texts(&self, selector: &str) -> Result<Vec<String>, PageError>;

    /// Click the `nth` (zero-based) element matching `selector`.
    async fn click_nth(&self, selector: &str, nth: usize) -> Result<(), PageError>;

    /// Visible text of the whole document.
    async fn body_text(&self) -> Result<String, PageError>;

    async fn navigate(&self, url: &str, timeout: Duration) -> Result<(), PageError>;

    /// Replace the value of the first input matching `selector`.
    async fn fill(&self, selector: &str, value: &str) -> Result<(), PageError>;

    /// Wait until the current URL contains `fragment`; returns the URL.
    async fn wait_for_url(&self, fragment: &str, timeout: Duration) -> Result<String, PageError>;

    /// PNG screenshot bytes.
    async fn screenshot_png(&self) -> Result<Vec<u8>, PageError>;
}

/// Every enabled button on the page, for text matching.
pub(crate) const BUTTONS: &str = "button:not([disabled])";

/// Position of the first enabled button whose text contains any of `texts`,
/// ignoring case.
pub(crate) async fn find_button_containing(
    page: &dyn LivePage,
    texts: &[String],
) -> Result<Option<usize>, PageError> {
    let wanted: Vec<String> = texts.iter().map(|t| t.to_lowercase()).collect();
    let buttons = page.element_texts(BUTTONS).await?;
    Ok(buttons.iter().position(|b| {
        let b = b.to_lowercase();
        wanted.iter().any(|w| b.contains(w.as_str()))
    }))
}

/// Source of response bodies for observed network requests.
#[async_trait]
pub trait ResponseSource: Send + Sync {
    async fn response_body(&self, request_id: &str) -> Result<String, PageError>;
}

#[async_trait]
impl LivePage for PageSession {
    async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> Result<(), PageError> {
        PageSession::wait_for_selector(self, selector, timeout).await?;
        Ok(())
    }

    async fn evaluate(&self, expression: &str) -> Result<Value, PageError> {
        Ok(PageSession::evaluate(self, expression).await?)
    }

    async fn element_texts(&self, selector: &str) -> Result<Vec<String>, PageError> {
        Ok(PageSession::element_texts(self, selector).await?)
    }

    async fn click_nth(&self, selector: &str, nth: usize) -> Result<(), PageError> {
        Ok(PageSession::click_nth(self, selector, nth).await?)
    }

    async fn body_text(&self) -> Result<String, PageError> {
        Ok(PageSession::body_text(self).await?)
    }

    async fn navigate(&self, url: &str, timeout: Duration) -> Result<(), PageError> {
        PageSession::navigate(self, url, timeout).await?;
        Ok(())
    }

    async fn fill(&self, selector: &str, value: &str) -> Result<(), PageError> {
        Ok(PageSession::fill(self, selector, value).await?)
    }

    async fn wait_for_url(&self, fragment: &str, timeout: Duration) -> Result<String, PageError> {
        Ok(PageSession::wait_for_url(self, fragment, timeout).await?)
    }

    async fn screenshot_png(&self) -> Result<Vec<u8>, PageError> {
        let data = PageSession::screenshot(self, ScreenshotFormat::Png).await?;
        base64::engine::general_purpose::STANDARD
            .decode(data.as_bytes())
            .map_err(|e| PageError::Protocol(format!("screenshot data: {}", e)))
    }
}

#[async_trait]
impl ResponseSource for PageSession {
    async fn response_body(&self, request_id: &str) -> Result<String, PageError> {
        Ok(PageSession::response_body(self, request_id).await?)
    }
}
