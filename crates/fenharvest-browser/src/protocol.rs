//! Wire types for the slice of CDP the harvester speaks.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outgoing command frame. `session_id` routes it to an attached page.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Command<'a> {
    pub id: u64,
    pub method: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<&'a str>,
}

/// Any incoming frame: a reply carries `id`, an event carries `method`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Incoming {
    pub id: Option<u64>,
    pub result: Option<Value>,
    pub error: Option<Fault>,
    pub method: Option<String>,
    pub params: Option<Value>,
    pub session_id: Option<String>,
}

impl Incoming {
    pub fn is_event(&self) -> bool {
        self.id.is_none() && self.method.is_some()
    }
}

/// Error object of a failed reply.
#[derive(Debug, Deserialize)]
pub struct Fault {
    pub code: i64,
    pub message: String,
}

/// `/json/version`. Chrome answers this one with PascalCase keys.
#[derive(Debug, Clone, Deserialize)]
pub struct VersionInfo {
    #[serde(rename = "Browser")]
    pub browser: String,
    #[serde(rename = "webSocketDebuggerUrl")]
    pub ws_url: String,
}

/// `/json/new`.
#[derive(Debug, Clone, Deserialize)]
pub struct NewTarget {
    pub id: String,
    pub url: String,
}

/// Layout box of an element from `DOM.getBoxModel`.
#[derive(Debug, Clone, Deserialize)]
pub struct ElementBox {
    pub content: Vec<f64>,
    pub width: i64,
    pub height: i64,
}

impl ElementBox {
    pub fn is_rendered(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// Center of the content quad, if it has four corners.
    pub fn center(&self) -> Option<(f64, f64)> {
        let q = self.content.get(..8)?;
        Some(((q[0] + q[2] + q[4] + q[6]) / 4.0, (q[1] + q[3] + q[5] + q[7]) / 4.0))
    }
}

/// Response metadata from `Network.responseReceived`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkResponse {
    pub url: String,
    pub status: i64,
    #[serde(default)]
    pub mime_type: String,
}

/// `Network.responseReceived` params.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseReceived {
    pub request_id: String,
    pub response: NetworkResponse,
}

/// `Network.loadingFinished` params.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadingFinished {
    pub request_id: String,
}

/// `Network.loadingFailed` params.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadingFailed {
    pub request_id: String,
    #[serde(default)]
    pub error_text: String,
    #[serde(default)]
    pub canceled: bool,
}

/// `Network.getResponseBody` result.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseBody {
    pub body: String,
    pub base64_encoded: bool,
}

/// Image encoding for `Page.captureScreenshot`.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScreenshotFormat {
    Jpeg,
    Png,
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
