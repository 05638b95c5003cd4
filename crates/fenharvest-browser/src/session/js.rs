//! `Runtime.evaluate`.

use serde_json::{Value, json};

use crate::error::CdpError;

use super::core::PageSession;

impl PageSession {
    /// Evaluate `expression`, awaiting promises, and return the value by value.
    /// A thrown exception becomes [`CdpError::JavaScript`].
    pub async fn evaluate(&self, expression: &str) -> Result<Value, CdpError> {
        let mut reply = self
            .call(
                "Runtime.evaluate",
                Some(json!({
                    "expression": expression,
                    "returnByValue": true,
                    "awaitPromise": true,
                })),
            )
            .await?;

        if let Some(details) = reply.get("exceptionDetails") {
            let message = details["exception"]["description"]
                .as_str()
                .or_else(|| details["text"].as_str())
                .unwrap_or("uncaught exception");
            return Err(CdpError::JavaScript(message.to_string()));
        }

        Ok(reply["result"]["value"].take())
    }

    /// Quote `value` as a JavaScript string literal.
    pub(super) fn js_string(value: &str) -> Result<String, CdpError> {
        Ok(serde_json::to_string(value)?)
    }
}
