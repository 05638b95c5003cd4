//! Network strategy: payloads from captured endpoint responses.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

use super::{Candidate, MIN_PAYLOAD_LEN, payload_prefix};
use crate::context::{CapturedResponse, SessionContext};
use crate::error::HarvestError;

/// Quoted `"fen": "..."` anywhere in a body.
static QUOTED_PAYLOAD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""fen"\s*:\s*"([^"]+)""#).expect("valid quoted payload pattern")
});

/// A named rule that tries to pull a payload out of a parsed body.
pub struct LookupRule {
    pub name: &'static str,
    pub apply: fn(&Value) -> Option<String>,
}

/// What the strategy made of one response body.
#[derive(Debug, Default)]
pub struct Extraction {
    pub parsed: Option<Value>,
    pub payload: Option<String>,
}

/// Extracts payloads from responses whose URL matches the endpoint pattern.
pub struct NetworkStrategy {
    endpoint: Regex,
    rules: Vec<LookupRule>,
}

impl NetworkStrategy {
    /// Build with the default lookup rules.
    pub fn new(endpoint_pattern: &str) -> Result<Self, HarvestError> {
        let endpoint = Regex::new(endpoint_pattern)
            .map_err(|e| HarvestError::Config(format!("endpoint_pattern: {}", e)))?;
        Ok(Self {
            endpoint,
            rules: default_rules(),
        })
    }

    /// Whether responses from `url` should be inspected.
    pub fn matches(&self, url: &str) -> bool {
        self.endpoint.is_match(url)
    }

    /// Run the lookup rules in order, then the textual fallback.
    pub fn extract(&self, body: &str) -> Extraction {
        let parsed = serde_json::from_str::<Value>(body).ok();

        if let Some(value) = &parsed {
            for rule in &self.rules {
                if let Some(payload) = (rule.apply)(value) {
                    debug!(rule = rule.name, "Payload found by lookup rule");
                    return Extraction {
                        parsed,
                        payload: Some(payload),
                    };
                }
            }
        }

        let payload = QUOTED_PAYLOAD
            .captures(body)
            .map(|cap| cap[1].to_string())
            .filter(|p| !p.trim().is_empty());
        if payload.is_some() {
            debug!("Payload found by textual fallback");
        }

        Extraction { parsed, payload }
    }

    /// Inspect one response and append it to the capture buffer.
    ///
    /// Never fails: unparseable bodies without a payload are logged and dropped.
    pub fn observe(&self, ctx: &SessionContext, url: &str, body: &str) {
        let Extraction { parsed, payload } = self.extract(body);

        match &payload {
            Some(p) => debug!(
                url,
                payload = payload_prefix(p, 60),
                "Captured payload from response"
            ),
            None if parsed.is_some() => debug!(url, "Response carried no payload"),
            None => {
                warn!(url, "Unparseable response from endpoint");
                return;
            }
        }

        ctx.push_capture(CapturedResponse {
            url: url.to_string(),
            body: parsed,
            payload,
        });
    }

    /// Newest payload captured since the last call, as a candidate.
    pub fn candidate(ctx: &SessionContext) -> Option<Candidate> {
        ctx.take_unread_payload().map(Candidate::network)
    }
}

fn default_rules() -> Vec<LookupRule> {
    vec![
        LookupRule {
            name: "fen",
            apply: |v| string_at(v, "fen"),
        },
        LookupRule {
            name: "position",
            apply: |v| v.get("position").and_then(position_like),
        },
        LookupRule {
            name: "data",
            apply: |v| v.get("data").and_then(data_like),
        },
    ]
}

fn string_at(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
}

/// A `position` value: the payload itself, or an object holding `fen`.
fn position_like(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Object(_) => string_at(value, "fen"),
        _ => None,
    }
}

/// A `data` value: an object with `fen`/`position`, or a long enough string.
fn data_like(value: &Value) -> Option<String> {
    match value {
        Value::Object(_) => {
            string_at(value, "fen").or_else(|| value.get("position").and_then(position_like))
        }
        Value::String(s) if s.len() > MIN_PAYLOAD_LEN => Some(s.clone()),
        _ => None,
    }
}

#[cfg(test)]
#[path = "network_tests.rs"]
mod tests;
