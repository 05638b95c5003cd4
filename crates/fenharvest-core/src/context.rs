//! Session-lifetime state shared by the network hook and the main loop.

use parking_lot::Mutex;
use serde_json::Value;

/// One observed response from the "next item" endpoint.
#[derive(Debug, Clone)]
pub struct CapturedResponse {
    pub url: String,
    /// Parsed body, when it was valid JSON.
    pub body: Option<Value>,
    /// Payload the network strategy found in it, if any.
    pub payload: Option<String>,
}

/// Counters and duplicate-suppression state for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub confirmed: usize,
    pub consecutive_failures: u32,
    pub last_payload: Option<String>,
}

#[derive(Default)]
struct CaptureBuffer {
    entries: Vec<CapturedResponse>,
    /// Entries before this were already seen by the main loop.
    cursor: usize,
}

/// Context object handed to every component of the cycle.
///
/// The capture buffer is append-only; the main loop reads the newest unread
/// payload at its own synchronization points.
#[derive(Default)]
pub struct SessionContext {
    captures: Mutex<CaptureBuffer>,
    state: Mutex<SessionState>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an observed response.
    pub fn push_capture(&self, capture: CapturedResponse) {
        self.captures.lock().entries.push(capture);
    }

    /// Newest payload captured since the last call, marking everything read.
    pub fn take_unread_payload(&self) -> Option<String> {
        let mut buffer = self.captures.lock();
        let start = buffer.cursor;
        buffer.cursor = buffer.entries.len();
        buffer.entries[start..]
            .iter()
            .rev()
            .find_map(|c| c.payload.clone())
    }

    /// Newest payload ever captured, read or not.
    pub fn latest_captured_payload(&self) -> Option<String> {
        self.captures
            .lock()
            .entries
            .iter()
            .rev()
            .find_map(|c| c.payload.clone())
    }

    pub fn capture_count(&self) -> usize {
        self.captures.lock().entries.len()
    }

    /// Snapshot of the counters.
    pub fn state(&self) -> SessionState {
        self.state.lock().clone()
    }

    pub fn with_state<R>(&self, f: impl FnOnce(&mut SessionState) -> R) -> R {
        f(&mut *self.state.lock())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capture(payload: Option<&str>) -> CapturedResponse {
        CapturedResponse {
            url: "https://example.com/api/lessons/get_next/".to_string(),
            body: None,
            payload: payload.map(str::to_string),
        }
    }

    #[test]
    fn test_take_unread_returns_newest_payload() {
        let ctx = SessionContext::new();
        ctx.push_capture(capture(Some("a")));
        ctx.push_capture(capture(Some("b")));
        ctx.push_capture(capture(None));

        assert_eq!(ctx.take_unread_payload().as_deref(), Some("b"));
        assert_eq!(ctx.take_unread_payload(), None);
    }

    #[test]
    fn test_latest_captured_survives_reads() {
        let ctx = SessionContext::new();
        ctx.push_capture(capture(Some("a")));
        let _ = ctx.take_unread_payload();

        assert_eq!(ctx.latest_captured_payload().as_deref(), Some("a"));
        assert_eq!(ctx.capture_count(), 1);
    }

    #[test]
    fn test_with_state_mutates_shared_counters() {
        let ctx = SessionContext::new();
        ctx.with_state(|s| {
            s.confirmed = 2;
            s.consecutive_failures = 1;
        });
        let state = ctx.state();
        assert_eq!(state.confirmed, 2);
        assert_eq!(state.consecutive_failures, 1);
    }
}
