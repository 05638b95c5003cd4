//! Network hook feeding the network strategy.
//!
//! Runs beside the main loop on its own task. Responses are only observed,
//! never held, and each body is fetched on a separate task so a slow fetch
//! cannot delay the event stream.

use std::collections::HashMap;
use std::sync::Arc;

use fenharvest_browser::{NetworkEvent, NetworkEvents};
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::context::SessionContext;
use crate::extractor::NetworkStrategy;
use crate::page::ResponseSource;

/// Tracks endpoint requests and hands finished bodies to the strategy.
pub struct NetworkInterceptor {
    strategy: Arc<NetworkStrategy>,
    ctx: Arc<SessionContext>,
    /// Matching requests whose body has not finished loading, by request id.
    pending: HashMap<String, String>,
}

impl NetworkInterceptor {
    pub fn new(strategy: Arc<NetworkStrategy>, ctx: Arc<SessionContext>) -> Self {
        Self {
            strategy,
            ctx,
            pending: HashMap::new(),
        }
    }

    /// Update tracking for one event. Returns `(request_id, url)` once a
    /// matching response is ready to be read.
    pub fn on_event(&mut self, event: NetworkEvent) -> Option<(String, String)> {
        match event {
            NetworkEvent::ResponseReceived(received) => {
                let url = received.response.url;
                if self.strategy.matches(&url) {
                    trace!(request_id = %received.request_id, url = %url, "Tracking endpoint response");
                    self.pending.insert(received.request_id, url);
                }
                None
            }
            NetworkEvent::LoadingFinished(finished) => {
                let url = self.pending.remove(&finished.request_id)?;
                Some((finished.request_id, url))
            }
            NetworkEvent::LoadingFailed(failed) => {
                if let Some(url) = self.pending.remove(&failed.request_id) {
                    debug!(
                        request_id = %failed.request_id,
                        url = %url,
                        canceled = failed.canceled,
                        "Endpoint request failed: {}",
                        failed.error_text
                    );
                }
                None
            }
        }
    }

    /// Number of endpoint requests still waiting for their body.
    pub fn in_flight(&self) -> usize {
        self.pending.len()
    }

    /// Fetch one body and run it through the strategy. Faults are logged only.
    pub async fn capture(
        strategy: &NetworkStrategy,
        ctx: &SessionContext,
        source: &dyn ResponseSource,
        request_id: &str,
        url: &str,
    ) {
        match source.response_body(request_id).await {
            Ok(body) => strategy.observe(ctx, url, &body),
            Err(e) => warn!(url, "Could not read response body: {}", e),
        }
    }

    /// Consume `events` on a background task until the session ends.
    pub fn spawn(mut self, mut events: NetworkEvents, source: Arc<dyn ResponseSource>) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(event) = events.next().await {
                let Some((request_id, url)) = self.on_event(event) else {
                    continue;
                };
                let strategy = self.strategy.clone();
                let ctx = self.ctx.clone();
                let source = source.clone();
                tokio::spawn(async move {
                    Self::capture(&strategy, &ctx, source.as_ref(), &request_id, &url).await;
                });
            }
            debug!(in_flight = self.in_flight(), "Network event stream ended");
        })
    }
}
