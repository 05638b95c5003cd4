//! Session controller: the iteration loop.

use std::sync::Arc;
use std::time::Duration;

use fenharvest_config::HarvestConfig;
use fenharvest_store::RecordStore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::context::SessionContext;
use crate::driver::{DriverConfig, InteractionDriver};
use crate::error::{HarvestError, PageError};
use crate::extractor::{Candidate, NetworkStrategy, ProbeStrategy, payload_prefix};
use crate::page::LivePage;
use crate::reconciler::{Reconciler, Reconciliation};

/// Loop parameters.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    pub target_count: usize,
    pub failure_ceiling: u32,
    pub readiness_selector: String,
    pub readiness_timeout: Duration,
    pub settle: Duration,
    pub failure_backoff: Duration,
}

impl From<&HarvestConfig> for ControllerConfig {
    fn from(config: &HarvestConfig) -> Self {
        Self {
            target_count: config.target_count,
            failure_ceiling: config.failure_ceiling,
            readiness_selector: config.readiness_selector.clone(),
            readiness_timeout: config.readiness_timeout(),
            settle: config.settle(),
            failure_backoff: config.failure_backoff(),
        }
    }
}

/// Why the loop stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    TargetReached,
    Cancelled,
    SessionLost(String),
}

/// End-of-run counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub confirmed: usize,
    pub iterations: u64,
    pub failed_iterations: u64,
    pub ceiling_resets: u32,
    pub captured_responses: usize,
    pub stop: StopReason,
}

/// Drives iterations until the target is reached, the run is cancelled, or
/// the browser session is lost. The store is flushed before returning in
/// every case.
pub struct SessionController {
    page: Arc<dyn LivePage>,
    ctx: Arc<SessionContext>,
    probe: ProbeStrategy,
    driver: InteractionDriver,
    store: RecordStore,
    config: ControllerConfig,
    cancel: CancellationToken,
    iterations: u64,
    failed_iterations: u64,
    ceiling_resets: u32,
}

impl SessionController {
    pub fn new(
        page: Arc<dyn LivePage>,
        ctx: Arc<SessionContext>,
        store: RecordStore,
        harvest: &HarvestConfig,
        cancel: CancellationToken,
    ) -> Self {
        Self::with_parts(
            page,
            ctx,
            store,
            ControllerConfig::from(harvest),
            InteractionDriver::new(DriverConfig::from(harvest)),
            ProbeStrategy::default(),
            cancel,
        )
    }

    pub fn with_parts(
        page: Arc<dyn LivePage>,
        ctx: Arc<SessionContext>,
        store: RecordStore,
        config: ControllerConfig,
        driver: InteractionDriver,
        probe: ProbeStrategy,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            page,
            ctx,
            probe,
            driver,
            store,
            config,
            cancel,
            iterations: 0,
            failed_iterations: 0,
            ceiling_resets: 0,
        }
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    /// Run the loop. Returns the summary, or the fatal error after the
    /// final flush.
    pub async fn run(&mut self) -> Result<RunSummary, HarvestError> {
        // Surface an unwritable output before touching the page.
        self.store.flush().await?;
        info!(
            target = self.config.target_count,
            ceiling = self.config.failure_ceiling,
            output = ?self.store.path(),
            "Harvest started"
        );

        let stop = loop {
            if self.ctx.state().confirmed >= self.config.target_count {
                break StopReason::TargetReached;
            }
            if self.cancel.is_cancelled() {
                break StopReason::Cancelled;
            }

            match self.iterate().await {
                Ok(()) => {}
                Err(e) => {
                    error!("Browser session lost: {}", e);
                    break StopReason::SessionLost(e.to_string());
                }
            }
        };

        self.store.flush().await?;
        let summary = self.summary(stop);
        info!(
            confirmed = summary.confirmed,
            iterations = summary.iterations,
            failed = summary.failed_iterations,
            ceiling_resets = summary.ceiling_resets,
            captured = summary.captured_responses,
            stop = ?summary.stop,
            "Harvest finished"
        );

        match &summary.stop {
            StopReason::SessionLost(msg) => Err(HarvestError::SessionLost(msg.clone())),
            _ => Ok(summary),
        }
    }

    fn summary(&self, stop: StopReason) -> RunSummary {
        RunSummary {
            confirmed: self.ctx.state().confirmed,
            iterations: self.iterations,
            failed_iterations: self.failed_iterations,
            ceiling_resets: self.ceiling_resets,
            captured_responses: self.ctx.capture_count(),
            stop,
        }
    }

    /// One pass: ready, extract, reconcile, interact, advance.
    ///
    /// Only a lost session is returned as an error.
    async fn iterate(&mut self) -> Result<(), PageError> {
        self.iterations += 1;
        let iteration = self.iterations;
        let page = self.page.clone();

        if let Err(e) = page
            .wait_for_selector(&self.config.readiness_selector, self.config.readiness_timeout)
            .await
        {
            if e.is_fatal() {
                return Err(e);
            }
            let failures = self.ctx.with_state(|s| {
                s.consecutive_failures += 1;
                s.consecutive_failures
            });
            warn!(iteration, failures, "Item not ready: {}", e);
            self.failed_iterations += 1;
            self.check_ceiling();
            self.pause(self.config.failure_backoff).await;
            self.driver.advance(page.as_ref()).await?;
            return Ok(());
        }

        self.pause(self.config.settle).await;

        let candidates = self.extract(page.as_ref()).await?;
        let reconciliation = self.ctx.with_state(|s| Reconciler::reconcile(s, &candidates));

        let confirmed = match reconciliation {
            Reconciliation::Confirmed(record) => {
                info!(
                    iteration,
                    index = record.index,
                    source = %candidates_source(&candidates),
                    payload = payload_prefix(&record.payload, 60),
                    "Confirmed record {}/{}",
                    record.index,
                    self.config.target_count
                );
                if let Err(e) = self.store.append(record) {
                    error!("Record rejected by store: {}", e);
                    false
                } else {
                    self.flush_logged().await;
                    true
                }
            }
            Reconciliation::Duplicate => {
                debug!(iteration, "Candidate repeats the last record");
                self.note_failure(iteration);
                false
            }
            Reconciliation::Empty => {
                let last_capture = self.ctx.latest_captured_payload();
                debug!(
                    iteration,
                    captured = self.ctx.capture_count(),
                    last_capture = last_capture.as_deref().map(|p| payload_prefix(p, 60)),
                    "No candidate this iteration"
                );
                self.note_failure(iteration);
                false
            }
        };

        let record = if confirmed { self.store.latest_mut() } else { None };
        self.driver.interact(page.as_ref(), record).await?;

        if confirmed {
            self.flush_logged().await;
        }
        Ok(())
    }

    /// Network first; the probe only when the network has nothing new.
    async fn extract(&self, page: &dyn LivePage) -> Result<Vec<Candidate>, PageError> {
        let last = self.ctx.state().last_payload;
        if let Some(candidate) = NetworkStrategy::candidate(&self.ctx) {
            if last.as_deref() != Some(candidate.payload.as_str()) {
                return Ok(vec![candidate]);
            }
            debug!("Network candidate repeats the last record; probing");
        }
        Ok(self.probe.probe(page).await?.into_iter().collect())
    }

    fn note_failure(&mut self, iteration: u64) {
        self.failed_iterations += 1;
        let failures = self.ctx.state().consecutive_failures;
        warn!(
            iteration,
            failures,
            confirmed = self.ctx.state().confirmed,
            "Iteration produced no new record"
        );
        self.check_ceiling();
    }

    /// At the ceiling: log and reset rather than stop.
    fn check_ceiling(&mut self) {
        let ceiling = self.config.failure_ceiling;
        let reached = self.ctx.with_state(|s| {
            if s.consecutive_failures >= ceiling {
                s.consecutive_failures = 0;
                true
            } else {
                false
            }
        });
        if reached {
            self.ceiling_resets += 1;
            warn!(
                ceiling,
                resets = self.ceiling_resets,
                "Consecutive failure ceiling reached; resetting counter"
            );
        }
    }

    async fn flush_logged(&self) {
        if let Err(e) = self.store.flush().await {
            warn!("Flush failed, will retry on next mutation: {}", e);
        }
    }

    /// Sleep unless cancelled first.
    async fn pause(&self, duration: Duration) {
        tokio::select! {
            _ = tokio::time::sleep(duration) => {}
            _ = self.cancel.cancelled() => {}
        }
    }
}

fn candidates_source(candidates: &[Candidate]) -> String {
    Reconciler::select(candidates)
        .map(|c| c.provenance.to_string())
        .unwrap_or_default()
}
