//! Fixed-attempt retry policy.

use std::future::Future;
use std::time::Duration;

use fenharvest_config::AdvanceConfig;
use tracing::debug;

/// Fixed number of attempts with a fixed pause between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 2,
            backoff: Duration::from_secs(2),
        }
    }
}

impl From<&AdvanceConfig> for RetryPolicy {
    fn from(config: &AdvanceConfig) -> Self {
        Self {
            attempts: config.attempts,
            backoff: config.backoff(),
        }
    }
}

impl RetryPolicy {
    pub fn new(attempts: u32, backoff: Duration) -> Self {
        Self { attempts, backoff }
    }

    /// Run `op` until it yields `Ok(Some(_))`, an error, or attempts run out.
    ///
    /// `op` receives the zero-based attempt number. At least one attempt is
    /// always made.
    pub async fn run<T, E, F, Fut>(&self, mut op: F) -> Result<Option<T>, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<Option<T>, E>>,
    {
        let attempts = self.attempts.max(1);
        for attempt in 0..attempts {
            if attempt > 0 {
                debug!(attempt, "Retrying after {:?}", self.backoff);
                tokio::time::sleep(self.backoff).await;
            }
            if let Some(value) = op(attempt).await? {
                return Ok(Some(value));
            }
        }
        Ok(None)
    }
}
