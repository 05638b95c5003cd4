//! Extraction cycle tunables.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Harvest loop configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarvestConfig {
    /// Stop after this many confirmed records.
    #[serde(default = "default_target_count")]
    pub target_count: usize,

    /// Consecutive failed iterations before the counter is logged and reset.
    #[serde(default = "default_failure_ceiling")]
    pub failure_ceiling: u32,

    /// Record store file; `~` is expanded.
    #[serde(default = "default_output")]
    pub output: String,

    /// Regex matched against response URLs carrying the next item.
    #[serde(default = "default_endpoint_pattern")]
    pub endpoint_pattern: String,

    /// Element whose presence means the next item is on screen.
    #[serde(default = "default_readiness_selector")]
    pub readiness_selector: String,

    #[serde(default = "default_readiness_timeout_ms")]
    pub readiness_timeout_ms: u64,

    /// Wait after readiness so the network hook can see the item's response.
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,

    /// Wait after clicking a choice for the verdict to render.
    #[serde(default = "default_action_settle_ms")]
    pub action_settle_ms: u64,

    /// Pause after a readiness timeout before the next pass.
    #[serde(default = "default_failure_backoff_ms")]
    pub failure_backoff_ms: u64,

    /// Candidate answer controls.
    #[serde(default = "default_choice_selector")]
    pub choice_selector: String,

    /// Elements the UI marks as the right answer, when it does.
    #[serde(default = "default_correct_marker_selector")]
    pub correct_marker_selector: String,

    #[serde(default)]
    pub advance: AdvanceConfig,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            target_count: default_target_count(),
            failure_ceiling: default_failure_ceiling(),
            output: default_output(),
            endpoint_pattern: default_endpoint_pattern(),
            readiness_selector: default_readiness_selector(),
            readiness_timeout_ms: default_readiness_timeout_ms(),
            settle_ms: default_settle_ms(),
            action_settle_ms: default_action_settle_ms(),
            failure_backoff_ms: default_failure_backoff_ms(),
            choice_selector: default_choice_selector(),
            correct_marker_selector: default_correct_marker_selector(),
            advance: AdvanceConfig::default(),
        }
    }
}

impl HarvestConfig {
    pub fn readiness_timeout(&self) -> Duration {
        Duration::from_millis(self.readiness_timeout_ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn action_settle(&self) -> Duration {
        Duration::from_millis(self.action_settle_ms)
    }

    pub fn failure_backoff(&self) -> Duration {
        Duration::from_millis(self.failure_backoff_ms)
    }
}

fn default_target_count() -> usize {
    500
}

fn default_failure_ceiling() -> u32 {
    5
}

fn default_output() -> String {
    "positions.csv".to_string()
}

fn default_endpoint_pattern() -> String {
    "/api/lessons/get_next/".to_string()
}

fn default_readiness_selector() -> String {
    "svg".to_string()
}

fn default_readiness_timeout_ms() -> u64 {
    10_000
}

fn default_settle_ms() -> u64 {
    2_000
}

fn default_action_settle_ms() -> u64 {
    2_000
}

fn default_failure_backoff_ms() -> u64 {
    2_000
}

fn default_choice_selector() -> String {
    "button:not([disabled])".to_string()
}

fn default_correct_marker_selector() -> String {
    r#"button[class*="active"], button[class*="correct"], [class*="Correct"]"#.to_string()
}

/// How the "advance" control is found and how often it is retried.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvanceConfig {
    /// Case-insensitive exact button texts, checked first.
    #[serde(default = "default_advance_texts")]
    pub texts: Vec<String>,

    /// Structural selectors, checked when no text matches.
    #[serde(default = "default_advance_selectors")]
    pub selectors: Vec<String>,

    /// Total lookups, including the first.
    #[serde(default = "default_advance_attempts")]
    pub attempts: u32,

    #[serde(default = "default_advance_backoff_ms")]
    pub backoff_ms: u64,
}

impl Default for AdvanceConfig {
    fn default() -> Self {
        Self {
            texts: default_advance_texts(),
            selectors: default_advance_selectors(),
            attempts: default_advance_attempts(),
            backoff_ms: default_advance_backoff_ms(),
        }
    }
}

impl AdvanceConfig {
    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }
}

fn default_advance_texts() -> Vec<String> {
    vec!["next".to_string()]
}

fn default_advance_selectors() -> Vec<String> {
    vec![
        r#"button[class*="MuiLoadingButton-root"][class*="MuiButton-kitPrimary"]:not([disabled])"#
            .to_string(),
    ]
}

fn default_advance_attempts() -> u32 {
    2
}

fn default_advance_backoff_ms() -> u64 {
    2_000
}
