//! Interaction driver: choose, observe the verdict, advance.

use std::sync::LazyLock;
use std::time::Duration;

use fenharvest_config::HarvestConfig;
use fenharvest_store::{CHOICE_ARITY, Outcome, Record};
use regex::Regex;
use tracing::{debug, info, warn};

use crate::error::PageError;
use crate::page::{BUTTONS, LivePage, find_button_containing};
use crate::retry::RetryPolicy;

/// Castling, or a piece/pawn move in short algebraic notation.
static MOVE_NOTATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[O0]-[O0](?:-[O0])?|[RNBQK]?[a-h]?[1-8]?x?[a-h][1-8](?:=[RNBQ])?)[+#]?$")
        .expect("valid move pattern")
});

/// Whether `text` reads as a chess move.
pub fn is_move_notation(text: &str) -> bool {
    MOVE_NOTATION.is_match(text.trim())
}

/// Where the driver looks and how long it waits.
#[derive(Debug, Clone)]
pub struct DriverConfig {
    pub choice_selector: String,
    pub correct_marker_selector: String,
    pub action_settle: Duration,
    pub advance_texts: Vec<String>,
    pub advance_selectors: Vec<String>,
    pub advance_retry: RetryPolicy,
}

impl From<&HarvestConfig> for DriverConfig {
    fn from(config: &HarvestConfig) -> Self {
        Self {
            choice_selector: config.choice_selector.clone(),
            correct_marker_selector: config.correct_marker_selector.clone(),
            action_settle: config.action_settle(),
            advance_texts: config.advance.texts.clone(),
            advance_selectors: config.advance.selectors.clone(),
            advance_retry: RetryPolicy::from(&config.advance),
        }
    }
}

/// Executes the per-item UI action sequence.
///
/// Every step absorbs its own non-fatal faults; only a lost session is
/// returned to the caller.
pub struct InteractionDriver {
    config: DriverConfig,
}

/// Answer controls matched on screen: (element position, text).
type Choices = Vec<(usize, String)>;

impl InteractionDriver {
    pub fn new(config: DriverConfig) -> Self {
        Self { config }
    }

    /// Act on the current item, filling in `record` when one was confirmed,
    /// then try to advance. Returns whether the advance control was clicked.
    pub async fn interact(
        &self,
        page: &dyn LivePage,
        mut record: Option<&mut Record>,
    ) -> Result<bool, PageError> {
        let choices = absorb(self.find_choices(page).await, "enumerate choices")?.unwrap_or_default();

        if let Some(record) = record.as_deref_mut() {
            let texts: Vec<&str> = choices.iter().map(|(_, t)| t.as_str()).collect();
            record.set_choices(&texts);
        }

        let selected = absorb(self.select(page, &choices).await, "select choice")?.flatten();

        tokio::time::sleep(self.config.action_settle).await;

        if let Some(record) = record {
            if let Some(ordinal) = selected {
                record.selected = Some(ordinal);
                absorb(self.observe_outcome(page, record).await, "observe outcome")?;
            }
            info!(
                index = record.index,
                outcome = %record.outcome,
                answer = ?record.answer,
                "Recorded interaction"
            );
        }

        self.advance(page).await
    }

    /// Actionable elements whose text is a move, at most [`CHOICE_ARITY`].
    async fn find_choices(&self, page: &dyn LivePage) -> Result<Choices, PageError> {
        let texts = page.element_texts(&self.config.choice_selector).await?;
        let choices: Choices = texts
            .into_iter()
            .enumerate()
            .filter(|(_, text)| is_move_notation(text))
            .map(|(i, text)| (i, text.trim().to_string()))
            .take(CHOICE_ARITY)
            .collect();
        debug!(count = choices.len(), "Matched choices");
        Ok(choices)
    }

    /// Click the first matched choice, or any actionable element so the UI
    /// does not stall. Returns the ordinal of the clicked choice.
    async fn select(&self, page: &dyn LivePage, choices: &Choices) -> Result<Option<u8>, PageError> {
        match choices.first() {
            Some((position, text)) => {
                page.click_nth(&self.config.choice_selector, *position).await?;
                debug!(choice = %text, "Selected first choice");
                Ok(Some(1))
            }
            None => {
                debug!("No move-shaped choices; clicking first actionable element");
                page.click_nth(&self.config.choice_selector, 0).await?;
                Ok(None)
            }
        }
    }

    /// Infer outcome and correct answer from the page after the click.
    async fn observe_outcome(&self, page: &dyn LivePage, record: &mut Record) -> Result<(), PageError> {
        let Some(selected) = record.selected else {
            return Ok(());
        };

        let text = page.body_text().await?.to_lowercase();
        let marked = self.marked_choice(page, record).await;

        if text.contains("incorrect") {
            record.outcome = Outcome::Incorrect;
            record.answer = match marked {
                Some(n) if n != selected => Some(n),
                _ if record.choice_count() == CHOICE_ARITY => Some(other_ordinal(selected)),
                _ => None,
            };
        } else if text.contains("correct") {
            record.outcome = Outcome::Correct;
            record.answer = Some(marked.unwrap_or(selected));
        } else {
            debug!(index = record.index, "No verdict marker on page");
        }
        Ok(())
    }

    /// Ordinal of the recorded choice the page marks as right, if any.
    async fn marked_choice(&self, page: &dyn LivePage, record: &Record) -> Option<u8> {
        let texts = match page.element_texts(&self.config.correct_marker_selector).await {
            Ok(texts) => texts,
            Err(e) => {
                debug!("Correct marker lookup failed: {}", e);
                return None;
            }
        };
        record
            .choices
            .iter()
            .position(|choice| !choice.is_empty() && texts.iter().any(|t| t.trim() == choice))
            .map(|i| i as u8 + 1)
    }

    /// Find and click the advance control under the retry policy.
    pub async fn advance(&self, page: &dyn LivePage) -> Result<bool, PageError> {
        let clicked = self
            .config
            .advance_retry
            .run(|attempt| async move {
                match self.try_advance(page).await {
                    Ok(true) => Ok(Some(())),
                    Ok(false) => Ok(None),
                    Err(e) if e.is_fatal() => Err(e),
                    Err(e) => {
                        debug!(attempt, "Advance attempt failed: {}", e);
                        Ok(None)
                    }
                }
            })
            .await?
            .is_some();

        if clicked {
            debug!("Advanced");
        } else {
            warn!(
                attempts = self.config.advance_retry.attempts,
                "Advance control not found"
            );
        }
        Ok(clicked)
    }

    /// One lookup: enabled buttons by text first, then structural selectors.
    async fn try_advance(&self, page: &dyn LivePage) -> Result<bool, PageError> {
        if !self.config.advance_texts.is_empty() {
            if let Some(position) = find_button_containing(page, &self.config.advance_texts).await? {
                page.click_nth(BUTTONS, position).await?;
                return Ok(true);
            }
        }

        for selector in &self.config.advance_selectors {
            if !page.element_texts(selector).await?.is_empty() {
                page.click_nth(selector, 0).await?;
                return Ok(true);
            }
        }
        Ok(false)
    }
}

fn other_ordinal(selected: u8) -> u8 {
    if selected == 1 { 2 } else { 1 }
}

/// Log a non-fatal step fault and carry on; pass a lost session through.
fn absorb<T>(result: Result<T, PageError>, step: &str) -> Result<Option<T>, PageError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_fatal() => Err(e),
        Err(e) => {
            warn!(step, "Interaction step failed: {}", e);
            Ok(None)
        }
    }
}
