//! Scripted stand-in for a live page.
//!
//! Models a lesson UI: a queue of items, each shown until its "Next" button
//! is clicked. Items can announce their payload through the network hook,
//! through page state (the probe), both, or not at all.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use fenharvest_core::{LivePage, NetworkStrategy, PageError, SessionContext};
use parking_lot::Mutex;
use serde_json::{Value, json};

pub const BUTTONS: &str = "button:not([disabled])";
pub const READY: &str = "svg";
pub const ENDPOINT: &str = "https://site.test/api/lessons/get_next/";

/// How an item's payload reaches the harvester.
#[derive(Debug, Clone)]
pub enum Source {
    Network(String),
    Probe(String),
    /// Network and probe disagree.
    Both { network: String, probe: String },
    Silent,
}

#[derive(Debug, Clone)]
pub struct Item {
    pub source: Source,
    pub choices: Vec<String>,
    /// Body text once a choice was clicked.
    pub verdict: String,
    /// Texts matched by the correct-marker selector after a click.
    pub marked: Vec<String>,
    pub ready: bool,
}

impl Item {
    pub fn network(payload: &str) -> Self {
        Self::with_source(Source::Network(payload.to_string()))
    }

    pub fn probe(payload: &str) -> Self {
        Self::with_source(Source::Probe(payload.to_string()))
    }

    pub fn both(network: &str, probe: &str) -> Self {
        Self::with_source(Source::Both {
            network: network.to_string(),
            probe: probe.to_string(),
        })
    }

    pub fn silent() -> Self {
        Self::with_source(Source::Silent)
    }

    pub fn not_ready() -> Self {
        Self {
            ready: false,
            ..Self::silent()
        }
    }

    fn with_source(source: Source) -> Self {
        Self {
            source,
            choices: vec!["e4".to_string(), "d4".to_string()],
            verdict: String::new(),
            marked: Vec::new(),
            ready: true,
        }
    }

    pub fn choices(mut self, choices: &[&str]) -> Self {
        self.choices = choices.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn verdict(mut self, verdict: &str) -> Self {
        self.verdict = verdict.to_string();
        self
    }

    pub fn marked(mut self, marked: &[&str]) -> Self {
        self.marked = marked.iter().map(|c| c.to_string()).collect();
        self
    }
}

/// A board-position payload unique to `n`.
pub fn position(n: usize) -> String {
    format!("8/8/8/8/8/8/8/8 w - - 0 {}", n)
}

#[derive(Default)]
pub struct PageState {
    pub items: Vec<Item>,
    pub current: usize,
    pub choice_clicked: bool,
    /// Every (selector, position) clicked.
    pub clicks: Vec<(String, usize)>,
    pub probe_calls: usize,
    /// Lookups of the button list before "Next" becomes visible.
    pub hide_next_lookups: usize,
    pub extra_buttons: Vec<String>,
    /// Label of the advance button; "Next" when unset.
    pub next_label: Option<String>,
    pub navigations: Vec<String>,
    pub fills: Vec<(String, String)>,
    /// Identifiers whose login reaches the post-login page.
    pub good_identifiers: Vec<String>,
    /// All calls fail with a lost session once this item is reached.
    pub lose_session_at: Option<usize>,
}

pub struct ScriptedPage {
    pub state: Mutex<PageState>,
    network: Option<(Arc<SessionContext>, Arc<NetworkStrategy>)>,
}

impl ScriptedPage {
    pub fn new(items: Vec<Item>) -> Self {
        Self {
            state: Mutex::new(PageState {
                items,
                ..Default::default()
            }),
            network: None,
        }
    }

    /// Deliver network payloads into `ctx` the way the hook would.
    pub fn with_network(items: Vec<Item>, ctx: Arc<SessionContext>) -> Self {
        let strategy = Arc::new(NetworkStrategy::new("/api/lessons/get_next/").unwrap());
        let page = Self {
            state: Mutex::new(PageState {
                items,
                ..Default::default()
            }),
            network: Some((ctx, strategy)),
        };
        page.deliver_current();
        page
    }

    pub fn configure(&self, f: impl FnOnce(&mut PageState)) {
        f(&mut self.state.lock());
    }

    fn deliver_current(&self) {
        let Some((ctx, strategy)) = &self.network else {
            return;
        };
        let source = {
            let state = self.state.lock();
            state.items.get(state.current).map(|i| i.source.clone())
        };
        let payload = match source {
            Some(Source::Network(p)) => p,
            Some(Source::Both { network, .. }) => network,
            _ => return,
        };
        let body = json!({"data": {"fen": payload}}).to_string();
        strategy.observe(ctx, ENDPOINT, &body);
    }

    fn check_session(&self) -> Result<(), PageError> {
        let state = self.state.lock();
        match state.lose_session_at {
            Some(at) if state.current >= at => Err(PageError::SessionLost("socket closed".to_string())),
            _ => Ok(()),
        }
    }

    fn buttons(state: &mut PageState) -> Vec<String> {
        let mut buttons = Vec::new();
        if let Some(item) = state.items.get(state.current) {
            buttons.extend(item.choices.iter().cloned());
            if state.hide_next_lookups > 0 {
                state.hide_next_lookups -= 1;
            } else {
                buttons.push(Self::next_label(state));
            }
        }
        buttons.extend(state.extra_buttons.iter().cloned());
        buttons
    }

    fn next_label(state: &PageState) -> String {
        state.next_label.clone().unwrap_or_else(|| "Next".to_string())
    }

    pub fn clicks(&self) -> Vec<(String, usize)> {
        self.state.lock().clicks.clone()
    }

    pub fn probe_calls(&self) -> usize {
        self.state.lock().probe_calls
    }

    pub fn current(&self) -> usize {
        self.state.lock().current
    }
}

#[async_trait]
impl LivePage for ScriptedPage {
    async fn wait_for_selector(&self, selector: &str, _timeout: Duration) -> Result<(), PageError> {
        self.check_session()?;
        let state = self.state.lock();
        if selector != READY {
            return Ok(());
        }
        match state.items.get(state.current) {
            Some(item) if item.ready => Ok(()),
            _ => Err(PageError::Timeout(format!("Waiting for selector '{}' timed out", selector))),
        }
    }

    async fn evaluate(&self, _expression: &str) -> Result<Value, PageError> {
        self.check_session()?;
        let mut state = self.state.lock();
        state.probe_calls += 1;
        let found = match state.items.get(state.current).map(|i| &i.source) {
            Some(Source::Probe(p)) => Some(p.clone()),
            Some(Source::Both { probe, .. }) => Some(probe.clone()),
            _ => None,
        };
        Ok(found.map(Value::String).unwrap_or(Value::Null))
    }

    async fn element_texts(&self, selector: &str) -> Result<Vec<String>, PageError> {
        self.check_session()?;
        let mut state = self.state.lock();
        if selector == BUTTONS {
            return Ok(Self::buttons(&mut state));
        }
        if state.choice_clicked {
            if let Some(item) = state.items.get(state.current) {
                if selector.contains("correct") {
                    return Ok(item.marked.clone());
                }
            }
        }
        Ok(Vec::new())
    }

    async fn click_nth(&self, selector: &str, nth: usize) -> Result<(), PageError> {
        self.check_session()?;
        let advanced = {
            let mut state = self.state.lock();
            state.clicks.push((selector.to_string(), nth));
            if selector != BUTTONS {
                return Err(PageError::NotFound(format!("{} [{}]", selector, nth)));
            }
            // Clicking does not consume a hidden "Next" lookup.
            let hidden = state.hide_next_lookups;
            let buttons = Self::buttons(&mut state);
            state.hide_next_lookups = hidden;
            let text = buttons
                .get(nth)
                .cloned()
                .ok_or_else(|| PageError::NotFound(format!("{} [{}]", selector, nth)))?;
            if text == Self::next_label(&state) {
                state.current += 1;
                state.choice_clicked = false;
                true
            } else {
                let is_choice = state
                    .items
                    .get(state.current)
                    .is_some_and(|i| i.choices.contains(&text));
                if is_choice {
                    state.choice_clicked = true;
                }
                false
            }
        };
        if advanced {
            self.deliver_current();
        }
        Ok(())
    }

    async fn body_text(&self) -> Result<String, PageError> {
        self.check_session()?;
        let state = self.state.lock();
        Ok(match state.items.get(state.current) {
            Some(item) if state.choice_clicked => item.verdict.clone(),
            _ => String::new(),
        })
    }

    async fn navigate(&self, url: &str, _timeout: Duration) -> Result<(), PageError> {
        self.check_session()?;
        self.state.lock().navigations.push(url.to_string());
        Ok(())
    }

    async fn fill(&self, selector: &str, value: &str) -> Result<(), PageError> {
        self.check_session()?;
        self.state
            .lock()
            .fills
            .push((selector.to_string(), value.to_string()));
        Ok(())
    }

    async fn wait_for_url(&self, fragment: &str, _timeout: Duration) -> Result<String, PageError> {
        self.check_session()?;
        let state = self.state.lock();
        let last_identifier = state
            .fills
            .iter()
            .rev()
            .find(|(selector, _)| selector.contains("email"))
            .map(|(_, value)| value.clone());
        match last_identifier {
            Some(id) if state.good_identifiers.contains(&id) => {
                Ok(format!("https://site.test{}", fragment))
            }
            _ => Err(PageError::Timeout(format!("URL containing '{}'", fragment))),
        }
    }

    async fn screenshot_png(&self) -> Result<Vec<u8>, PageError> {
        self.check_session()?;
        Ok(vec![0x89, b'P', b'N', b'G'])
    }
}
