//! Login bootstrap and the start sequence.
//!
//! Leaves the page where the first readiness wait can succeed. Failures
//! here are logged and tolerated, since a persistent browser profile may
//! already hold a session; only a lost browser session is an error.

use std::path::PathBuf;
use std::time::Duration;

use fenharvest_config::{AccountConfig, LoginConfig, SiteConfig};
use tracing::{debug, info, warn};

use crate::error::{HarvestError, PageError};
use crate::page::{BUTTONS, LivePage, find_button_containing};

/// Fixed pause after each navigation and click in this module.
const STEP_SETTLE: Duration = Duration::from_secs(2);

/// How the login attempt ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// Logged in as the given identifier.
    LoggedIn(String),
    /// Every account failed; continuing on the existing session.
    Unverified,
    /// No accounts configured.
    Skipped,
}

/// Login with account rotation, then the start sequence.
pub struct LoginFlow {
    site: SiteConfig,
    login: LoginConfig,
    accounts: Vec<AccountConfig>,
    screenshot_path: PathBuf,
    settle: Duration,
}

impl LoginFlow {
    pub fn new(site: SiteConfig, login: LoginConfig, accounts: Vec<AccountConfig>) -> Self {
        Self {
            site,
            login,
            accounts,
            screenshot_path: PathBuf::from("login_failed_debug.png"),
            settle: STEP_SETTLE,
        }
    }

    /// Where the screenshot of a failed attempt is written.
    pub fn with_screenshot_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.screenshot_path = path.into();
        self
    }

    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    /// Try each account in order until one reaches the post-login URL.
    pub async fn login(&self, page: &dyn LivePage) -> Result<LoginOutcome, HarvestError> {
        if self.accounts.is_empty() {
            warn!("No accounts configured; skipping login");
            return Ok(LoginOutcome::Skipped);
        }

        for (i, account) in self.accounts.iter().enumerate() {
            if i > 0 {
                info!(identifier = %account.identifier, "Switching account");
            }
            match self.attempt(page, account).await {
                Ok(url) => {
                    info!(identifier = %account.identifier, url = %url, "Logged in");
                    return Ok(LoginOutcome::LoggedIn(account.identifier.clone()));
                }
                Err(e) if e.is_fatal() => return Err(fatal(e)),
                Err(e) => {
                    warn!(identifier = %account.identifier, "Login attempt failed: {}", e);
                    self.save_screenshot(page).await;
                }
            }
        }

        warn!("All accounts failed to log in; continuing with the current session");
        Ok(LoginOutcome::Unverified)
    }

    async fn attempt(&self, page: &dyn LivePage, account: &AccountConfig) -> Result<String, PageError> {
        page.navigate(&self.site.login_url, self.navigation_timeout()).await?;
        tokio::time::sleep(self.settle).await;

        let field_timeout = Duration::from_millis(self.login.field_timeout_ms);
        page.wait_for_selector(&self.login.identifier_selector, field_timeout)
            .await?;
        page.fill(&self.login.identifier_selector, &account.identifier)
            .await?;
        page.fill(&self.login.secret_selector, &account.secret).await?;

        self.submit(page).await?;

        page.wait_for_url(
            &self.site.post_login_url_fragment,
            Duration::from_secs(self.site.login_wait_secs),
        )
        .await
    }

    /// Submit selector first, then any button whose text contains a submit text.
    async fn submit(&self, page: &dyn LivePage) -> Result<(), PageError> {
        match page.click_nth(&self.login.submit_selector, 0).await {
            Ok(()) => return Ok(()),
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => debug!("Submit selector failed, matching by text: {}", e),
        }
        click_button_containing(page, &self.login.submit_texts).await
    }

    async fn save_screenshot(&self, page: &dyn LivePage) {
        let bytes = match page.screenshot_png().await {
            Ok(bytes) => bytes,
            Err(e) => {
                debug!("Screenshot failed: {}", e);
                return;
            }
        };
        match tokio::fs::write(&self.screenshot_path, bytes).await {
            Ok(()) => info!(path = ?self.screenshot_path, "Saved login debug screenshot"),
            Err(e) => warn!(path = ?self.screenshot_path, "Could not save screenshot: {}", e),
        }
    }

    /// Visit each start URL, then click the start control on the last one.
    pub async fn start(&self, page: &dyn LivePage) -> Result<(), HarvestError> {
        for url in &self.site.start_urls {
            match page.navigate(url, self.navigation_timeout()).await {
                Ok(()) => debug!(url = %url, "Visited start page"),
                Err(e) if e.is_fatal() => return Err(fatal(e)),
                Err(e) => warn!(url = %url, "Start page navigation failed: {}", e),
            }
            tokio::time::sleep(self.settle).await;
        }

        match click_button_containing(page, &self.site.start_button_texts).await {
            Ok(()) => info!("Started session"),
            Err(e) if e.is_fatal() => return Err(fatal(e)),
            Err(e) => warn!("Start control not clicked: {}", e),
        }
        tokio::time::sleep(self.settle).await;
        Ok(())
    }

    fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.site.navigation_timeout_secs)
    }
}

async fn click_button_containing(page: &dyn LivePage, texts: &[String]) -> Result<(), PageError> {
    let position = find_button_containing(page, texts)
        .await?
        .ok_or_else(|| PageError::NotFound(format!("button containing {:?}", texts)))?;
    page.click_nth(BUTTONS, position).await
}

fn fatal(e: PageError) -> HarvestError {
    HarvestError::from_fatal(&e).unwrap_or_else(|| HarvestError::Login(e.to_string()))
}
