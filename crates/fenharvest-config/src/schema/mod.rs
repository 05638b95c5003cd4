//! Configuration schema definitions.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

mod schema_harvest;
mod schema_site;
mod schema_studies;

pub use schema_harvest::*;
pub use schema_site::*;
pub use schema_studies::*;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub browser: BrowserConfig,

    #[serde(default)]
    pub site: SiteConfig,

    #[serde(default)]
    pub login: LoginConfig,

    /// Accounts tried in order until one logs in.
    #[serde(default)]
    pub accounts: Vec<AccountConfig>,

    #[serde(default)]
    pub harvest: HarvestConfig,

    #[serde(default)]
    pub studies: StudiesConfig,
}

/// Environment variables consulted when no `[[accounts]]` are configured.
pub const IDENTIFIER_ENV: &str = "FENHARVEST_IDENTIFIER";
pub const SECRET_ENV: &str = "FENHARVEST_SECRET";

impl Config {
    /// Configured accounts, or a single account from the environment.
    pub fn resolved_accounts(&self) -> Vec<AccountConfig> {
        if !self.accounts.is_empty() {
            return self.accounts.clone();
        }
        match (std::env::var(IDENTIFIER_ENV), std::env::var(SECRET_ENV)) {
            (Ok(identifier), Ok(secret)) if !identifier.is_empty() => {
                vec![AccountConfig::new(identifier, secret)]
            }
            _ => Vec::new(),
        }
    }
}

/// Browser configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    #[serde(default = "default_debug_port")]
    pub debug_port: u16,

    #[serde(default)]
    pub headless: bool,

    /// Persistent profile directory; `~` is expanded.
    #[serde(default)]
    pub profile_dir: Option<PathBuf>,

    #[serde(default = "default_viewport_width")]
    pub viewport_width: u32,

    #[serde(default = "default_viewport_height")]
    pub viewport_height: u32,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            debug_port: default_debug_port(),
            headless: false,
            profile_dir: None,
            viewport_width: default_viewport_width(),
            viewport_height: default_viewport_height(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn default_debug_port() -> u16 {
    9222
}

fn default_viewport_width() -> u32 {
    1920
}

fn default_viewport_height() -> u32 {
    1080
}

fn default_request_timeout() -> u64 {
    30
}

/// One (identifier, secret) pair for the login collaborator.
#[derive(Clone, Serialize, Deserialize)]
pub struct AccountConfig {
    pub identifier: String,
    pub secret: String,
}

impl AccountConfig {
    pub fn new(identifier: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            secret: secret.into(),
        }
    }
}

impl fmt::Debug for AccountConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountConfig")
            .field("identifier", &self.identifier)
            .field("secret", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;
