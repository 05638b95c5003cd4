//! Manager configuration and errors.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::error::CdpError;

#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("No Chrome or Chromium executable found (set FENHARVEST_CHROME)")]
    NoChrome,

    #[error("Could not start Chrome: {0}")]
    Launch(#[from] std::io::Error),

    #[error("Chrome did not open port {port} within {waited:?}")]
    StartupTimeout { port: u16, waited: Duration },

    #[error("Browser not connected")]
    NotConnected,

    #[error(transparent)]
    Cdp(#[from] CdpError),
}

#[derive(Debug, Clone)]
pub struct BrowserManagerConfig {
    /// Remote debugging port, reused if something already listens there.
    pub debug_port: u16,
    pub viewport_width: u32,
    pub viewport_height: u32,
    /// Persistent profile; keeps the site's login cookies between runs.
    pub profile_dir: Option<PathBuf>,
    pub headless: bool,
    /// Upper bound for a single CDP command.
    pub request_timeout: Duration,
}

impl Default for BrowserManagerConfig {
    fn default() -> Self {
        Self {
            debug_port: 9222,
            viewport_width: 1920,
            viewport_height: 1080,
            profile_dir: None,
            headless: false,
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl BrowserManagerConfig {
    /// Configured profile, or `~/.fenharvest/browser-profile`.
    pub fn profile_dir(&self) -> PathBuf {
        match &self.profile_dir {
            Some(dir) => dir.clone(),
            None => dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".fenharvest")
                .join("browser-profile"),
        }
    }

    pub fn endpoint(&self) -> String {
        format!("http://localhost:{}", self.debug_port)
    }

    /// Command line for a Chrome we launch ourselves.
    pub fn launch_args(&self) -> Vec<String> {
        let mut args = vec![
            format!("--remote-debugging-port={}", self.debug_port),
            format!("--user-data-dir={}", self.profile_dir().display()),
            format!("--window-size={},{}", self.viewport_width, self.viewport_height),
            "--no-first-run".to_string(),
            "--no-default-browser-check".to_string(),
            "--disable-sync".to_string(),
        ];
        if self.headless {
            args.push("--headless=new".to_string());
        }
        args
    }
}
