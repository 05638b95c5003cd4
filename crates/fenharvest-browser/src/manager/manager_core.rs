//! Connect to, or launch, the browser and hand out pages.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::process::{Child, Command};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::{BrowserError, BrowserManagerConfig};
use crate::client::{CdpClient, probe_endpoint};
use crate::session::PageSession;

const STARTUP_WAIT: Duration = Duration::from_secs(6);
const STARTUP_POLL: Duration = Duration::from_millis(200);

/// Overrides the executable search.
pub const CHROME_ENV: &str = "FENHARVEST_CHROME";

#[cfg(target_os = "macos")]
const CANDIDATES: &[&str] = &[
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
    "/Applications/Chromium.app/Contents/MacOS/Chromium",
];
#[cfg(target_os = "linux")]
const CANDIDATES: &[&str] = &[
    "/usr/bin/google-chrome",
    "/usr/bin/google-chrome-stable",
    "/usr/bin/chromium",
    "/usr/bin/chromium-browser",
    "/snap/bin/chromium",
];
#[cfg(target_os = "windows")]
const CANDIDATES: &[&str] = &[
    r"C:\Program Files\Google\Chrome\Application\chrome.exe",
    r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
];
#[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
const CANDIDATES: &[&str] = &[];

/// Owns the CDP connection and, when it started one, the Chrome process.
pub struct BrowserManager {
    config: BrowserManagerConfig,
    client: RwLock<Option<Arc<CdpClient>>>,
    launched: Mutex<Option<Child>>,
}

impl BrowserManager {
    pub fn new(config: BrowserManagerConfig) -> Self {
        Self {
            config,
            client: RwLock::new(None),
            launched: Mutex::new(None),
        }
    }

    /// `$FENHARVEST_CHROME` if it exists, else the first installed candidate.
    pub fn find_chrome() -> Option<PathBuf> {
        std::env::var_os(CHROME_ENV)
            .map(PathBuf::from)
            .into_iter()
            .chain(CANDIDATES.iter().map(PathBuf::from))
            .find(|path| path.exists())
    }

    async fn listening(&self) -> bool {
        probe_endpoint(&self.config.endpoint()).await.is_ok()
    }

    async fn launch(&self) -> Result<(), BrowserError> {
        let chrome = Self::find_chrome().ok_or(BrowserError::NoChrome)?;
        let profile = self.config.profile_dir();
        if let Err(e) = std::fs::create_dir_all(&profile) {
            warn!("Cannot create profile dir {}: {}", profile.display(), e);
        }

        let child = Command::new(&chrome)
            .args(self.config.launch_args())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        info!(pid = ?child.id(), profile = %profile.display(), "Launched {}", chrome.display());
        *self.launched.lock() = Some(child);

        let deadline = tokio::time::Instant::now() + STARTUP_WAIT;
        while tokio::time::Instant::now() < deadline {
            tokio::time::sleep(STARTUP_POLL).await;
            if self.listening().await {
                return Ok(());
            }
        }
        Err(BrowserError::StartupTimeout {
            port: self.config.debug_port,
            waited: STARTUP_WAIT,
        })
    }

    /// Attach to the browser on the debug port, launching one if nothing listens.
    pub async fn connect(&self) -> Result<(), BrowserError> {
        if self.client.read().await.is_some() {
            return Ok(());
        }

        if self.listening().await {
            info!("Reusing browser on port {}", self.config.debug_port);
        } else {
            info!("No browser on port {}, launching one", self.config.debug_port);
            self.launch().await?;
        }

        let client = CdpClient::connect(&self.config.endpoint(), self.config.request_timeout).await?;
        *self.client.write().await = Some(Arc::new(client));
        debug!("CDP connected at {}", self.config.endpoint());
        Ok(())
    }

    /// Open a tab sized to the configured viewport.
    pub async fn open_page(&self) -> Result<Arc<PageSession>, BrowserError> {
        self.connect().await?;
        let client = self
            .client
            .read()
            .await
            .clone()
            .ok_or(BrowserError::NotConnected)?;

        let page = client.open_page().await?;
        page.set_viewport(self.config.viewport_width, self.config.viewport_height)
            .await?;
        Ok(Arc::new(page))
    }

    /// Drop the connection; a browser we did not launch keeps running.
    pub async fn close(&self) -> Result<(), BrowserError> {
        if self.client.write().await.take().is_some() {
            info!("Browser connection closed");
        }
        Ok(())
    }

    /// Close, then kill Chrome if this manager launched it.
    pub async fn shutdown(&self) -> Result<(), BrowserError> {
        self.close().await?;
        let child = self.launched.lock().take();
        if let Some(mut child) = child {
            info!("Stopping launched browser");
            if let Err(e) = child.kill().await {
                warn!("Could not stop browser: {}", e);
            }
        }
        Ok(())
    }
}
