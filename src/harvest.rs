//! Harvest run: browser bootstrap, login, start sequence and the session loop.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use fenharvest_browser::{BrowserManager, BrowserManagerConfig};
use fenharvest_config::{Config, ConfigLoader};
use fenharvest_core::{
    HarvestError, LivePage, LoginFlow, LoginOutcome, NetworkInterceptor, NetworkStrategy,
    ResponseSource, SessionContext, SessionController, StopReason,
};
use fenharvest_store::RecordStore;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

fn manager_config(config: &Config) -> BrowserManagerConfig {
    BrowserManagerConfig {
        debug_port: config.browser.debug_port,
        viewport_width: config.browser.viewport_width,
        viewport_height: config.browser.viewport_height,
        profile_dir: config
            .browser
            .profile_dir
            .as_ref()
            .map(|dir| PathBuf::from(ConfigLoader::expand_path(&dir.to_string_lossy()))),
        headless: config.browser.headless,
        request_timeout: Duration::from_secs(config.browser.request_timeout_secs),
    }
}

/// Cancel `token` on the first Ctrl-C.
fn cancel_on_interrupt(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, stopping after the current iteration");
            token.cancel();
        }
    });
}

pub(crate) async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let browser = BrowserManager::new(manager_config(&config));
    browser.connect().await?;

    let result = harvest(&browser, &config).await;

    if let Err(e) = browser.shutdown().await {
        warn!("Browser shutdown failed: {}", e);
    }
    result.map_err(Into::into)
}

async fn harvest(browser: &BrowserManager, config: &Config) -> Result<(), HarvestError> {
    let session = browser
        .open_page()
        .await
        .map_err(|e| HarvestError::SessionLost(e.to_string()))?;

    let ctx = Arc::new(SessionContext::new());
    let strategy = Arc::new(NetworkStrategy::new(&config.harvest.endpoint_pattern)?);

    // Attach the hook before any navigation so the first payload is observed.
    let interceptor = match session.take_network_events() {
        Some(events) => {
            let source: Arc<dyn ResponseSource> = session.clone();
            Some(NetworkInterceptor::new(strategy, ctx.clone()).spawn(events, source))
        }
        None => {
            warn!("Network events unavailable, relying on page probes");
            None
        }
    };

    let page: Arc<dyn LivePage> = session;

    let accounts = config.resolved_accounts();
    let login = LoginFlow::new(config.site.clone(), config.login.clone(), accounts);
    match login.login(page.as_ref()).await? {
        LoginOutcome::LoggedIn(identifier) => info!("Logged in as {}", identifier),
        LoginOutcome::Unverified => warn!("Login not confirmed, continuing on existing session"),
        LoginOutcome::Skipped => warn!("No accounts configured, skipping login"),
    }
    login.start(page.as_ref()).await?;

    let cancel = CancellationToken::new();
    cancel_on_interrupt(cancel.clone());

    let store = RecordStore::new(ConfigLoader::expand_path(&config.harvest.output));
    let mut controller = SessionController::new(page, ctx, store, &config.harvest, cancel);
    let result = controller.run().await;

    if let Some(task) = interceptor {
        task.abort();
    }

    match result {
        Ok(summary) => {
            info!(
                confirmed = summary.confirmed,
                iterations = summary.iterations,
                failed = summary.failed_iterations,
                ceiling_resets = summary.ceiling_resets,
                captured = summary.captured_responses,
                "Run finished"
            );
            if summary.stop != StopReason::TargetReached {
                warn!("Stopped before target: {:?}", summary.stop);
            }
            info!("Saved {} positions to {}", summary.confirmed, config.harvest.output);
            Ok(())
        }
        Err(e) => {
            error!(
                "Run ended with {} positions saved to {}: {}",
                controller.store().len(),
                config.harvest.output,
                e
            );
            Err(e)
        }
    }
}
