//! fenharvest - browser-driven chess position harvester.
//!
//! Main entry point for the harvest loop and the study collector.

mod cli;
mod harvest;
mod studies;

use std::path::{Path, PathBuf};

use clap::Parser;
use fenharvest_config::{Config, ConfigLoader, ConfigValidator};
use tracing::{info, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use cli::{Cli, Commands};

/// Get the fenharvest home directory (~/.fenharvest).
fn fenharvest_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".fenharvest"))
        .unwrap_or_else(|| PathBuf::from(".fenharvest"))
}

/// Initialize tracing with console and file output.
///
/// Log files are written to ~/.fenharvest/logs/ with daily rotation.
fn init_tracing() -> Result<(), Box<dyn std::error::Error>> {
    let log_dir = fenharvest_dir().join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("fenharvest")
        .filename_suffix("log")
        .max_log_files(14)
        .build(&log_dir)?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // The guard flushes the file writer on drop; keep it for the whole run.
    static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
        std::sync::OnceLock::new();
    let _ = GUARD.set(guard);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true).with_ansi(true))
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    Ok(())
}

/// Load, override and validate the configuration.
fn load_config(path: &Path, cli: &Cli) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = ConfigLoader::load_or_default(path)?;
    cli.harvest.apply(&mut config);

    let warnings = ConfigValidator::validate(&config).into_result()?;
    for warning in warnings {
        warn!("Config {}: {}", warning.path, warning.message);
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing()?;

    let cli = Cli::parse();
    info!("Using configuration {}", cli.config.display());
    let config = load_config(&cli.config, &cli)?;

    match cli.command {
        None | Some(Commands::Harvest) => harvest::run(config).await,
        Some(Commands::Studies { max, output_dir }) => {
            let mut studies = config.studies;
            if let Some(max) = max {
                studies.max_studies = max;
            }
            if let Some(dir) = output_dir {
                studies.output_dir = dir;
            }
            studies::run(&studies).await
        }
    }
}
