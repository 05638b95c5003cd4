//! CLI definitions for fenharvest.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use fenharvest_config::Config;

/// fenharvest CLI.
#[derive(Parser)]
#[command(name = "fenharvest")]
#[command(about = "Browser-driven chess position harvester")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml", global = true)]
    pub config: PathBuf,

    #[command(flatten)]
    pub harvest: HarvestArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Harvest positions through the browser (default)
    Harvest,

    /// Download study PGNs from the configured listing
    Studies {
        /// Stop after this many studies
        #[arg(long)]
        max: Option<usize>,

        /// Directory for downloaded PGN files
        #[arg(long)]
        output_dir: Option<String>,
    },
}

/// Overrides for the `[harvest]` and `[browser]` sections.
#[derive(Args, Default)]
pub(crate) struct HarvestArgs {
    /// Number of confirmed records to collect
    #[arg(long, global = true)]
    pub target: Option<usize>,

    /// Consecutive failures tolerated before the counter is reset
    #[arg(long, global = true)]
    pub ceiling: Option<u32>,

    /// Output CSV path
    #[arg(short, long, global = true)]
    pub output: Option<String>,

    /// Run Chrome headless
    #[arg(long, global = true)]
    pub headless: bool,
}

impl HarvestArgs {
    pub fn apply(&self, config: &mut Config) {
        if let Some(target) = self.target {
            config.harvest.target_count = target;
        }
        if let Some(ceiling) = self.ceiling {
            config.harvest.failure_ceiling = ceiling;
        }
        if let Some(output) = &self.output {
            config.harvest.output = output.clone();
        }
        if self.headless {
            config.browser.headless = true;
        }
    }
}
