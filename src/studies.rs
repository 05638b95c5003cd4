//! `fenharvest studies`: PGN download from a study listing.

use fenharvest_config::StudiesConfig;
use fenharvest_study_collector::StudyCollector;
use tracing::{info, warn};

pub(crate) async fn run(config: &StudiesConfig) -> Result<(), Box<dyn std::error::Error>> {
    let collector = StudyCollector::new(config)?;
    info!(
        "Collecting up to {} studies from {}{}",
        config.max_studies, config.base_url, config.list_path
    );

    let summary = collector.run().await?;
    for (url, reason) in &summary.failed {
        warn!("Not saved: {} ({})", url, reason);
    }
    info!(
        "Saved {} PGN files to {}",
        summary.saved.len(),
        collector.output_dir().display()
    );
    Ok(())
}
