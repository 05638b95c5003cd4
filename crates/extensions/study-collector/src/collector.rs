//! Listing walker and downloader.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use fenharvest_config::{ConfigLoader, StudiesConfig};
use regex::Regex;
use reqwest::Client;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::CollectorError;
use crate::links::extract_links;

const LIST_TIMEOUT: Duration = Duration::from_secs(10);
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(15);

/// Outcome of a download pass.
#[derive(Debug, Default)]
pub struct DownloadSummary {
    pub saved: Vec<PathBuf>,
    pub failed: Vec<(Url, String)>,
}

/// Collects study links and downloads their PGN exports.
pub struct StudyCollector {
    client: Client,
    base: Url,
    list_path: String,
    link_pattern: Regex,
    max_studies: usize,
    output_dir: PathBuf,
    page_delay: Duration,
    download_delay: Duration,
}

impl StudyCollector {
    pub fn new(config: &StudiesConfig) -> Result<Self, CollectorError> {
        let client = Client::builder().user_agent(&config.user_agent).build()?;
        Ok(Self {
            client,
            base: Url::parse(&config.base_url)?,
            list_path: config.list_path.clone(),
            link_pattern: Regex::new(&config.link_pattern)?,
            max_studies: config.max_studies,
            output_dir: PathBuf::from(ConfigLoader::expand_path(&config.output_dir)),
            page_delay: config.page_delay(),
            download_delay: config.download_delay(),
        })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Collect links, then download each one.
    pub async fn run(&self) -> Result<DownloadSummary, CollectorError> {
        let links = self.collect_links().await?;
        info!("Found {} studies, starting downloads", links.len());
        let summary = self.download_all(&links).await?;
        info!(
            saved = summary.saved.len(),
            failed = summary.failed.len(),
            output = ?self.output_dir,
            "Download complete"
        );
        Ok(summary)
    }

    /// Walk listing pages from 1 until one adds nothing new, a page fails,
    /// or `max_studies` links are known. Links are unique by exact URL.
    pub async fn collect_links(&self) -> Result<Vec<Url>, CollectorError> {
        let mut seen = HashSet::new();
        let mut links = Vec::new();
        let mut page = 1u32;

        while links.len() < self.max_studies {
            let mut list_url = self.base.join(&self.list_path)?;
            list_url.set_query(Some(&format!("page={}", page)));

            let html = match self.fetch_text(&list_url, LIST_TIMEOUT).await {
                Ok(html) => html,
                Err(e) => {
                    warn!(page, "Stopping at listing page: {}", e);
                    break;
                }
            };

            let mut added = 0;
            for href in extract_links(&html, &self.link_pattern) {
                let url = self.base.join(&href)?;
                if seen.insert(url.clone()) {
                    debug!("Found study {}: {}", links.len() + 1, url);
                    links.push(url);
                    added += 1;
                }
                if links.len() >= self.max_studies {
                    break;
                }
            }

            if added == 0 {
                info!(page, "No more studies");
                break;
            }

            page += 1;
            tokio::time::sleep(self.page_delay).await;
        }

        Ok(links)
    }

    /// Download `{link}.pgn` for each link. Individual failures are recorded,
    /// not returned.
    pub async fn download_all(&self, links: &[Url]) -> Result<DownloadSummary, CollectorError> {
        tokio::fs::create_dir_all(&self.output_dir).await?;
        let mut summary = DownloadSummary::default();

        for (i, link) in links.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.download_delay).await;
            }
            match self.download(link, i + 1).await {
                Ok(path) => {
                    info!(path = ?path, "Saved study");
                    summary.saved.push(path);
                }
                Err(e) => {
                    warn!(url = %link, "Download failed: {}", e);
                    summary.failed.push((link.clone(), e.to_string()));
                }
            }
        }

        Ok(summary)
    }

    async fn download(&self, link: &Url, index: usize) -> Result<PathBuf, CollectorError> {
        let id = study_id(link);
        let pgn_url = Url::parse(&format!("{}.pgn", link.as_str().trim_end_matches('/')))?;
        let body = self.fetch_text(&pgn_url, DOWNLOAD_TIMEOUT).await?;

        let path = self.output_dir.join(format!("{:03}_{}.pgn", index, id));
        tokio::fs::write(&path, body).await?;
        Ok(path)
    }

    async fn fetch_text(&self, url: &Url, timeout: Duration) -> Result<String, CollectorError> {
        let response = self.client.get(url.clone()).timeout(timeout).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CollectorError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response.text().await?)
    }
}

/// Last non-empty path segment.
fn study_id(link: &Url) -> String {
    link.path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).next_back())
        .unwrap_or("study")
        .to_string()
}
