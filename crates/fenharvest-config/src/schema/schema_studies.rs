//! Study collector configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Paginated link collector settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudiesConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Listing path; pages are requested as `{list_path}?page=N`.
    #[serde(default = "default_list_path")]
    pub list_path: String,

    /// Regex an anchor's `href` must match in full.
    #[serde(default = "default_link_pattern")]
    pub link_pattern: String,

    #[serde(default = "default_max_studies")]
    pub max_studies: usize,

    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    #[serde(default = "default_page_delay_ms")]
    pub page_delay_ms: u64,

    #[serde(default = "default_download_delay_ms")]
    pub download_delay_ms: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for StudiesConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            list_path: default_list_path(),
            link_pattern: default_link_pattern(),
            max_studies: default_max_studies(),
            output_dir: default_output_dir(),
            page_delay_ms: default_page_delay_ms(),
            download_delay_ms: default_download_delay_ms(),
            user_agent: default_user_agent(),
        }
    }
}

impl StudiesConfig {
    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }

    pub fn download_delay(&self) -> Duration {
        Duration::from_millis(self.download_delay_ms)
    }
}

fn default_base_url() -> String {
    "https://lichess.org".to_string()
}

fn default_list_path() -> String {
    "/study".to_string()
}

fn default_link_pattern() -> String {
    "^/study/[a-zA-Z0-9]+$".to_string()
}

fn default_max_studies() -> usize {
    100
}

fn default_output_dir() -> String {
    "lichess_studies".to_string()
}

fn default_page_delay_ms() -> u64 {
    1_000
}

fn default_download_delay_ms() -> u64 {
    2_000
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36"
        .to_string()
}
