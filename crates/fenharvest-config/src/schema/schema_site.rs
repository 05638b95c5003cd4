//! Site navigation and login parameters.

use serde::{Deserialize, Serialize};

/// Where the harvest happens and how to get there after login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    #[serde(default = "default_login_url")]
    pub login_url: String,

    /// Pages visited in order after login; the last one holds the start control.
    #[serde(default = "default_start_urls")]
    pub start_urls: Vec<String>,

    /// Case-insensitive text fragments identifying the start control.
    #[serde(default = "default_start_button_texts")]
    pub start_button_texts: Vec<String>,

    /// Login counts as successful once the URL contains this.
    #[serde(default = "default_post_login_url_fragment")]
    pub post_login_url_fragment: String,

    #[serde(default = "default_login_wait_secs")]
    pub login_wait_secs: u64,

    #[serde(default = "default_navigation_timeout_secs")]
    pub navigation_timeout_secs: u64,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            login_url: default_login_url(),
            start_urls: default_start_urls(),
            start_button_texts: default_start_button_texts(),
            post_login_url_fragment: default_post_login_url_fragment(),
            login_wait_secs: default_login_wait_secs(),
            navigation_timeout_secs: default_navigation_timeout_secs(),
        }
    }
}

fn default_login_url() -> String {
    "https://aimchess.com/auth/login".to_string()
}

fn default_start_urls() -> Vec<String> {
    vec![
        "https://aimchess.com/training".to_string(),
        "https://aimchess.com/training/4/description".to_string(),
    ]
}

fn default_start_button_texts() -> Vec<String> {
    vec!["start".to_string()]
}

fn default_post_login_url_fragment() -> String {
    "/home".to_string()
}

fn default_login_wait_secs() -> u64 {
    30
}

fn default_navigation_timeout_secs() -> u64 {
    60
}

/// Login form selectors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginConfig {
    #[serde(default = "default_identifier_selector")]
    pub identifier_selector: String,

    #[serde(default = "default_secret_selector")]
    pub secret_selector: String,

    #[serde(default = "default_submit_selector")]
    pub submit_selector: String,

    /// Fallback: any enabled button whose text contains one of these.
    #[serde(default = "default_submit_texts")]
    pub submit_texts: Vec<String>,

    #[serde(default = "default_field_timeout_ms")]
    pub field_timeout_ms: u64,
}

impl Default for LoginConfig {
    fn default() -> Self {
        Self {
            identifier_selector: default_identifier_selector(),
            secret_selector: default_secret_selector(),
            submit_selector: default_submit_selector(),
            submit_texts: default_submit_texts(),
            field_timeout_ms: default_field_timeout_ms(),
        }
    }
}

fn default_identifier_selector() -> String {
    r#"input[type="email"], input[name*="email" i], input[placeholder*="email" i], input[type="text"]"#
        .to_string()
}

fn default_secret_selector() -> String {
    r#"input[type="password"], input[name*="password" i]"#.to_string()
}

fn default_submit_selector() -> String {
    r#"button[type="submit"]:not([disabled])"#.to_string()
}

fn default_submit_texts() -> Vec<String> {
    vec!["sign in".to_string()]
}

fn default_field_timeout_ms() -> u64 {
    10_000
}
