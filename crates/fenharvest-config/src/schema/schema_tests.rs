use super::*;

#[test]
fn test_config_default() {
    let config = Config::default();
    assert_eq!(config.browser.debug_port, 9222);
    assert_eq!(config.harvest.target_count, 500);
    assert_eq!(config.harvest.failure_ceiling, 5);
    assert!(config.accounts.is_empty());
}

#[test]
fn test_browser_config_default() {
    let browser = BrowserConfig::default();
    assert_eq!(browser.viewport_width, 1920);
    assert_eq!(browser.viewport_height, 1080);
    assert!(!browser.headless);
    assert!(browser.profile_dir.is_none());
}

#[test]
fn test_harvest_durations() {
    let harvest = HarvestConfig::default();
    assert_eq!(harvest.readiness_timeout().as_millis(), 10_000);
    assert_eq!(harvest.settle().as_millis(), 2_000);
    assert_eq!(harvest.action_settle().as_millis(), 2_000);
    assert_eq!(harvest.failure_backoff().as_millis(), 2_000);
}

#[test]
fn test_advance_config_default() {
    let advance = AdvanceConfig::default();
    assert_eq!(advance.attempts, 2);
    assert_eq!(advance.backoff().as_millis(), 2_000);
    assert_eq!(advance.texts, vec!["next".to_string()]);
    assert_eq!(advance.selectors.len(), 1);
}

#[test]
fn test_site_config_default() {
    let site = SiteConfig::default();
    assert!(site.login_url.starts_with("https://"));
    assert_eq!(site.start_urls.len(), 2);
    assert_eq!(site.post_login_url_fragment, "/home");
}

#[test]
fn test_studies_config_default() {
    let studies = StudiesConfig::default();
    assert_eq!(studies.base_url, "https://lichess.org");
    assert_eq!(studies.max_studies, 100);
    assert_eq!(studies.page_delay().as_millis(), 1_000);
}

#[test]
fn test_account_debug_redacts_secret() {
    let account = AccountConfig::new("me@example.com", "hunter2");
    let debug = format!("{:?}", account);
    assert!(debug.contains("me@example.com"));
    assert!(!debug.contains("hunter2"));
}

#[test]
fn test_config_serialization() {
    let config = Config::default();
    let json = serde_json::to_string(&config).unwrap();
    assert!(json.contains("get_next"));
    assert!(json.contains("9222"));
}

#[test]
fn test_resolved_accounts_prefers_configured() {
    let mut config = Config::default();
    config.accounts.push(AccountConfig::new("a@example.com", "one"));
    let accounts = config.resolved_accounts();
    assert_eq!(accounts.len(), 1);
    assert_eq!(accounts[0].identifier, "a@example.com");
}
