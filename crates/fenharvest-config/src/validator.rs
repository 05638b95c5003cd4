//! Semantic checks that TOML deserialization cannot express.

use regex::Regex;
use url::Url;

use crate::error::ConfigError;
use crate::schema::Config;

/// One problem, located by its dotted key path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub path: String,
    pub message: String,
}

/// Errors block the run; warnings are logged and ignored.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<Finding>,
    pub warnings: Vec<Finding>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(Finding {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(Finding {
            path: path.into(),
            message: message.into(),
        });
    }

    fn require(&mut self, ok: bool, path: &str, message: &str) {
        if !ok {
            self.error(path, message);
        }
    }

    fn url(&mut self, path: &str, value: &str) {
        let web = Url::parse(value)
            .map(|u| matches!(u.scheme(), "http" | "https"))
            .unwrap_or(false);
        self.require(web, path, "must be an absolute http(s) URL");
    }

    fn pattern(&mut self, path: &str, value: &str) {
        if let Err(e) = Regex::new(value) {
            self.error(path, format!("invalid regex: {}", e));
        }
    }

    /// The first error, or the warnings when there is none.
    pub fn into_result(self) -> Result<Vec<Finding>, ConfigError> {
        match self.errors.into_iter().next() {
            Some(first) => Err(ConfigError::InvalidValue {
                field: first.path,
                message: first.message,
            }),
            None => Ok(self.warnings),
        }
    }
}

pub struct ConfigValidator;

impl ConfigValidator {
    pub fn validate(config: &Config) -> ValidationResult {
        let mut result = ValidationResult::default();

        let browser = &config.browser;
        result.require(browser.debug_port != 0, "browser.debug_port", "must not be 0");
        result.require(
            browser.viewport_width > 0 && browser.viewport_height > 0,
            "browser.viewport",
            "width and height must be at least 1",
        );

        result.url("site.login_url", &config.site.login_url);
        for (i, url) in config.site.start_urls.iter().enumerate() {
            result.url(&format!("site.start_urls[{}]", i), url);
        }

        for (i, account) in config.accounts.iter().enumerate() {
            if account.identifier.trim().is_empty() {
                result.error(format!("accounts[{}].identifier", i), "must not be empty");
            }
        }
        if config.resolved_accounts().is_empty() {
            result.warn("accounts", "none configured or in the environment; login is skipped");
        }

        Self::harvest(config, &mut result);

        result.url("studies.base_url", &config.studies.base_url);
        result.pattern("studies.link_pattern", &config.studies.link_pattern);

        result
    }

    fn harvest(config: &Config, result: &mut ValidationResult) {
        let harvest = &config.harvest;
        result.require(harvest.target_count > 0, "harvest.target_count", "must be at least 1");
        result.require(harvest.failure_ceiling > 0, "harvest.failure_ceiling", "must be at least 1");
        result.require(!harvest.output.trim().is_empty(), "harvest.output", "must not be empty");
        result.pattern("harvest.endpoint_pattern", &harvest.endpoint_pattern);
        result.require(
            !harvest.readiness_selector.trim().is_empty(),
            "harvest.readiness_selector",
            "must not be empty",
        );
        result.require(harvest.advance.attempts > 0, "harvest.advance.attempts", "must be at least 1");
        result.require(
            !(harvest.advance.texts.is_empty() && harvest.advance.selectors.is_empty()),
            "harvest.advance",
            "needs texts or selectors",
        );

        if harvest.target_count > 100_000 {
            result.warn(
                "harvest.target_count",
                "above 100000; every flush rewrites the whole file",
            );
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
