//! TOML loading with `${VAR}` substitution.

use std::io::ErrorKind;
use std::path::Path;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::error::ConfigError;
use crate::schema::Config;

static ENV_REF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("valid env reference pattern"));

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| match source.kind() {
            ErrorKind::NotFound => ConfigError::NotFound(path.to_path_buf()),
            _ => ConfigError::Read {
                path: path.to_path_buf(),
                source,
            },
        })?;
        Self::load_str(&content)
    }

    /// Like [`load`](Self::load), but a missing file yields the defaults.
    pub fn load_or_default(path: &Path) -> Result<Config, ConfigError> {
        match Self::load(path) {
            Err(ConfigError::NotFound(_)) => Ok(Config::default()),
            other => other,
        }
    }

    pub fn load_str(content: &str) -> Result<Config, ConfigError> {
        Ok(toml::from_str(&Self::expand_env_vars(content)?)?)
    }

    /// Replace `${VAR}` with the variable's value. Comment lines are left
    /// alone so commented-out examples need no environment.
    fn expand_env_vars(content: &str) -> Result<String, ConfigError> {
        let mut out = String::with_capacity(content.len());
        for line in content.split_inclusive('\n') {
            if line.trim_start().starts_with('#') {
                out.push_str(line);
                continue;
            }

            let mut missing = None;
            let expanded = ENV_REF.replace_all(line, |caps: &Captures| {
                std::env::var(&caps[1]).unwrap_or_else(|_| {
                    missing.get_or_insert_with(|| caps[1].to_string());
                    String::new()
                })
            });
            if let Some(var) = missing {
                return Err(ConfigError::MissingEnv(var));
            }
            out.push_str(&expanded);
        }
        Ok(out)
    }

    /// Expand a leading `~`.
    pub fn expand_path(path: &str) -> String {
        shellexpand::tilde(path).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_input_is_all_defaults() {
        let config = ConfigLoader::load_str("").unwrap();
        assert_eq!(config.harvest.target_count, 500);
        assert_eq!(config.harvest.failure_ceiling, 5);
        assert_eq!(config.studies.max_studies, 100);
    }

    #[test]
    fn test_partial_harvest_section() {
        let config = ConfigLoader::load_str(
            r#"
            [harvest]
            target_count = 300
            output = "out.csv"
            endpoint_pattern = "/api/puzzles/next"
            "#,
        )
        .unwrap();
        assert_eq!(config.harvest.target_count, 300);
        assert_eq!(config.harvest.output, "out.csv");
        assert_eq!(config.harvest.endpoint_pattern, "/api/puzzles/next");
        assert_eq!(config.harvest.failure_ceiling, 5);
        assert_eq!(config.harvest.readiness_selector, "svg");
    }

    #[test]
    fn test_advance_policy() {
        let config = ConfigLoader::load_str(
            r#"
            [harvest.advance]
            texts = ["Continue"]
            attempts = 3
            backoff_ms = 500
            "#,
        )
        .unwrap();
        let advance = &config.harvest.advance;
        assert_eq!(advance.texts, vec!["Continue".to_string()]);
        assert_eq!(advance.attempts, 3);
        assert_eq!(advance.backoff().as_millis(), 500);
        assert!(!advance.selectors.is_empty());
    }

    #[test]
    fn test_accounts_keep_order() {
        let config = ConfigLoader::load_str(
            r#"
            [[accounts]]
            identifier = "a@example.com"
            secret = "one"

            [[accounts]]
            identifier = "b@example.com"
            secret = "two"
            "#,
        )
        .unwrap();
        let ids: Vec<_> = config.accounts.iter().map(|a| a.identifier.as_str()).collect();
        assert_eq!(ids, ["a@example.com", "b@example.com"]);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[browser]\ndebug_port = 9333").unwrap();
        assert_eq!(ConfigLoader::load(file.path()).unwrap().browser.debug_port, 9333);
    }

    #[test]
    fn test_missing_file() {
        let path = Path::new("/nonexistent/fenharvest.toml");
        assert!(matches!(ConfigLoader::load(path), Err(ConfigError::NotFound(_))));
        assert_eq!(ConfigLoader::load_or_default(path).unwrap().harvest.target_count, 500);
    }

    #[test]
    fn test_bad_toml() {
        assert!(matches!(
            ConfigLoader::load_str("target_count = [unclosed"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_env_substitution() {
        // SAFETY: the variable name is unique to this test.
        unsafe {
            std::env::set_var("FENHARVEST_TEST_OUTPUT", "from_env.csv");
        }
        let config = ConfigLoader::load_str("[harvest]\noutput = \"${FENHARVEST_TEST_OUTPUT}\"\n").unwrap();
        assert_eq!(config.harvest.output, "from_env.csv");
        unsafe {
            std::env::remove_var("FENHARVEST_TEST_OUTPUT");
        }
    }

    #[test]
    fn test_unset_env_reference() {
        let result = ConfigLoader::expand_env_vars("secret = \"${FENHARVEST_UNSET_VAR_12345}\"");
        assert!(matches!(result, Err(ConfigError::MissingEnv(v)) if v == "FENHARVEST_UNSET_VAR_12345"));
    }

    #[test]
    fn test_commented_reference_is_ignored() {
        let content = "# secret = \"${FENHARVEST_UNSET_VAR_12345}\"\nvalue = 1\n";
        assert_eq!(ConfigLoader::expand_env_vars(content).unwrap(), content);
    }

    #[test]
    fn test_shipped_default_config_loads() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../config/default.toml");
        let config = ConfigLoader::load(&path).unwrap();
        assert_eq!(config.harvest.endpoint_pattern, "/api/lessons/get_next/");
        assert_eq!(config.site.start_urls.len(), 2);
    }

    #[test]
    fn test_expand_path() {
        assert_eq!(ConfigLoader::expand_path("/usr/local/bin"), "/usr/local/bin");
        let expanded = ConfigLoader::expand_path("~/positions.csv");
        assert!(!expanded.starts_with('~'));
        assert!(expanded.ends_with("/positions.csv"));
    }
}
