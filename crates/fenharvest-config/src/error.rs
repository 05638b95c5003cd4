//! Configuration errors.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("No config file at {}", .0.display())]
    NotFound(PathBuf),

    #[error("Cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Bad TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// A `${VAR}` reference with no value in the environment.
    #[error("${{{0}}} is referenced but not set")]
    MissingEnv(String),

    #[error("{field}: {message}")]
    InvalidValue { field: String, message: String },
}
