//! # fenharvest config
//!
//! TOML configuration for the harvester: browser, site/login parameters,
//! credentials, the extraction cycle's tunables, and the study collector.

mod error;
mod loader;
mod schema;
mod validator;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::*;
pub use validator::{ConfigValidator, Finding, ValidationResult};
