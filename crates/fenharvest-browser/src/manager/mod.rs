//! Browser instance manager.
//!
//! Connects to a Chrome already listening on the debug port, or launches one
//! with a persistent profile so that login state survives between runs.

mod manager_core;
mod manager_types;

pub use manager_core::{BrowserManager, CHROME_ENV};
pub use manager_types::{BrowserError, BrowserManagerConfig};

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
