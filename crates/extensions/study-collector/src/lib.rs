//! # fenharvest study collector
//!
//! Walks a paginated listing, collects links whose path matches a pattern,
//! and downloads the `.pgn` companion of each one as
//! `{index:03}_{id}.pgn`.

mod collector;
mod error;
mod links;

pub use collector::{DownloadSummary, StudyCollector};
pub use error::CollectorError;
pub use links::extract_links;
