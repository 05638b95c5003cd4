//! Candidate extraction.
//!
//! Two independent strategies produce candidate payloads: [`NetworkStrategy`]
//! reads responses captured by the network hook, [`ProbeStrategy`] inspects
//! live page state. Neither ever fails the iteration; a fault is "no candidate".

mod network;
mod probe;

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

pub use network::{Extraction, LookupRule, NetworkStrategy};
pub use probe::{ProbeHeuristic, ProbeStrategy};

/// Shortest string accepted as a board-position payload.
pub const MIN_PAYLOAD_LEN: usize = 20;

/// Eight ranks of piece letters and digits, then the side to move.
static PAYLOAD_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[rnbqkpRNBQKP1-8]+(/[rnbqkpRNBQKP1-8]+){7}\s+[wb](\s|$)")
        .expect("valid payload pattern")
});

/// Whether `text` looks like a board-position payload.
pub fn is_payload_shaped(text: &str) -> bool {
    text.len() >= MIN_PAYLOAD_LEN && PAYLOAD_SHAPE.is_match(text)
}

/// Which strategy produced a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    Network,
    Probe,
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provenance::Network => write!(f, "network"),
            Provenance::Probe => write!(f, "probe"),
        }
    }
}

/// An unconfirmed extraction result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub payload: String,
    pub provenance: Provenance,
}

impl Candidate {
    pub fn network(payload: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
            provenance: Provenance::Network,
        }
    }

    pub fn probe(payload: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
            provenance: Provenance::Probe,
        }
    }
}

/// First `n` chars of a payload, for log lines.
pub fn payload_prefix(payload: &str, n: usize) -> &str {
    match payload.char_indices().nth(n) {
        Some((idx, _)) => &payload[..idx],
        None => payload,
    }
}
