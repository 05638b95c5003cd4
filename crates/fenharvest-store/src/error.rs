//! Store errors.

use thiserror::Error;

/// Record store error types.
#[derive(Debug, Error)]
pub enum StoreError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A persisted row could not be read back.
    #[error("Malformed row {line}: {message}")]
    Malformed { line: usize, message: String },

    /// A record was appended with an index that breaks the sequence.
    #[error("Record index out of sequence: expected {expected}, got {got}")]
    OutOfSequence { expected: u64, got: u64 },
}
