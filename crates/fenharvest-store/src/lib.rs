//! # fenharvest store
//!
//! Confirmed records and the row-oriented file they are persisted to.
//!
//! The whole collection is rewritten on every flush so that choices and
//! outcomes filled in after confirmation reach the latest row.

pub mod csv;
pub mod error;
pub mod record;
pub mod store;

pub use error::StoreError;
pub use record::{CHOICE_ARITY, HEADER, Outcome, Record, Row};
pub use store::RecordStore;
