//! # fenharvest core
//!
//! The extraction cycle. Each iteration waits for the next item to render,
//! asks two independent strategies for a candidate payload, reconciles them
//! into at most one confirmed record, acts on the item's choices and
//! advances the UI.
//!
//! ## Components
//!
//! - [`SessionContext`]: capture buffer and counters shared by the
//!   network hook and the main loop
//! - [`extractor`]: network strategy and page-state probe
//! - [`Reconciler`]: duplicate suppression and index allocation
//! - [`InteractionDriver`]: choice recording, outcome inference, advance
//! - [`SessionController`]: the loop itself
//! - [`LoginFlow`]: account rotation and the start sequence
//! - [`NetworkInterceptor`]: feeds matching response bodies to the network strategy

pub mod context;
pub mod controller;
pub mod driver;
pub mod error;
pub mod extractor;
pub mod interceptor;
pub mod login;
pub mod page;
pub mod reconciler;
pub mod retry;

pub use context::{CapturedResponse, SessionContext, SessionState};
pub use controller::{ControllerConfig, RunSummary, SessionController, StopReason};
pub use driver::{DriverConfig, InteractionDriver, is_move_notation};
pub use error::{HarvestError, PageError};
pub use extractor::{Candidate, NetworkStrategy, ProbeStrategy, Provenance};
pub use interceptor::NetworkInterceptor;
pub use login::{LoginFlow, LoginOutcome};
pub use page::{LivePage, ResponseSource};
pub use reconciler::{Reconciler, Reconciliation};
pub use retry::RetryPolicy;

pub use tokio_util::sync::CancellationToken;
