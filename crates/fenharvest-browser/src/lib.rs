//! Chrome DevTools Protocol (CDP) plumbing for fenharvest.
//!
//! Drives a real Chrome/Chromium instance over its remote debugging
//! WebSocket. The harvester needs a small slice of CDP: navigation, DOM
//! queries, synthetic mouse/keyboard input, `Runtime.evaluate`, and the
//! `Network` event stream used to observe API responses passively.
//!
//! ```text
//! ┌─────────────────┐    WebSocket     ┌──────────────────┐
//! │   fenharvest    │ ◄──────────────► │   Chrome/Edge    │
//! │  (this crate)   │       CDP        │                  │
//! └─────────────────┘                  └──────────────────┘
//! ```
//!
//! Start Chrome yourself with `--remote-debugging-port=9222`, or let
//! [`BrowserManager`] launch one with a persistent profile so that login
//! state survives between runs.

mod client;
mod error;
pub mod manager;
mod protocol;
mod session;

pub use client::CdpClient;
pub use error::CdpError;
pub use manager::{BrowserError, BrowserManager, BrowserManagerConfig, CHROME_ENV};
pub use protocol::{
    ElementBox, LoadingFailed, LoadingFinished, NetworkResponse, ResponseBody, ResponseReceived, ScreenshotFormat,
};
pub use session::{NetworkEvent, NetworkEvents, PageSession};
