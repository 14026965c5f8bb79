//! # MapBridge Host
//!
//! Drives a [`mapbridge_core::Bridge`] over newline-delimited JSON, with a
//! [`mapbridge_core::RecordingSurface`] standing in for a real map widget.
//!
//! ```text
//! stdin ──► reader thread ──► runtime (one task per request) ──► writer thread ──► stdout
//!                                  │                                  ▲
//!                                  └── subscription callbacks ────────┘
//! ```
//!
//! Requests carry an `id`; every request gets exactly one response with the
//! same id. Events from subscriptions are pushed as they happen.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod host;
pub mod logging;
pub mod protocol;

pub use config::HostConfig;
pub use error::{HostError, HostResult};
pub use host::run_host;
pub use protocol::{HostOp, Outbound, Push, Request, Response};
