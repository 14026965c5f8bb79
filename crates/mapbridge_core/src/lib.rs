//! # MapBridge Core
//!
//! Keeps live map drawing objects in step with state owned by a host that
//! can only speak in ids and JSON payloads.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐  Command   ┌──────────────────────────────────────────────┐
//! │          │ ─────────► │ shim::envelope ─► Bridge::dispatch           │
//! │   HOST   │            │                    │                         │
//! │          │ ◄───────── │ Reply (null/err)   ▼                         │
//! │          │            │   registry ◄─► DrawingSurface ◄─► waiter     │
//! │          │ ◄───────── │ events::relay ◄─── listener                  │
//! └──────────┘  payloads  └──────────────────────────────────────────────┘
//! ```
//!
//! ## Guarantees
//!
//! - Updates are idempotent: resending the last known state changes nothing.
//! - Entities are created on first reference and registered in the same step.
//! - A failed operation leaves the registry as it found it.
//! - Callers that need a map before it exists wait, bounded by a deadline.
//! - Host callback failures are logged and counted, never propagated into the
//!   drawing surface.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod bridge;
pub mod config;
pub mod error;
pub mod events;
pub mod registry;
pub mod shim;
pub mod surface;
pub mod waiter;

pub use bridge::{Bridge, BridgeStats, PopupRecord, StatsSnapshot};
pub use config::{BridgeConfig, ConfigError};
pub use error::{BridgeError, BridgeResult, CallbackError, ErrorCategory, SurfaceError};
pub use events::{host_callback, CallbackFuture, HostCallback};
pub use shim::{envelope, Command, Reply};
pub use surface::{DrawingSurface, Listener, RecordingSurface, SurfaceEvent, SurfaceResult};
