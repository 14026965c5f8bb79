//! # Bridge Error Types
//!
//! Every error an operation can produce, plus the taxonomy the host sees.

use mapbridge_shared::{EntityKind, MapId};
use std::time::Duration;
use thiserror::Error;

/// How a failure is classified at the host boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The operation named an entity or content element that does not exist.
    ReferenceNotFound,
    /// The request or the drawing library itself failed.
    TransportFailure,
}

/// Failure raised by the drawing surface.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SurfaceError {
    /// A style value was rejected.
    #[error("invalid style: {0}")]
    InvalidStyle(String),

    /// A coordinate or zoom level was rejected.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    /// The handle no longer refers to a live object.
    #[error("stale handle: {0}")]
    StaleHandle(String),

    /// Anything else the library threw.
    #[error("{0}")]
    Rejected(String),
}

/// Errors that can occur in a bridge operation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BridgeError {
    /// An entity the operation depends on does not exist.
    #[error("{kind} with id {id} not found when {action}")]
    ReferenceNotFound {
        /// Kind of the missing entity.
        kind: EntityKind,
        /// Raw id of the missing entity.
        id: u32,
        /// What the operation was doing.
        action: String,
    },

    /// The popup body element could not be resolved.
    #[error("popup body element with id {element_id} not found when updating popup for object {owner}")]
    ContentNotFound {
        /// Element id derived from the body id.
        element_id: String,
        /// Raw owner id of the popup.
        owner: u32,
    },

    /// The drawing surface rejected a call.
    #[error("surface error: {0}")]
    Surface(#[from] SurfaceError),

    /// The parameter payload could not be decoded.
    #[error("invalid parameters: {0}")]
    InvalidParams(String),

    /// A wait for a map gave up.
    #[error("{map_id} was not created within {waited:?}")]
    ReadyTimeout {
        /// Map that never appeared.
        map_id: MapId,
        /// How long we waited.
        waited: Duration,
    },

    /// A wait for a map was cancelled.
    #[error("wait for {map_id} was cancelled")]
    Cancelled {
        /// Map that was being waited on.
        map_id: MapId,
    },
}

impl BridgeError {
    /// Shorthand for a missing entity.
    pub fn not_found(kind: EntityKind, id: u32, action: impl Into<String>) -> Self {
        Self::ReferenceNotFound {
            kind,
            id,
            action: action.into(),
        }
    }

    /// Host-facing classification.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::ReferenceNotFound { .. } | Self::ContentNotFound { .. } => {
                ErrorCategory::ReferenceNotFound
            }
            Self::Surface(_)
            | Self::InvalidParams(_)
            | Self::ReadyTimeout { .. }
            | Self::Cancelled { .. } => ErrorCategory::TransportFailure,
        }
    }
}

impl From<serde_json::Error> for BridgeError {
    fn from(e: serde_json::Error) -> Self {
        Self::InvalidParams(e.to_string())
    }
}

/// A host callback failed while receiving an event push.
///
/// Never reported back to anyone; the relay logs it and moves on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("host callback failed: {0}")]
pub struct CallbackError(pub String);

impl CallbackError {
    /// Wraps any displayable failure.
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

/// Result type for bridge operations.
pub type BridgeResult<T> = Result<T, BridgeError>;
