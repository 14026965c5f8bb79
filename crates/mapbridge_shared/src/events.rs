//! User-interaction events pushed back to the host.
//!
//! Payloads are flat arrays on the wire:
//! - click: `[lat, lng]`
//! - move: `[lat, lng, zoom]`

use serde::ser::SerializeSeq;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

use crate::geo::LatLng;

/// Interaction kinds a host can subscribe to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Pointer click on the map surface.
    Click,
    /// Viewport finished moving.
    Move,
}

impl EventKind {
    /// All subscribable kinds.
    pub const ALL: [Self; 2] = [Self::Click, Self::Move];

    /// Wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Click => "click",
            Self::Move => "move",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Data extracted from one interaction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EventPayload {
    /// Clicked coordinate.
    Click(LatLng),
    /// New viewport.
    Move {
        /// New center.
        center: LatLng,
        /// New zoom level.
        zoom: f64,
    },
}

impl EventPayload {
    /// The kind this payload belongs to.
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::Click(_) => EventKind::Click,
            Self::Move { .. } => EventKind::Move,
        }
    }

    /// Flat wire representation.
    #[must_use]
    pub fn to_wire(&self) -> Vec<f64> {
        match *self {
            Self::Click(at) => vec![at.lat, at.lng],
            Self::Move { center, zoom } => vec![center.lat, center.lng, zoom],
        }
    }
}

impl Serialize for EventPayload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let values = self.to_wire();
        let mut seq = serializer.serialize_seq(Some(values.len()))?;
        for value in &values {
            seq.serialize_element(value)?;
        }
        seq.end()
    }
}
