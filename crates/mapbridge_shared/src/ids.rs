//! # Entity Identifiers
//!
//! Identifiers are small non-negative integers, unique within one entity kind.
//! A popup is associated with a marker or polygon by numeric equality of ids,
//! never by a stored reference.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The four kinds of entity the bridge keeps in sync.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// Root map surface.
    Map,
    /// Point marker.
    Marker,
    /// Polygon shape.
    Polygon,
    /// Popup record.
    Popup,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Map => "Map",
            Self::Marker => "Marker",
            Self::Polygon => "Polygon",
            Self::Popup => "Popup",
        })
    }
}

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        #[repr(transparent)]
        pub struct $name(pub u32);

        impl $name {
            /// Creates an identifier from its raw value.
            #[inline]
            #[must_use]
            pub const fn new(raw: u32) -> Self {
                Self(raw)
            }

            /// Returns the raw numeric value.
            #[inline]
            #[must_use]
            pub const fn get(self) -> u32 {
                self.0
            }
        }

        impl From<u32> for $name {
            fn from(raw: u32) -> Self {
                Self(raw)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "-{}"), self.0)
            }
        }
    };
}

entity_id!(
    /// Identifier of a map surface.
    MapId,
    "map"
);
entity_id!(
    /// Identifier of a marker.
    MarkerId,
    "marker"
);
entity_id!(
    /// Identifier of a polygon.
    PolygonId,
    "polygon"
);
entity_id!(
    /// Identifier of a popup record; equal to the id of the marker or polygon it binds to.
    PopupId,
    "popup"
);
entity_id!(
    /// Identifier of a popup body element, resolved through the naming convention.
    BodyId,
    "body"
);

impl From<MarkerId> for PopupId {
    fn from(id: MarkerId) -> Self {
        Self(id.0)
    }
}

impl From<PolygonId> for PopupId {
    fn from(id: PolygonId) -> Self {
        Self(id.0)
    }
}

impl From<PopupId> for MarkerId {
    fn from(id: PopupId) -> Self {
        Self(id.0)
    }
}

impl From<PopupId> for PolygonId {
    fn from(id: PopupId) -> Self {
        Self(id.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_prefixes() {
        assert_eq!(MapId(1).to_string(), "map-1");
        assert_eq!(MarkerId(5).to_string(), "marker-5");
        assert_eq!(PopupId::from(PolygonId(7)).to_string(), "popup-7");
    }

    #[test]
    fn test_ids_are_transparent_on_the_wire() {
        let id: MarkerId = serde_json::from_str("42").unwrap();
        assert_eq!(id, MarkerId(42));
        assert_eq!(serde_json::to_string(&MapId(3)).unwrap(), "3");
    }
}
