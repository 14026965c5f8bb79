//! # MapBridge Shared
//!
//! Types that cross the host boundary.
//!
//! ## CRITICAL RULE
//!
//! Nothing in here may refer to a live drawing object. The host only ever
//! speaks in identifiers and descriptive payloads; the bridge owns the handles.
//!
//! ```text
//! HOST                              BRIDGE
//!   |                                 |
//!   |--- {"map_id": 1, ...} --------->|  <- params::MapUpdate
//!   |<-- null | "error string" -------|
//!   |<-- [lat, lng] ------------------|  <- events::EventPayload
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod events;
pub mod geo;
pub mod ids;
pub mod map;
pub mod marker;
pub mod params;
pub mod path;
pub mod popup;

pub use events::{EventKind, EventPayload};
pub use geo::{LatLng, MapPosition, PolygonRings};
pub use ids::{BodyId, EntityKind, MapId, MarkerId, PolygonId, PopupId};
pub use map::{MapControls, MapOptions, TileLayer};
pub use marker::{MarkerIcon, MarkerKind};
pub use params::{
    MapRef, MapUpdate, MarkerRef, MarkerUpdate, PolygonRef, PolygonUpdate, PopupRef,
    PopupUpdate,
};
pub use path::{LineCap, LineJoin, PathOptions};
pub use popup::PopupOptions;
