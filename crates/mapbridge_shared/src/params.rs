//! # Operation Parameters
//!
//! One struct per host operation, exactly as the host serializes them.
//!
//! | Operation        | Params            |
//! |------------------|-------------------|
//! | `update_map`     | [`MapUpdate`]     |
//! | `delete_map`     | [`MapRef`]        |
//! | `update_marker`  | [`MarkerUpdate`]  |
//! | `delete_marker`  | [`MarkerRef`]     |
//! | `update_polygon` | [`PolygonUpdate`] |
//! | `delete_polygon` | [`PolygonRef`]    |
//! | `update_popup`   | [`PopupUpdate`]   |
//! | `delete_popup`   | [`PopupRef`]      |
//! | `on_map_click`   | [`MapRef`]        |
//! | `on_map_move`    | [`MapRef`]        |

use serde::{Deserialize, Serialize};

use crate::geo::{LatLng, MapPosition, PolygonRings};
use crate::ids::{BodyId, MapId, MarkerId, PolygonId, PopupId};
use crate::map::MapOptions;
use crate::marker::{MarkerIcon, MarkerKind};
use crate::path::PathOptions;
use crate::popup::PopupOptions;

/// Full description of a map.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MapUpdate {
    /// Target map.
    pub map_id: MapId,
    /// Viewport applied on every update.
    #[serde(default)]
    pub initial_position: MapPosition,
    /// Toggles and tile source.
    #[serde(default)]
    pub options: MapOptions,
}

impl MapUpdate {
    /// Creates an update with default options.
    #[must_use]
    pub fn new(map_id: MapId, initial_position: MapPosition) -> Self {
        Self {
            map_id,
            initial_position,
            options: MapOptions::default(),
        }
    }

    /// Builder method to set the options.
    #[must_use]
    pub fn with_options(mut self, options: MapOptions) -> Self {
        self.options = options;
        self
    }
}

/// Reference to a map (delete, subscriptions).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapRef {
    /// Target map.
    pub map_id: MapId,
}

/// Full description of a marker.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarkerUpdate {
    /// Map the marker lives on.
    pub map_id: MapId,
    /// Target marker.
    pub marker_id: MarkerId,
    /// Position.
    pub coordinate: LatLng,
    /// Custom pin icon; `None` restores the default pin.
    #[serde(default)]
    pub icon: Option<MarkerIcon>,
    /// Pin or circle.
    #[serde(default)]
    pub kind: MarkerKind,
}

impl MarkerUpdate {
    /// Creates a default pin update.
    #[must_use]
    pub fn new(map_id: MapId, marker_id: MarkerId, coordinate: LatLng) -> Self {
        Self {
            map_id,
            marker_id,
            coordinate,
            icon: None,
            kind: MarkerKind::Pin,
        }
    }

    /// Builder method to set a custom icon.
    #[must_use]
    pub fn with_icon(mut self, icon: MarkerIcon) -> Self {
        self.icon = Some(icon);
        self
    }

    /// Builder method to set the marker kind.
    #[must_use]
    pub fn with_kind(mut self, kind: MarkerKind) -> Self {
        self.kind = kind;
        self
    }
}

/// Reference to a marker on a map.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerRef {
    /// Map the marker lives on.
    pub map_id: MapId,
    /// Target marker.
    pub marker_id: MarkerId,
}

/// Full description of a polygon.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PolygonUpdate {
    /// Map the polygon lives on.
    pub map_id: MapId,
    /// Target polygon.
    pub polygon_id: PolygonId,
    /// Geometry.
    #[serde(default)]
    pub coordinates: PolygonRings,
    /// Style.
    #[serde(default)]
    pub options: PathOptions,
}

impl PolygonUpdate {
    /// Creates an update with the default style.
    #[must_use]
    pub fn new(map_id: MapId, polygon_id: PolygonId, coordinates: PolygonRings) -> Self {
        Self {
            map_id,
            polygon_id,
            coordinates,
            options: PathOptions::default(),
        }
    }

    /// Builder method to set the style.
    #[must_use]
    pub fn with_style(mut self, options: PathOptions) -> Self {
        self.options = options;
        self
    }
}

/// Reference to a polygon on a map.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolygonRef {
    /// Map the polygon lives on.
    pub map_id: MapId,
    /// Target polygon.
    pub polygon_id: PolygonId,
}

/// Full description of a popup.
///
/// `marker_id` is the popup's own id: it binds onto the marker and/or polygon
/// carrying the same number.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopupUpdate {
    /// Owner id.
    pub marker_id: PopupId,
    /// Body content id, resolved as `<namespace>-popup-<body_id>`.
    pub body_id: BodyId,
    /// Presentation options.
    #[serde(default)]
    pub options: PopupOptions,
}

impl PopupUpdate {
    /// Creates an update with default options.
    #[must_use]
    pub fn new(marker_id: impl Into<PopupId>, body_id: BodyId) -> Self {
        Self {
            marker_id: marker_id.into(),
            body_id,
            options: PopupOptions::default(),
        }
    }
}

/// Reference to a popup record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopupRef {
    /// Owner id.
    pub marker_id: PopupId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_update_wire_shape() {
        let update: MapUpdate = serde_json::from_str(
            r#"{
                "map_id": 1,
                "initial_position": {"coordinates": [10, 20], "zoom": 3},
                "options": {"tile_layer": {"url": "https://tiles/{z}/{x}/{y}", "attribution": "x", "max_zoom": 18, "subdomains": ["a"]}}
            }"#,
        )
        .unwrap();

        assert_eq!(update.map_id, MapId(1));
        assert_eq!(update.initial_position, MapPosition::new(10.0, 20.0, 3.0));
        assert_eq!(update.options.tile_layer.subdomains, vec!["a".to_string()]);
    }

    #[test]
    fn test_marker_update_defaults_to_plain_pin() {
        let update: MarkerUpdate =
            serde_json::from_str(r#"{"map_id": 1, "marker_id": 5, "coordinate": [1, 1]}"#).unwrap();
        assert_eq!(update.kind, MarkerKind::Pin);
        assert!(update.icon.is_none());
    }

    #[test]
    fn test_popup_update_empty_options() {
        let update: PopupUpdate =
            serde_json::from_str(r#"{"marker_id": 5, "body_id": 9, "options": {}}"#).unwrap();
        assert_eq!(update.marker_id, PopupId(5));
        assert_eq!(update.body_id, BodyId(9));
        assert_eq!(update.options, PopupOptions::default());
    }
}
