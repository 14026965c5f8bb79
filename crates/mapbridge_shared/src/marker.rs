//! Marker descriptors.

use serde::{Deserialize, Serialize};

use crate::path::PathOptions;

/// Custom image icon for a pin marker.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerIcon {
    /// Icon image URL.
    pub icon_url: String,
    /// Icon size in pixels.
    #[serde(default)]
    pub icon_size: Option<[u32; 2]>,
    /// Pixel of the icon that sits on the coordinate.
    #[serde(default)]
    pub icon_anchor: Option<[u32; 2]>,
    /// Popup offset relative to the anchor.
    #[serde(default)]
    pub popup_anchor: Option<[i32; 2]>,
    /// Shadow image URL.
    #[serde(default)]
    pub shadow_url: Option<String>,
    /// Shadow size in pixels.
    #[serde(default)]
    pub shadow_size: Option<[u32; 2]>,
}

impl MarkerIcon {
    /// Creates an icon with just the URL.
    pub fn new(icon_url: impl Into<String>) -> Self {
        Self {
            icon_url: icon_url.into(),
            icon_size: None,
            icon_anchor: None,
            popup_anchor: None,
            shadow_url: None,
            shadow_size: None,
        }
    }

    /// Builder method to set the icon size.
    #[must_use]
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.icon_size = Some([width, height]);
        self
    }

    /// Builder method to set the anchor pixel.
    #[must_use]
    pub fn with_anchor(mut self, x: u32, y: u32) -> Self {
        self.icon_anchor = Some([x, y]);
        self
    }
}

/// What a marker looks like. Decided once at the host boundary.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MarkerKind {
    /// Image pin (default Leaflet marker, or a custom [`MarkerIcon`]).
    #[default]
    Pin,
    /// Vector circle with a fixed pixel radius.
    Circle {
        /// Radius in pixels.
        radius_px: u32,
        /// Stroke/fill style.
        #[serde(default)]
        style: PathOptions,
    },
}

impl MarkerKind {
    /// `true` when both kinds need the same kind of drawing object.
    #[must_use]
    pub fn same_shape(&self, other: &Self) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_is_tagged() {
        let kind: MarkerKind =
            serde_json::from_str(r#"{"type": "circle", "radius_px": 8}"#).unwrap();
        assert!(matches!(kind, MarkerKind::Circle { radius_px: 8, .. }));
        assert!(!kind.same_shape(&MarkerKind::Pin));

        let pin: MarkerKind = serde_json::from_str(r#"{"type": "pin"}"#).unwrap();
        assert_eq!(pin, MarkerKind::Pin);
    }

    #[test]
    fn test_icon_optional_geometry() {
        let icon: MarkerIcon = serde_json::from_str(
            r#"{"icon_url": "/pin.png", "icon_size": [25, 41], "popup_anchor": [1, -34]}"#,
        )
        .unwrap();
        assert_eq!(icon.icon_size, Some([25, 41]));
        assert_eq!(icon.popup_anchor, Some([1, -34]));
        assert!(icon.shadow_url.is_none());
    }
}
