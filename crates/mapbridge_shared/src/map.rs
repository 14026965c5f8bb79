//! Map surface descriptors: interaction toggles and the tile source.

use serde::{Deserialize, Serialize};

/// Presentation toggles of a map surface.
///
/// Every toggle defaults to enabled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapControls {
    /// Show the +/- zoom buttons.
    pub zoom_control: bool,
    /// Zoom with the mouse wheel.
    pub scroll_wheel_zoom: bool,
    /// Zoom on double click.
    pub double_click_zoom: bool,
    /// Pinch zoom on touch devices.
    pub touch_zoom: bool,
    /// Pan by dragging.
    pub dragging: bool,
    /// Keyboard navigation.
    pub keyboard: bool,
    /// Show the attribution box.
    pub attribution_control: bool,
}

impl Default for MapControls {
    fn default() -> Self {
        Self {
            zoom_control: true,
            scroll_wheel_zoom: true,
            double_click_zoom: true,
            touch_zoom: true,
            dragging: true,
            keyboard: true,
            attribution_control: true,
        }
    }
}

impl MapControls {
    /// All interaction disabled.
    #[must_use]
    pub const fn locked() -> Self {
        Self {
            zoom_control: false,
            scroll_wheel_zoom: false,
            double_click_zoom: false,
            touch_zoom: false,
            dragging: false,
            keyboard: false,
            attribution_control: false,
        }
    }
}

/// Tile source configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileLayer {
    /// URL template, e.g. `https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png`.
    pub url: String,
    /// Attribution HTML.
    pub attribution: String,
    /// Maximum zoom served by the source.
    pub max_zoom: u8,
    /// Values substituted for `{s}`.
    #[serde(default)]
    pub subdomains: Vec<String>,
}

impl TileLayer {
    /// OpenStreetMap tile layer (default).
    #[must_use]
    pub fn openstreetmap() -> Self {
        Self {
            url: "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png".to_string(),
            attribution: "&copy; <a href=\"https://www.openstreetmap.org/copyright\">OpenStreetMap</a> contributors".to_string(),
            max_zoom: 19,
            subdomains: vec!["a".to_string(), "b".to_string(), "c".to_string()],
        }
    }

    /// Esri satellite imagery.
    #[must_use]
    pub fn satellite() -> Self {
        Self {
            url: "https://server.arcgisonline.com/ArcGIS/rest/services/World_Imagery/MapServer/tile/{z}/{y}/{x}".to_string(),
            attribution: "Tiles &copy; Esri".to_string(),
            max_zoom: 18,
            subdomains: Vec::new(),
        }
    }
}

impl Default for TileLayer {
    fn default() -> Self {
        Self::openstreetmap()
    }
}

/// Full option block of a map update.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapOptions {
    /// Interaction toggles.
    #[serde(flatten)]
    pub controls: MapControls,
    /// The single active tile source.
    #[serde(default)]
    pub tile_layer: TileLayer,
}

impl MapOptions {
    /// Builder method to replace the interaction toggles.
    #[must_use]
    pub fn with_controls(mut self, controls: MapControls) -> Self {
        self.controls = controls;
        self
    }

    /// Builder method to set the tile layer.
    #[must_use]
    pub fn with_tile_layer(mut self, tile_layer: TileLayer) -> Self {
        self.tile_layer = tile_layer;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_options_fill_defaults() {
        let options: MapOptions = serde_json::from_str(
            r#"{"dragging": false, "tile_layer": {"url": "u", "attribution": "a", "max_zoom": 5}}"#,
        )
        .unwrap();

        assert!(!options.controls.dragging);
        assert!(options.controls.zoom_control);
        assert_eq!(options.tile_layer.max_zoom, 5);
        assert!(options.tile_layer.subdomains.is_empty());
    }

    #[test]
    fn test_missing_tile_layer_is_openstreetmap() {
        let options: MapOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options.tile_layer, TileLayer::openstreetmap());
    }
}
