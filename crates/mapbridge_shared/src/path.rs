//! Stroke and fill style for vector shapes.

use serde::{Deserialize, Serialize};

/// Shape used at the end of a stroke.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineCap {
    /// Flat, ends exactly at the endpoint.
    Butt,
    /// Rounded (default).
    #[default]
    Round,
    /// Flat, extends past the endpoint.
    Square,
}

/// Shape used at stroke corners.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineJoin {
    /// Arc join.
    Arcs,
    /// Bevelled corner.
    Bevel,
    /// Sharp corner.
    Miter,
    /// Sharp corner, clipped at the miter limit.
    #[serde(rename = "miter-clip")]
    MiterClip,
    /// Rounded (default).
    #[default]
    Round,
}

/// Style descriptor applied to polygons and circle markers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathOptions {
    /// Whether to draw the stroke. Disable to drop borders.
    pub stroke: bool,
    /// Stroke color (any CSS color).
    pub color: String,
    /// Stroke width in pixels.
    pub weight: u32,
    /// Stroke opacity, `0.0..=1.0`.
    pub opacity: f32,
    /// Shape at the end of the stroke.
    pub line_cap: LineCap,
    /// Shape at stroke corners.
    pub line_join: LineJoin,
    /// Whether to fill the shape.
    pub fill: bool,
    /// Fill color. Falls back to `color` when absent.
    pub fill_color: Option<String>,
    /// Fill opacity, `0.0..=1.0`.
    pub fill_opacity: f32,
}

impl Default for PathOptions {
    fn default() -> Self {
        Self {
            stroke: true,
            color: "#3388ff".to_string(),
            weight: 3,
            opacity: 1.0,
            line_cap: LineCap::Round,
            line_join: LineJoin::Round,
            fill: true,
            fill_color: None,
            fill_opacity: 0.2,
        }
    }
}

impl PathOptions {
    /// The color actually used for the fill.
    #[must_use]
    pub fn effective_fill_color(&self) -> &str {
        self.fill_color.as_deref().unwrap_or(&self.color)
    }
}
