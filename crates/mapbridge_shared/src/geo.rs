//! Geographic primitives.
//!
//! Coordinates travel as `[lat, lng]` pairs on the wire.

use serde::{Deserialize, Serialize};

/// A latitude/longitude pair.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct LatLng {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
}

impl LatLng {
    /// Creates a coordinate.
    #[inline]
    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Both components are finite numbers.
    #[inline]
    #[must_use]
    pub fn is_finite(self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }
}

impl From<[f64; 2]> for LatLng {
    fn from([lat, lng]: [f64; 2]) -> Self {
        Self { lat, lng }
    }
}

impl From<LatLng> for [f64; 2] {
    fn from(value: LatLng) -> Self {
        [value.lat, value.lng]
    }
}

/// A viewport: center coordinate plus zoom level.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MapPosition {
    /// Center of the viewport.
    pub coordinates: LatLng,
    /// Zoom level.
    pub zoom: f64,
}

impl MapPosition {
    /// Creates a viewport.
    #[must_use]
    pub const fn new(lat: f64, lng: f64, zoom: f64) -> Self {
        Self {
            coordinates: LatLng::new(lat, lng),
            zoom,
        }
    }
}

impl Default for MapPosition {
    fn default() -> Self {
        Self::new(51.505, -0.09, 13.0)
    }
}

/// Polygon geometry as accepted from the host.
///
/// The host may send a single ring, a list of rings (outer + holes) or a
/// list of polygons each made of rings. Everything is normalized to the
/// multi-polygon form before reaching the drawing surface.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PolygonRings {
    /// `[[lat, lng], ...]`
    Ring(Vec<LatLng>),
    /// `[[[lat, lng], ...], ...]`
    Rings(Vec<Vec<LatLng>>),
    /// `[[[[lat, lng], ...], ...], ...]`
    Multi(Vec<Vec<Vec<LatLng>>>),
}

impl Default for PolygonRings {
    fn default() -> Self {
        Self::Multi(Vec::new())
    }
}

impl PolygonRings {
    /// Converts to the multi-polygon form.
    #[must_use]
    pub fn into_multi(self) -> Vec<Vec<Vec<LatLng>>> {
        match self {
            Self::Ring(ring) if ring.is_empty() => Vec::new(),
            Self::Ring(ring) => vec![vec![ring]],
            Self::Rings(rings) if rings.is_empty() => Vec::new(),
            Self::Rings(rings) => vec![rings],
            Self::Multi(polygons) => polygons,
        }
    }

    /// Total number of vertices across all rings.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        match self {
            Self::Ring(ring) => ring.len(),
            Self::Rings(rings) => rings.iter().map(Vec::len).sum(),
            Self::Multi(polygons) => polygons.iter().flatten().map(Vec::len).sum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latlng_wire_format() {
        let ll: LatLng = serde_json::from_str("[10.0, 20.5]").unwrap();
        assert_eq!(ll, LatLng::new(10.0, 20.5));
        assert_eq!(serde_json::to_string(&ll).unwrap(), "[10.0,20.5]");
    }

    #[test]
    fn test_polygon_nesting_levels() {
        let ring: PolygonRings = serde_json::from_str("[[0,0],[0,1],[1,1]]").unwrap();
        assert_eq!(ring.vertex_count(), 3);
        assert_eq!(ring.into_multi().len(), 1);

        let rings: PolygonRings =
            serde_json::from_str("[[[0,0],[0,4],[4,4]],[[1,1],[1,2],[2,2]]]").unwrap();
        let multi = rings.into_multi();
        assert_eq!(multi.len(), 1);
        assert_eq!(multi[0].len(), 2);

        let polys: PolygonRings =
            serde_json::from_str("[[[[0,0],[0,1],[1,1]]],[[[5,5],[5,6],[6,6]]]]").unwrap();
        assert_eq!(polys.into_multi().len(), 2);
    }

    #[test]
    fn test_empty_geometry_normalizes_to_nothing() {
        let empty: PolygonRings = serde_json::from_str("[]").unwrap();
        assert!(empty.into_multi().is_empty());
    }
}
