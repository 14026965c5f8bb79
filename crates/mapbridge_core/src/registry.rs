//! # Entity Registry
//!
//! Id → live handle, one table per kind. Ids are unique within a kind only:
//! marker 7 and polygon 7 are different entities.
//!
//! The registry is plain data. It never talks to the drawing surface and has
//! no locking of its own; the bridge holds it inside its single state lock so
//! that constructing a handle and registering it are one step for every
//! observer.
//!
//! Markers and polygons remember the map they were created on. A marker
//! update naming a different map moves the marker; a delete naming the
//! wrong map is refused.

use std::collections::HashMap;

use mapbridge_shared::{
    EntityKind, MapId, MapUpdate, MarkerId, MarkerKind, MarkerUpdate, PolygonId, PolygonUpdate,
    TileLayer,
};

use crate::surface::DrawingSurface;

/// A live map.
pub struct MapEntry<S: DrawingSurface> {
    /// Surface handle.
    pub handle: S::Map,
    /// The single active tile source: its descriptor and its surface handle.
    pub tile: Option<(TileLayer, S::TileLayer)>,
    /// Incarnation counter. A map deleted and created again gets a new value.
    pub generation: u64,
    /// Last description fully applied. `None` until the first one lands.
    pub applied: Option<MapUpdate>,
}

impl<S: DrawingSurface> MapEntry<S> {
    /// Entry for a freshly constructed map.
    pub fn new(handle: S::Map, generation: u64) -> Self {
        Self {
            handle,
            tile: None,
            generation,
            applied: None,
        }
    }

    /// Descriptor of the active tile source.
    #[must_use]
    pub fn tile_source(&self) -> Option<&TileLayer> {
        self.tile.as_ref().map(|(descriptor, _)| descriptor)
    }
}

/// A live marker.
pub struct MarkerEntry<S: DrawingSurface> {
    /// Map the marker was drawn on.
    pub map_id: MapId,
    /// Surface handle.
    pub handle: S::Marker,
    /// Description currently drawn.
    pub applied: MarkerUpdate,
}

impl<S: DrawingSurface> MarkerEntry<S> {
    /// Entry for a marker drawn from `applied`.
    pub fn new(handle: S::Marker, applied: MarkerUpdate) -> Self {
        Self {
            map_id: applied.map_id,
            handle,
            applied,
        }
    }

    /// Shape it was constructed as.
    #[must_use]
    #[inline]
    pub fn kind(&self) -> &MarkerKind {
        &self.applied.kind
    }
}

/// A live polygon.
pub struct PolygonEntry<S: DrawingSurface> {
    /// Map the polygon was drawn on.
    pub map_id: MapId,
    /// Surface handle.
    pub handle: S::Polygon,
    /// Description currently drawn.
    pub applied: PolygonUpdate,
}

impl<S: DrawingSurface> PolygonEntry<S> {
    /// Entry for a polygon drawn from `applied`.
    pub fn new(handle: S::Polygon, applied: PolygonUpdate) -> Self {
        Self {
            map_id: applied.map_id,
            handle,
            applied,
        }
    }
}

/// Per-kind id → handle tables.
pub struct Registry<S: DrawingSurface> {
    maps: HashMap<MapId, MapEntry<S>>,
    markers: HashMap<MarkerId, MarkerEntry<S>>,
    polygons: HashMap<PolygonId, PolygonEntry<S>>,
}

impl<S: DrawingSurface> Default for Registry<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: DrawingSurface> Registry<S> {
    /// Creates empty tables.
    #[must_use]
    pub fn new() -> Self {
        Self {
            maps: HashMap::new(),
            markers: HashMap::new(),
            polygons: HashMap::new(),
        }
    }

    /// Whether an entity of `kind` with raw id `id` is registered.
    ///
    /// Popups are not handles and live in the bridge's popup table, so this
    /// always answers `false` for them.
    #[must_use]
    pub fn contains(&self, kind: EntityKind, id: u32) -> bool {
        match kind {
            EntityKind::Map => self.maps.contains_key(&MapId(id)),
            EntityKind::Marker => self.markers.contains_key(&MarkerId(id)),
            EntityKind::Polygon => self.polygons.contains_key(&PolygonId(id)),
            EntityKind::Popup => false,
        }
    }

    /// Number of registered entities of `kind`.
    #[must_use]
    pub fn len(&self, kind: EntityKind) -> usize {
        match kind {
            EntityKind::Map => self.maps.len(),
            EntityKind::Marker => self.markers.len(),
            EntityKind::Polygon => self.polygons.len(),
            EntityKind::Popup => 0,
        }
    }

    /// `true` when every table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.maps.is_empty() && self.markers.is_empty() && self.polygons.is_empty()
    }

    // ========================================================================
    // MAPS
    // ========================================================================

    /// Looks up a map.
    #[must_use]
    #[inline]
    pub fn map(&self, id: MapId) -> Option<&MapEntry<S>> {
        self.maps.get(&id)
    }

    /// Looks up a map for mutation.
    #[inline]
    pub fn map_mut(&mut self, id: MapId) -> Option<&mut MapEntry<S>> {
        self.maps.get_mut(&id)
    }

    /// Registers a map, returning whatever was registered under the id before.
    pub fn set_map(&mut self, id: MapId, entry: MapEntry<S>) -> Option<MapEntry<S>> {
        self.maps.insert(id, entry)
    }

    /// Unregisters a map. Absent ids are a no-op.
    pub fn remove_map(&mut self, id: MapId) -> Option<MapEntry<S>> {
        self.maps.remove(&id)
    }

    // ========================================================================
    // MARKERS
    // ========================================================================

    /// Looks up a marker.
    #[must_use]
    #[inline]
    pub fn marker(&self, id: MarkerId) -> Option<&MarkerEntry<S>> {
        self.markers.get(&id)
    }

    /// Looks up a marker for mutation.
    #[inline]
    pub fn marker_mut(&mut self, id: MarkerId) -> Option<&mut MarkerEntry<S>> {
        self.markers.get_mut(&id)
    }

    /// Registers a marker, returning the previous entry under the id.
    pub fn set_marker(&mut self, id: MarkerId, entry: MarkerEntry<S>) -> Option<MarkerEntry<S>> {
        self.markers.insert(id, entry)
    }

    /// Unregisters a marker. Absent ids are a no-op.
    pub fn remove_marker(&mut self, id: MarkerId) -> Option<MarkerEntry<S>> {
        self.markers.remove(&id)
    }

    /// Unregisters every marker drawn on `map_id`.
    pub fn take_markers_on(&mut self, map_id: MapId) -> Vec<(MarkerId, MarkerEntry<S>)> {
        let ids: Vec<MarkerId> = self
            .markers
            .iter()
            .filter(|(_, entry)| entry.map_id == map_id)
            .map(|(id, _)| *id)
            .collect();
        ids.into_iter()
            .filter_map(|id| self.markers.remove(&id).map(|entry| (id, entry)))
            .collect()
    }

    // ========================================================================
    // POLYGONS
    // ========================================================================

    /// Looks up a polygon.
    #[must_use]
    #[inline]
    pub fn polygon(&self, id: PolygonId) -> Option<&PolygonEntry<S>> {
        self.polygons.get(&id)
    }

    /// Looks up a polygon for mutation.
    #[inline]
    pub fn polygon_mut(&mut self, id: PolygonId) -> Option<&mut PolygonEntry<S>> {
        self.polygons.get_mut(&id)
    }

    /// Registers a polygon, returning the previous entry under the id.
    pub fn set_polygon(
        &mut self,
        id: PolygonId,
        entry: PolygonEntry<S>,
    ) -> Option<PolygonEntry<S>> {
        self.polygons.insert(id, entry)
    }

    /// Unregisters a polygon. Absent ids are a no-op.
    pub fn remove_polygon(&mut self, id: PolygonId) -> Option<PolygonEntry<S>> {
        self.polygons.remove(&id)
    }

    /// Unregisters every polygon drawn on `map_id`.
    pub fn take_polygons_on(&mut self, map_id: MapId) -> Vec<(PolygonId, PolygonEntry<S>)> {
        let ids: Vec<PolygonId> = self
            .polygons
            .iter()
            .filter(|(_, entry)| entry.map_id == map_id)
            .map(|(id, _)| *id)
            .collect();
        ids.into_iter()
            .filter_map(|id| self.polygons.remove(&id).map(|entry| (id, entry)))
            .collect()
    }

    /// Empties every table, handing the entries back for teardown.
    pub fn drain(
        &mut self,
    ) -> (
        Vec<(MapId, MapEntry<S>)>,
        Vec<(MarkerId, MarkerEntry<S>)>,
        Vec<(PolygonId, PolygonEntry<S>)>,
    ) {
        (
            self.maps.drain().collect(),
            self.markers.drain().collect(),
            self.polygons.drain().collect(),
        )
    }
}
