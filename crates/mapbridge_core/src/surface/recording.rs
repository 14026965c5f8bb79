//! In-memory drawing surface.
//!
//! Keeps a record of every live object and its last applied state, validates
//! inputs roughly the way a real map library would, and lets callers fire
//! synthetic interaction events or inject a failure into the next call.

use std::collections::{HashMap, HashSet};
use std::fmt;

use mapbridge_shared::{
    EventKind, LatLng, MapControls, MapPosition, MarkerIcon, MarkerKind, PathOptions,
    PopupOptions, TileLayer,
};

use super::{DrawingSurface, Listener, SurfaceEvent, SurfaceResult};
use crate::error::SurfaceError;

/// Handle of any object created by a [`RecordingSurface`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId(pub u64);

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "layer#{}", self.0)
    }
}

/// Popup content bound onto a marker or polygon.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoundPopup {
    /// Element the content was resolved from.
    pub element_id: String,
    /// Options it was bound with.
    pub options: PopupOptions,
}

/// State of a live map.
#[derive(Clone, Debug, PartialEq)]
pub struct MapRecord {
    /// Mount point it was constructed on.
    pub mount: String,
    /// Last applied toggles.
    pub controls: MapControls,
    /// Last applied viewport. `None` until the first `set_view`.
    pub view: Option<MapPosition>,
    /// Attached tile layers, oldest first.
    pub tile_layers: Vec<LayerId>,
    /// Number of forced size re-measurements.
    pub size_invalidations: u32,
}

/// State of a live marker.
#[derive(Clone, Debug, PartialEq)]
pub struct MarkerRecord {
    /// Owning map.
    pub map: LayerId,
    /// Current position.
    pub position: LatLng,
    /// Pin or circle.
    pub kind: MarkerKind,
    /// Custom pin icon.
    pub icon: Option<MarkerIcon>,
    /// Bound popup.
    pub popup: Option<BoundPopup>,
}

/// State of a live polygon.
#[derive(Clone, Debug, PartialEq)]
pub struct PolygonRecord {
    /// Owning map.
    pub map: LayerId,
    /// Rings in multi-polygon form.
    pub rings: Vec<Vec<Vec<LatLng>>>,
    /// Last applied style.
    pub style: PathOptions,
    /// Bound popup.
    pub popup: Option<BoundPopup>,
}

/// Lifetime totals. Never decremented.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SurfaceCounters {
    /// Maps constructed.
    pub maps_created: u64,
    /// Markers constructed.
    pub markers_created: u64,
    /// Polygons constructed.
    pub polygons_created: u64,
    /// Tile layers attached.
    pub tile_layers_added: u64,
    /// Popups bound.
    pub popups_bound: u64,
}

struct RegisteredListener {
    subscription: LayerId,
    kind: EventKind,
    listener: Listener,
}

/// [`DrawingSurface`] that draws nothing and remembers everything.
#[derive(Default)]
pub struct RecordingSurface {
    next_id: u64,
    elements: HashSet<String>,
    maps: HashMap<LayerId, MapRecord>,
    markers: HashMap<LayerId, MarkerRecord>,
    polygons: HashMap<LayerId, PolygonRecord>,
    tile_layers: HashMap<LayerId, (LayerId, TileLayer)>,
    listeners: HashMap<LayerId, Vec<RegisteredListener>>,
    fail_next: Option<SurfaceError>,
    counters: SurfaceCounters,
}

impl fmt::Debug for RecordingSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordingSurface")
            .field("maps", &self.maps.len())
            .field("markers", &self.markers.len())
            .field("polygons", &self.polygons.len())
            .field("tile_layers", &self.tile_layers.len())
            .field("counters", &self.counters)
            .finish_non_exhaustive()
    }
}

impl RecordingSurface {
    /// Creates an empty surface.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes an element available to [`DrawingSurface::resolve_content`].
    pub fn insert_element(&mut self, element_id: impl Into<String>) {
        self.elements.insert(element_id.into());
    }

    /// Removes an element. Already bound popups keep their content.
    pub fn remove_element(&mut self, element_id: &str) -> bool {
        self.elements.remove(element_id)
    }

    /// Makes the next fallible call return `error`.
    pub fn fail_next(&mut self, error: SurfaceError) {
        self.fail_next = Some(error);
    }

    /// Dispatches an event to every listener of its kind on `map`.
    ///
    /// Returns how many listeners saw it.
    pub fn fire(&self, map: LayerId, event: SurfaceEvent) -> usize {
        let Some(listeners) = self.listeners.get(&map) else {
            return 0;
        };
        let kind = event.kind();
        let mut delivered = 0;
        for registered in listeners.iter().filter(|l| l.kind == kind) {
            (registered.listener)(event);
            delivered += 1;
        }
        delivered
    }

    /// Listeners attached to `map` for `kind`.
    #[must_use]
    pub fn listener_count(&self, map: LayerId, kind: EventKind) -> usize {
        self.listeners
            .get(&map)
            .map_or(0, |l| l.iter().filter(|r| r.kind == kind).count())
    }

    /// Lifetime totals.
    #[must_use]
    #[inline]
    pub const fn counters(&self) -> SurfaceCounters {
        self.counters
    }

    /// Live map by handle.
    #[must_use]
    pub fn map(&self, id: LayerId) -> Option<&MapRecord> {
        self.maps.get(&id)
    }

    /// Live map by mount point.
    #[must_use]
    pub fn map_on(&self, mount: &str) -> Option<(LayerId, &MapRecord)> {
        self.maps
            .iter()
            .find(|(_, record)| record.mount == mount)
            .map(|(id, record)| (*id, record))
    }

    /// Live marker by handle.
    #[must_use]
    pub fn marker(&self, id: LayerId) -> Option<&MarkerRecord> {
        self.markers.get(&id)
    }

    /// Live polygon by handle.
    #[must_use]
    pub fn polygon(&self, id: LayerId) -> Option<&PolygonRecord> {
        self.polygons.get(&id)
    }

    /// Descriptor of an attached tile layer.
    #[must_use]
    pub fn tile_layer(&self, id: LayerId) -> Option<&TileLayer> {
        self.tile_layers.get(&id).map(|(_, layer)| layer)
    }

    /// Number of live maps.
    #[must_use]
    pub fn live_maps(&self) -> usize {
        self.maps.len()
    }

    /// Number of live markers.
    #[must_use]
    pub fn live_markers(&self) -> usize {
        self.markers.len()
    }

    /// Number of live polygons.
    #[must_use]
    pub fn live_polygons(&self) -> usize {
        self.polygons.len()
    }

    fn allocate(&mut self) -> LayerId {
        self.next_id += 1;
        LayerId(self.next_id)
    }

    fn check_fault(&mut self) -> SurfaceResult<()> {
        match self.fail_next.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn live_map(&self, id: LayerId) -> SurfaceResult<()> {
        if self.maps.contains_key(&id) {
            Ok(())
        } else {
            Err(SurfaceError::StaleHandle(format!("map {id}")))
        }
    }

    fn map_mut(&mut self, id: LayerId) -> SurfaceResult<&mut MapRecord> {
        self.maps
            .get_mut(&id)
            .ok_or_else(|| SurfaceError::StaleHandle(format!("map {id}")))
    }

    fn marker_mut(&mut self, id: LayerId) -> SurfaceResult<&mut MarkerRecord> {
        self.markers
            .get_mut(&id)
            .ok_or_else(|| SurfaceError::StaleHandle(format!("marker {id}")))
    }

    fn polygon_mut(&mut self, id: LayerId) -> SurfaceResult<&mut PolygonRecord> {
        self.polygons
            .get_mut(&id)
            .ok_or_else(|| SurfaceError::StaleHandle(format!("polygon {id}")))
    }
}

fn check_latlng(at: LatLng) -> SurfaceResult<()> {
    if at.is_finite() {
        Ok(())
    } else {
        Err(SurfaceError::InvalidGeometry(format!(
            "invalid LatLng object: ({}, {})",
            at.lat, at.lng
        )))
    }
}

fn check_style(style: &PathOptions) -> SurfaceResult<()> {
    if !(0.0..=1.0).contains(&style.opacity) {
        return Err(SurfaceError::InvalidStyle(format!(
            "opacity {} outside 0..=1",
            style.opacity
        )));
    }
    if !(0.0..=1.0).contains(&style.fill_opacity) {
        return Err(SurfaceError::InvalidStyle(format!(
            "fill opacity {} outside 0..=1",
            style.fill_opacity
        )));
    }
    if style.color.is_empty() {
        return Err(SurfaceError::InvalidStyle("stroke color is empty".into()));
    }
    Ok(())
}

impl DrawingSurface for RecordingSurface {
    type Map = LayerId;
    type TileLayer = LayerId;
    type Marker = LayerId;
    type Polygon = LayerId;
    type Content = String;
    type Subscription = LayerId;

    fn create_map(&mut self, mount: &str, controls: &MapControls) -> SurfaceResult<LayerId> {
        self.check_fault()?;
        if self.map_on(mount).is_some() {
            return Err(SurfaceError::Rejected(format!(
                "map container {mount} is already initialized"
            )));
        }
        let id = self.allocate();
        self.maps.insert(
            id,
            MapRecord {
                mount: mount.to_string(),
                controls: *controls,
                view: None,
                tile_layers: Vec::new(),
                size_invalidations: 0,
            },
        );
        self.counters.maps_created += 1;
        Ok(id)
    }

    fn destroy_map(&mut self, map: &LayerId) {
        if let Some(record) = self.maps.remove(map) {
            for layer in record.tile_layers {
                self.tile_layers.remove(&layer);
            }
        }
        self.markers.retain(|_, m| m.map != *map);
        self.polygons.retain(|_, p| p.map != *map);
        self.listeners.remove(map);
    }

    fn set_view(&mut self, map: &LayerId, view: &MapPosition) -> SurfaceResult<()> {
        self.check_fault()?;
        check_latlng(view.coordinates)?;
        if !view.zoom.is_finite() || view.zoom < 0.0 {
            return Err(SurfaceError::InvalidGeometry(format!(
                "invalid zoom level {}",
                view.zoom
            )));
        }
        self.map_mut(*map)?.view = Some(*view);
        Ok(())
    }

    fn set_controls(&mut self, map: &LayerId, controls: &MapControls) -> SurfaceResult<()> {
        self.check_fault()?;
        self.map_mut(*map)?.controls = *controls;
        Ok(())
    }

    fn add_tile_layer(&mut self, map: &LayerId, layer: &TileLayer) -> SurfaceResult<LayerId> {
        self.check_fault()?;
        if layer.url.is_empty() {
            return Err(SurfaceError::Rejected("tile url template is empty".into()));
        }
        self.live_map(*map)?;
        let id = self.allocate();
        self.tile_layers.insert(id, (*map, layer.clone()));
        self.map_mut(*map)?.tile_layers.push(id);
        self.counters.tile_layers_added += 1;
        Ok(id)
    }

    fn remove_tile_layer(&mut self, map: &LayerId, layer: LayerId) {
        self.tile_layers.remove(&layer);
        if let Some(record) = self.maps.get_mut(map) {
            record.tile_layers.retain(|l| *l != layer);
        }
    }

    fn invalidate_size(&mut self, map: &LayerId) {
        if let Some(record) = self.maps.get_mut(map) {
            record.size_invalidations += 1;
        }
    }

    fn create_marker(
        &mut self,
        map: &LayerId,
        at: LatLng,
        kind: &MarkerKind,
    ) -> SurfaceResult<LayerId> {
        self.check_fault()?;
        self.live_map(*map)?;
        check_latlng(at)?;
        let id = self.allocate();
        self.markers.insert(
            id,
            MarkerRecord {
                map: *map,
                position: at,
                kind: kind.clone(),
                icon: None,
                popup: None,
            },
        );
        self.counters.markers_created += 1;
        Ok(id)
    }

    fn set_marker_position(&mut self, marker: &LayerId, at: LatLng) -> SurfaceResult<()> {
        self.check_fault()?;
        check_latlng(at)?;
        self.marker_mut(*marker)?.position = at;
        Ok(())
    }

    fn set_marker_appearance(
        &mut self,
        marker: &LayerId,
        kind: &MarkerKind,
        icon: Option<&MarkerIcon>,
    ) -> SurfaceResult<()> {
        self.check_fault()?;
        if let MarkerKind::Circle { style, .. } = kind {
            check_style(style)?;
        }
        if let Some(icon) = icon {
            if icon.icon_url.is_empty() {
                return Err(SurfaceError::InvalidStyle("icon url is empty".into()));
            }
        }
        let record = self.marker_mut(*marker)?;
        if !record.kind.same_shape(kind) {
            return Err(SurfaceError::Rejected(
                "cannot turn a pin into a circle marker in place".into(),
            ));
        }
        record.kind = kind.clone();
        record.icon = icon.cloned();
        Ok(())
    }

    fn remove_marker(&mut self, marker: LayerId) {
        self.markers.remove(&marker);
    }

    fn create_polygon(&mut self, map: &LayerId) -> SurfaceResult<LayerId> {
        self.check_fault()?;
        self.live_map(*map)?;
        let id = self.allocate();
        self.polygons.insert(
            id,
            PolygonRecord {
                map: *map,
                rings: Vec::new(),
                style: PathOptions::default(),
                popup: None,
            },
        );
        self.counters.polygons_created += 1;
        Ok(id)
    }

    fn set_polygon_rings(
        &mut self,
        polygon: &LayerId,
        rings: &[Vec<Vec<LatLng>>],
    ) -> SurfaceResult<()> {
        self.check_fault()?;
        for at in rings.iter().flatten().flatten() {
            check_latlng(*at)?;
        }
        self.polygon_mut(*polygon)?.rings = rings.to_vec();
        Ok(())
    }

    fn set_polygon_style(&mut self, polygon: &LayerId, style: &PathOptions) -> SurfaceResult<()> {
        self.check_fault()?;
        check_style(style)?;
        self.polygon_mut(*polygon)?.style = style.clone();
        Ok(())
    }

    fn remove_polygon(&mut self, polygon: LayerId) {
        self.polygons.remove(&polygon);
    }

    fn resolve_content(&self, element_id: &str) -> Option<String> {
        self.elements.get(element_id).cloned()
    }

    fn bind_marker_popup(
        &mut self,
        marker: &LayerId,
        content: &String,
        options: &PopupOptions,
    ) -> SurfaceResult<()> {
        self.check_fault()?;
        self.marker_mut(*marker)?.popup = Some(BoundPopup {
            element_id: content.clone(),
            options: options.clone(),
        });
        self.counters.popups_bound += 1;
        Ok(())
    }

    fn unbind_marker_popup(&mut self, marker: &LayerId) {
        if let Some(record) = self.markers.get_mut(marker) {
            record.popup = None;
        }
    }

    fn bind_polygon_popup(
        &mut self,
        polygon: &LayerId,
        content: &String,
        options: &PopupOptions,
    ) -> SurfaceResult<()> {
        self.check_fault()?;
        self.polygon_mut(*polygon)?.popup = Some(BoundPopup {
            element_id: content.clone(),
            options: options.clone(),
        });
        self.counters.popups_bound += 1;
        Ok(())
    }

    fn unbind_polygon_popup(&mut self, polygon: &LayerId) {
        if let Some(record) = self.polygons.get_mut(polygon) {
            record.popup = None;
        }
    }

    fn on(&mut self, map: &LayerId, kind: EventKind, listener: Listener) -> SurfaceResult<LayerId> {
        self.check_fault()?;
        self.live_map(*map)?;
        let subscription = self.allocate();
        self.listeners
            .entry(*map)
            .or_default()
            .push(RegisteredListener {
                subscription,
                kind,
                listener,
            });
        Ok(subscription)
    }

    fn off(&mut self, map: &LayerId, subscription: LayerId) {
        if let Some(listeners) = self.listeners.get_mut(map) {
            listeners.retain(|l| l.subscription != subscription);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn surface_with_map() -> (RecordingSurface, LayerId) {
        let mut surface = RecordingSurface::new();
        let map = surface
            .create_map("mapbridge-map-1", &MapControls::default())
            .unwrap();
        (surface, map)
    }

    #[test]
    fn test_mount_point_is_exclusive() {
        let (mut surface, map) = surface_with_map();
        assert!(surface
            .create_map("mapbridge-map-1", &MapControls::default())
            .is_err());

        surface.destroy_map(&map);
        assert!(surface
            .create_map("mapbridge-map-1", &MapControls::default())
            .is_ok());
        assert_eq!(surface.counters().maps_created, 2);
    }

    #[test]
    fn test_destroy_map_takes_children_along() {
        let (mut surface, map) = surface_with_map();
        surface
            .create_marker(&map, LatLng::default(), &MarkerKind::Pin)
            .unwrap();
        surface.create_polygon(&map).unwrap();
        surface
            .add_tile_layer(&map, &TileLayer::openstreetmap())
            .unwrap();

        surface.destroy_map(&map);

        assert_eq!(surface.live_maps(), 0);
        assert_eq!(surface.live_markers(), 0);
        assert_eq!(surface.live_polygons(), 0);
    }

    #[test]
    fn test_style_validation() {
        let (mut surface, map) = surface_with_map();
        let polygon = surface.create_polygon(&map).unwrap();

        let style = PathOptions {
            opacity: 3.0,
            ..PathOptions::default()
        };
        assert!(matches!(
            surface.set_polygon_style(&polygon, &style),
            Err(SurfaceError::InvalidStyle(_))
        ));
        assert_eq!(surface.polygon(polygon).unwrap().style, PathOptions::default());
    }

    #[test]
    fn test_fault_injection_is_one_shot() {
        let (mut surface, map) = surface_with_map();
        surface.fail_next(SurfaceError::Rejected("boom".into()));

        assert!(surface.create_polygon(&map).is_err());
        assert!(surface.create_polygon(&map).is_ok());
    }

    #[test]
    fn test_fire_reaches_matching_listeners_only() {
        let (mut surface, map) = surface_with_map();
        let clicks = Arc::new(AtomicUsize::new(0));

        let seen = Arc::clone(&clicks);
        let subscription = surface
            .on(
                &map,
                EventKind::Click,
                Box::new(move |_| {
                    seen.fetch_add(1, Ordering::SeqCst);
                }),
            )
            .unwrap();

        let moved = SurfaceEvent::MoveEnd {
            center: LatLng::new(1.0, 2.0),
            zoom: 5.0,
        };
        let clicked = SurfaceEvent::Click {
            latlng: LatLng::new(1.0, 2.0),
            container_point: [10.0, 10.0],
        };

        assert_eq!(surface.fire(map, moved), 0);
        assert_eq!(surface.fire(map, clicked), 1);
        assert_eq!(clicks.load(Ordering::SeqCst), 1);

        surface.off(&map, subscription);
        assert_eq!(surface.fire(map, clicked), 0);
    }

    #[test]
    fn test_marker_shape_cannot_change_in_place() {
        let (mut surface, map) = surface_with_map();
        let marker = surface
            .create_marker(&map, LatLng::default(), &MarkerKind::Pin)
            .unwrap();
        let circle = MarkerKind::Circle {
            radius_px: 6,
            style: PathOptions::default(),
        };
        assert!(surface.set_marker_appearance(&marker, &circle, None).is_err());
    }
}
