//! # Drawing Surface Seam
//!
//! The bridge never draws anything itself. Everything visible goes through a
//! [`DrawingSurface`]: construct a map on a mount point, attach tile sources,
//! create and restyle markers and polygons, bind popup content, listen for
//! interaction events and force a layout re-measurement.
//!
//! Every call takes effect synchronously. Handles are opaque to the bridge;
//! the registry owns them and hands them back to the surface when an entity
//! changes or dies.
//!
//! [`RecordingSurface`] is the in-memory implementation used by tests and the
//! headless host.

mod recording;

pub use recording::{
    BoundPopup, LayerId, MapRecord, MarkerRecord, PolygonRecord, RecordingSurface,
    SurfaceCounters,
};

use mapbridge_shared::{
    EventKind, LatLng, MapControls, MapPosition, MarkerIcon, MarkerKind, PathOptions,
    PopupOptions, TileLayer,
};

use crate::error::SurfaceError;

/// Result of a surface call.
pub type SurfaceResult<T> = Result<T, SurfaceError>;

/// Raw interaction event as the drawing library reports it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SurfaceEvent {
    /// Pointer click.
    Click {
        /// Geographic position under the pointer.
        latlng: LatLng,
        /// Pixel position inside the map container.
        container_point: [f64; 2],
    },
    /// Viewport settled after a pan or zoom.
    MoveEnd {
        /// New center.
        center: LatLng,
        /// New zoom level.
        zoom: f64,
    },
}

impl SurfaceEvent {
    /// Kind a listener has to be registered for to see this event.
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::Click { .. } => EventKind::Click,
            Self::MoveEnd { .. } => EventKind::Move,
        }
    }
}

/// Listener attached to a map. Invoked synchronously from the surface's own
/// dispatch, so it must not block.
pub type Listener = Box<dyn Fn(SurfaceEvent) + Send + Sync>;

/// Capabilities the bridge needs from a drawing library.
pub trait DrawingSurface: Send + 'static {
    /// Live map object.
    type Map: Clone + Send + Sync + 'static;
    /// Attached tile source.
    type TileLayer: Send + 'static;
    /// Live marker object.
    type Marker: Send + 'static;
    /// Live polygon object.
    type Polygon: Send + 'static;
    /// Resolved popup body content.
    type Content: Clone + Send + 'static;
    /// Token returned by [`DrawingSurface::on`].
    type Subscription: Send + 'static;

    // ========================================================================
    // MAPS
    // ========================================================================

    /// Constructs a map on the named mount point.
    fn create_map(&mut self, mount: &str, controls: &MapControls) -> SurfaceResult<Self::Map>;

    /// Tears down a map and everything still attached to it.
    fn destroy_map(&mut self, map: &Self::Map);

    /// Moves the viewport.
    fn set_view(&mut self, map: &Self::Map, view: &MapPosition) -> SurfaceResult<()>;

    /// Enables or disables interaction handlers and controls.
    fn set_controls(&mut self, map: &Self::Map, controls: &MapControls) -> SurfaceResult<()>;

    /// Attaches a tile source.
    fn add_tile_layer(&mut self, map: &Self::Map, layer: &TileLayer)
        -> SurfaceResult<Self::TileLayer>;

    /// Detaches a tile source.
    fn remove_tile_layer(&mut self, map: &Self::Map, layer: Self::TileLayer);

    /// Forces the map to re-measure its container.
    fn invalidate_size(&mut self, map: &Self::Map);

    // ========================================================================
    // MARKERS
    // ========================================================================

    /// Creates a marker of the given kind.
    fn create_marker(
        &mut self,
        map: &Self::Map,
        at: LatLng,
        kind: &MarkerKind,
    ) -> SurfaceResult<Self::Marker>;

    /// Moves a marker.
    fn set_marker_position(&mut self, marker: &Self::Marker, at: LatLng) -> SurfaceResult<()>;

    /// Applies circle style or pin icon. `icon: None` restores the default pin.
    fn set_marker_appearance(
        &mut self,
        marker: &Self::Marker,
        kind: &MarkerKind,
        icon: Option<&MarkerIcon>,
    ) -> SurfaceResult<()>;

    /// Removes a marker from its map.
    fn remove_marker(&mut self, marker: Self::Marker);

    // ========================================================================
    // POLYGONS
    // ========================================================================

    /// Creates an empty polygon.
    fn create_polygon(&mut self, map: &Self::Map) -> SurfaceResult<Self::Polygon>;

    /// Replaces the polygon's rings (multi-polygon form).
    fn set_polygon_rings(
        &mut self,
        polygon: &Self::Polygon,
        rings: &[Vec<Vec<LatLng>>],
    ) -> SurfaceResult<()>;

    /// Applies stroke and fill.
    fn set_polygon_style(&mut self, polygon: &Self::Polygon, style: &PathOptions)
        -> SurfaceResult<()>;

    /// Removes a polygon from its map.
    fn remove_polygon(&mut self, polygon: Self::Polygon);

    // ========================================================================
    // POPUPS
    // ========================================================================

    /// Looks up external content by element id.
    fn resolve_content(&self, element_id: &str) -> Option<Self::Content>;

    /// Binds popup content onto a marker, replacing any bound popup.
    fn bind_marker_popup(
        &mut self,
        marker: &Self::Marker,
        content: &Self::Content,
        options: &PopupOptions,
    ) -> SurfaceResult<()>;

    /// Removes the popup bound to a marker, if any.
    fn unbind_marker_popup(&mut self, marker: &Self::Marker);

    /// Binds popup content onto a polygon, replacing any bound popup.
    fn bind_polygon_popup(
        &mut self,
        polygon: &Self::Polygon,
        content: &Self::Content,
        options: &PopupOptions,
    ) -> SurfaceResult<()>;

    /// Removes the popup bound to a polygon, if any.
    fn unbind_polygon_popup(&mut self, polygon: &Self::Polygon);

    // ========================================================================
    // EVENTS
    // ========================================================================

    /// Attaches a listener for one event kind.
    fn on(
        &mut self,
        map: &Self::Map,
        kind: EventKind,
        listener: Listener,
    ) -> SurfaceResult<Self::Subscription>;

    /// Detaches a listener. Dropping the listener is the signal its owner waits for.
    fn off(&mut self, map: &Self::Map, subscription: Self::Subscription);
}
