//! Polygon update and delete.

use mapbridge_shared::{EntityKind, LatLng, PathOptions, PolygonRef, PolygonUpdate, PopupId};
use tracing::{debug, info, warn};

use super::popup::PopupRecord;
use super::{Bridge, BridgeState, BridgeStats};
use crate::error::{BridgeError, BridgeResult};
use crate::registry::PolygonEntry;
use crate::surface::{DrawingSurface, SurfaceResult};

impl<S: DrawingSurface> Bridge<S> {
    /// Applies a polygon description, constructing the polygon on first reference.
    ///
    /// The polygon's map must exist. Naming a different map moves the polygon.
    pub fn update_polygon(&self, update: PolygonUpdate) -> BridgeResult<()> {
        self.state.lock().apply_polygon(&self.stats, &update)
    }

    /// Removes a polygon from its map. Its popup record is kept.
    pub fn delete_polygon(&self, target: PolygonRef) -> BridgeResult<()> {
        self.state.lock().remove_polygon(target)
    }
}

impl<S: DrawingSurface> BridgeState<S> {
    fn apply_polygon(&mut self, stats: &BridgeStats, update: &PolygonUpdate) -> BridgeResult<()> {
        let polygon_id = update.polygon_id;
        let map = self
            .registry
            .map(update.map_id)
            .ok_or_else(|| {
                BridgeError::not_found(
                    EntityKind::Map,
                    update.map_id.get(),
                    format!("updating polygon {}", polygon_id.get()),
                )
            })?
            .handle
            .clone();
        let rings = update.coordinates.clone().into_multi();
        let popup = self.popups.get(PopupId::from(polygon_id));

        let existing = self.registry.polygon(polygon_id).map(|entry| entry.map_id);
        match existing {
            Some(map_id) if map_id == update.map_id => {
                let Some(entry) = self.registry.polygon_mut(polygon_id) else {
                    return Ok(());
                };
                let dressed =
                    dress_polygon(&mut self.surface, &entry.handle, &rings, &update.options, popup);
                if let Err(e) = dressed {
                    let before = entry.applied.coordinates.clone().into_multi();
                    let restored = dress_polygon(
                        &mut self.surface,
                        &entry.handle,
                        &before,
                        &entry.applied.options,
                        popup,
                    );
                    if let Err(restore) = restored {
                        warn!(%polygon_id, error = %restore, "Could not restore polygon");
                    }
                    return Err(e.into());
                }
                entry.applied = update.clone();
                Ok(())
            }
            Some(previous_map) => {
                let handle = self.surface.create_polygon(&map)?;
                let dressed =
                    dress_polygon(&mut self.surface, &handle, &rings, &update.options, popup);
                if let Err(e) = dressed {
                    self.surface.remove_polygon(handle);
                    return Err(e.into());
                }
                let replacement = PolygonEntry::new(handle, update.clone());
                if let Some(previous) = self.registry.set_polygon(polygon_id, replacement) {
                    self.surface.remove_polygon(previous.handle);
                }
                stats.record_created();
                debug!(%polygon_id, from = %previous_map, to = %update.map_id, "Polygon moved");
                Ok(())
            }
            None => {
                let handle = self.surface.create_polygon(&map)?;
                self.registry
                    .set_polygon(polygon_id, PolygonEntry::new(handle, update.clone()));
                let dressed = match self.registry.polygon(polygon_id) {
                    Some(entry) => dress_polygon(
                        &mut self.surface,
                        &entry.handle,
                        &rings,
                        &update.options,
                        popup,
                    ),
                    None => Ok(()),
                };
                if let Err(e) = dressed {
                    if let Some(entry) = self.registry.remove_polygon(polygon_id) {
                        self.surface.remove_polygon(entry.handle);
                    }
                    debug!(%polygon_id, error = %e, "Rolled back polygon construction");
                    return Err(e.into());
                }
                stats.record_created();
                debug!(
                    %polygon_id,
                    map_id = %update.map_id,
                    vertices = update.coordinates.vertex_count(),
                    "Polygon created"
                );
                Ok(())
            }
        }
    }

    fn remove_polygon(&mut self, target: PolygonRef) -> BridgeResult<()> {
        let PolygonRef { map_id, polygon_id } = target;
        if self.registry.map(map_id).is_none() {
            return Err(BridgeError::not_found(
                EntityKind::Map,
                map_id.get(),
                format!("deleting polygon {}", polygon_id.get()),
            ));
        }
        let on_this_map = self
            .registry
            .polygon(polygon_id)
            .is_some_and(|entry| entry.map_id == map_id);
        if !on_this_map {
            return Err(BridgeError::not_found(
                EntityKind::Polygon,
                polygon_id.get(),
                format!("deleting polygon from map {}", map_id.get()),
            ));
        }

        if let Some(entry) = self.registry.remove_polygon(polygon_id) {
            self.surface.remove_polygon(entry.handle);
        }
        info!(%polygon_id, %map_id, "Polygon deleted");
        Ok(())
    }
}

fn dress_polygon<S: DrawingSurface>(
    surface: &mut S,
    handle: &S::Polygon,
    rings: &[Vec<Vec<LatLng>>],
    style: &PathOptions,
    popup: Option<&PopupRecord<S::Content>>,
) -> SurfaceResult<()> {
    surface.set_polygon_rings(handle, rings)?;
    surface.set_polygon_style(handle, style)?;
    if let Some(record) = popup {
        surface.bind_polygon_popup(handle, &record.content, &record.options)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::bridge::Bridge;
    use crate::config::BridgeConfig;
    use crate::error::BridgeError;
    use crate::surface::RecordingSurface;
    use mapbridge_shared::{
        EntityKind, LatLng, MapId, MapPosition, MapUpdate, PathOptions, PolygonId, PolygonRef,
        PolygonRings, PolygonUpdate,
    };
    use std::time::Duration;

    async fn bridge_with_map() -> Bridge<RecordingSurface> {
        let bridge = Bridge::with_config(
            RecordingSurface::new(),
            BridgeConfig::default().with_settle_delay(Duration::ZERO),
        );
        bridge
            .update_map(MapUpdate::new(MapId(1), MapPosition::default()))
            .await
            .unwrap();
        bridge
    }

    fn triangle() -> PolygonRings {
        PolygonRings::Ring(vec![
            LatLng::new(0.0, 0.0),
            LatLng::new(0.0, 1.0),
            LatLng::new(1.0, 0.0),
        ])
    }

    #[tokio::test]
    async fn test_rings_are_normalized_and_applied() {
        let bridge = bridge_with_map().await;
        let style = PathOptions {
            color: "#ff0000".into(),
            ..PathOptions::default()
        };
        bridge
            .update_polygon(
                PolygonUpdate::new(MapId(1), PolygonId(3), triangle()).with_style(style.clone()),
            )
            .unwrap();

        let handle = bridge.polygon_handle(PolygonId(3)).unwrap();
        let record = bridge.with_surface(|s| s.polygon(handle).cloned()).unwrap();
        assert_eq!(record.rings, triangle().into_multi());
        assert_eq!(record.style, style);
    }

    #[tokio::test]
    async fn test_update_is_idempotent() {
        let bridge = bridge_with_map().await;
        let update = PolygonUpdate::new(MapId(1), PolygonId(3), triangle());

        bridge.update_polygon(update.clone()).unwrap();
        let handle = bridge.polygon_handle(PolygonId(3)).unwrap();
        let once = bridge.with_surface(|s| s.polygon(handle).cloned());

        bridge.update_polygon(update).unwrap();
        let twice = bridge.with_surface(|s| s.polygon(handle).cloned());

        assert_eq!(once, twice);
        assert_eq!(bridge.with_surface(|s| s.counters().polygons_created), 1);
    }

    #[tokio::test]
    async fn test_invalid_style_on_new_polygon_rolls_back() {
        let bridge = bridge_with_map().await;
        let style = PathOptions {
            fill_opacity: -1.0,
            ..PathOptions::default()
        };

        let err = bridge
            .update_polygon(PolygonUpdate::new(MapId(1), PolygonId(3), triangle()).with_style(style))
            .unwrap_err();

        assert!(matches!(err, BridgeError::Surface(_)));
        assert_eq!(bridge.count(EntityKind::Polygon), 0);
        assert_eq!(bridge.with_surface(|s| s.live_polygons()), 0);
    }

    #[tokio::test]
    async fn test_rejected_update_restores_polygon() {
        let bridge = bridge_with_map().await;
        bridge
            .update_polygon(PolygonUpdate::new(MapId(1), PolygonId(3), triangle()))
            .unwrap();
        let handle = bridge.polygon_handle(PolygonId(3)).unwrap();

        let square = PolygonRings::Ring(vec![
            LatLng::new(0.0, 0.0),
            LatLng::new(0.0, 2.0),
            LatLng::new(2.0, 2.0),
            LatLng::new(2.0, 0.0),
        ]);
        let washed_out = PathOptions {
            fill_opacity: 3.0,
            ..PathOptions::default()
        };
        let err = bridge
            .update_polygon(PolygonUpdate::new(MapId(1), PolygonId(3), square).with_style(washed_out))
            .unwrap_err();
        assert!(matches!(err, BridgeError::Surface(_)));

        assert_eq!(bridge.polygon_handle(PolygonId(3)), Some(handle));
        let record = bridge.with_surface(|s| s.polygon(handle).cloned()).unwrap();
        assert_eq!(record.rings, triangle().into_multi());
        assert_eq!(record.style, PathOptions::default());
    }

    #[tokio::test]
    async fn test_delete_on_unknown_map() {
        let bridge = bridge_with_map().await;
        let err = bridge
            .delete_polygon(PolygonRef {
                map_id: MapId(2),
                polygon_id: PolygonId(3),
            })
            .unwrap_err();
        assert_eq!(err.to_string(), "Map with id 2 not found when deleting polygon 3");
    }
}
