//! Map update and delete.

use mapbridge_shared::{EntityKind, MapId, MapRef, MapUpdate};
use tracing::{debug, info, warn};

use super::{Bridge, BridgeState, BridgeStats};
use crate::config::BridgeConfig;
use crate::error::{BridgeError, BridgeResult};
use crate::registry::MapEntry;
use crate::surface::{DrawingSurface, SurfaceResult};

impl<S: DrawingSurface> Bridge<S> {
    /// Applies a map description, constructing the map on first reference.
    ///
    /// A newly constructed map is registered and announced to parked callers
    /// before this returns; the size re-measurement follows after the settle
    /// delay. Later updates re-measure at once.
    pub async fn update_map(&self, update: MapUpdate) -> BridgeResult<()> {
        let created = self
            .state
            .lock()
            .apply_map(&self.config, &self.stats, &update)?;

        if let Some(generation) = created {
            let delay = self.config.settle_delay();
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            self.state.lock().settle_map(update.map_id, generation);
        }
        Ok(())
    }

    /// Destroys a map.
    ///
    /// Its markers and polygons go with it and its event subscriptions are
    /// retired. Popup records are kept: they rebind when an entity with the
    /// same id shows up again.
    pub fn delete_map(&self, target: MapRef) -> BridgeResult<()> {
        self.state.lock().remove_map(target)
    }
}

impl<S: DrawingSurface> BridgeState<S> {
    /// Returns the new map's generation when this call constructed it.
    fn apply_map(
        &mut self,
        config: &BridgeConfig,
        stats: &BridgeStats,
        update: &MapUpdate,
    ) -> BridgeResult<Option<u64>> {
        let map_id = update.map_id;

        if self.registry.map(map_id).is_some() {
            self.configure_map(update)?;
            if let Some(entry) = self.registry.map(map_id) {
                self.surface.invalidate_size(&entry.handle);
            }
            return Ok(None);
        }

        let mount = config.mount_id(map_id);
        let handle = self.surface.create_map(&mount, &update.options.controls)?;
        self.next_generation += 1;
        let generation = self.next_generation;
        self.registry
            .set_map(map_id, MapEntry::new(handle.clone(), generation));

        if let Err(e) = self.configure_map(update) {
            if let Some(entry) = self.registry.remove_map(map_id) {
                if let Some((_, layer)) = entry.tile {
                    self.surface.remove_tile_layer(&entry.handle, layer);
                }
                self.surface.destroy_map(&entry.handle);
            }
            debug!(%map_id, error = %e, "Rolled back map construction");
            return Err(e.into());
        }

        stats.record_created();
        let woken = self.waiter.notify_created(map_id, &handle);
        debug!(%map_id, %mount, generation, woken, "Map created");
        Ok(Some(generation))
    }

    /// Pushes controls, viewport and tile source onto a registered map. On
    /// failure the last fully applied controls and viewport are put back.
    fn configure_map(&mut self, update: &MapUpdate) -> SurfaceResult<()> {
        let Some(entry) = self.registry.map_mut(update.map_id) else {
            return Ok(());
        };
        let surface = &mut self.surface;

        if let Err(e) = push_map_options(surface, entry, update) {
            if let Some(previous) = &entry.applied {
                let restored = surface
                    .set_controls(&entry.handle, &previous.options.controls)
                    .and_then(|()| surface.set_view(&entry.handle, &previous.initial_position));
                if let Err(restore) = restored {
                    warn!(map_id = %update.map_id, error = %restore, "Could not restore map");
                }
            }
            return Err(e);
        }
        entry.applied = Some(update.clone());
        Ok(())
    }

    /// Post-construction re-measurement. Skipped if the map was deleted (or
    /// deleted and rebuilt) in the meantime.
    fn settle_map(&mut self, map_id: MapId, generation: u64) {
        match self.registry.map(map_id) {
            Some(entry) if entry.generation == generation => {
                self.surface.invalidate_size(&entry.handle);
            }
            _ => debug!(%map_id, generation, "Map gone before settling"),
        }
    }

    fn remove_map(&mut self, target: MapRef) -> BridgeResult<()> {
        let map_id = target.map_id;
        let entry = self.registry.remove_map(map_id).ok_or_else(|| {
            BridgeError::not_found(EntityKind::Map, map_id.get(), "deleting map")
        })?;

        let retired = self.subscriptions.retire_map(&mut self.surface, map_id);
        let markers = self.registry.take_markers_on(map_id);
        let polygons = self.registry.take_polygons_on(map_id);
        let (marker_count, polygon_count) = (markers.len(), polygons.len());

        for (_, marker) in markers {
            self.surface.remove_marker(marker.handle);
        }
        for (_, polygon) in polygons {
            self.surface.remove_polygon(polygon.handle);
        }
        if let Some((_, layer)) = entry.tile {
            self.surface.remove_tile_layer(&entry.handle, layer);
        }
        self.surface.destroy_map(&entry.handle);

        info!(
            %map_id,
            markers = marker_count,
            polygons = polygon_count,
            subscriptions = retired,
            "Map deleted"
        );
        Ok(())
    }
}

fn push_map_options<S: DrawingSurface>(
    surface: &mut S,
    entry: &mut MapEntry<S>,
    update: &MapUpdate,
) -> SurfaceResult<()> {
    surface.set_controls(&entry.handle, &update.options.controls)?;
    surface.set_view(&entry.handle, &update.initial_position)?;

    let wanted = &update.options.tile_layer;
    if entry.tile_source() != Some(wanted) {
        // Attach first so a rejected source leaves the old one in place.
        let layer = surface.add_tile_layer(&entry.handle, wanted)?;
        if let Some((_, old)) = entry.tile.replace((wanted.clone(), layer)) {
            surface.remove_tile_layer(&entry.handle, old);
        }
    }
    Ok(())
}
