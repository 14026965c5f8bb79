//! Marker update and delete.

use mapbridge_shared::{EntityKind, LatLng, MarkerKind, MarkerRef, MarkerUpdate, PopupId};
use tracing::{debug, info, warn};

use super::popup::PopupRecord;
use super::{Bridge, BridgeState, BridgeStats};
use crate::error::{BridgeError, BridgeResult};
use crate::registry::MarkerEntry;
use crate::surface::{DrawingSurface, SurfaceResult};

impl<S: DrawingSurface> Bridge<S> {
    /// Applies a marker description, constructing the marker on first reference.
    ///
    /// The marker's map must exist. A marker that changes maps or switches
    /// between pin and circle is rebuilt; the old object stays until the new
    /// one is fully applied.
    pub fn update_marker(&self, update: MarkerUpdate) -> BridgeResult<()> {
        self.state.lock().apply_marker(&self.stats, &update)
    }

    /// Removes a marker from its map. Its popup record is kept.
    pub fn delete_marker(&self, target: MarkerRef) -> BridgeResult<()> {
        self.state.lock().remove_marker(target)
    }
}

impl<S: DrawingSurface> BridgeState<S> {
    fn apply_marker(&mut self, stats: &BridgeStats, update: &MarkerUpdate) -> BridgeResult<()> {
        let marker_id = update.marker_id;
        let map = self
            .registry
            .map(update.map_id)
            .ok_or_else(|| {
                BridgeError::not_found(
                    EntityKind::Map,
                    update.map_id.get(),
                    format!("updating marker {}", marker_id.get()),
                )
            })?
            .handle
            .clone();
        let popup = self.popups.get(PopupId::from(marker_id));

        match self.registry.marker_mut(marker_id) {
            Some(entry) if entry.map_id == update.map_id && entry.kind().same_shape(&update.kind) => {
                if let Err(e) = dress_marker(&mut self.surface, &entry.handle, update, popup) {
                    // Put back what was drawn before the partial update.
                    if let Err(restore) =
                        dress_marker(&mut self.surface, &entry.handle, &entry.applied, popup)
                    {
                        warn!(%marker_id, error = %restore, "Could not restore marker");
                    }
                    return Err(e.into());
                }
                entry.applied = update.clone();
                return Ok(());
            }
            _ => {}
        }

        let handle = self
            .surface
            .create_marker(&map, LatLng::default(), &update.kind)?;

        if self.registry.marker(marker_id).is_none() {
            self.registry
                .set_marker(marker_id, MarkerEntry::new(handle, update.clone()));
            let dressed = match self.registry.marker(marker_id) {
                Some(entry) => dress_marker(&mut self.surface, &entry.handle, update, popup),
                None => Ok(()),
            };
            if let Err(e) = dressed {
                if let Some(entry) = self.registry.remove_marker(marker_id) {
                    self.surface.remove_marker(entry.handle);
                }
                debug!(%marker_id, error = %e, "Rolled back marker construction");
                return Err(e.into());
            }
            stats.record_created();
            debug!(%marker_id, map_id = %update.map_id, "Marker created");
            return Ok(());
        }

        // Rebuild: the previous object stays registered until its replacement
        // is fully dressed.
        if let Err(e) = dress_marker(&mut self.surface, &handle, update, popup) {
            self.surface.remove_marker(handle);
            return Err(e.into());
        }
        let replacement = MarkerEntry::new(handle, update.clone());
        if let Some(previous) = self.registry.set_marker(marker_id, replacement) {
            debug!(
                %marker_id,
                from = %previous.map_id,
                to = %update.map_id,
                "Marker rebuilt"
            );
            self.surface.remove_marker(previous.handle);
        }
        stats.record_created();
        Ok(())
    }

    fn remove_marker(&mut self, target: MarkerRef) -> BridgeResult<()> {
        let MarkerRef { map_id, marker_id } = target;
        if self.registry.map(map_id).is_none() {
            return Err(BridgeError::not_found(
                EntityKind::Map,
                map_id.get(),
                format!("deleting marker {}", marker_id.get()),
            ));
        }
        match self.registry.marker(marker_id) {
            Some(entry) if entry.map_id == map_id => {}
            _ => {
                return Err(BridgeError::not_found(
                    EntityKind::Marker,
                    marker_id.get(),
                    format!("deleting marker from map {}", map_id.get()),
                ))
            }
        }

        if let Some(entry) = self.registry.remove_marker(marker_id) {
            self.surface.remove_marker(entry.handle);
        }
        info!(%marker_id, %map_id, "Marker deleted");
        Ok(())
    }
}

/// Position, appearance and popup, in that order.
fn dress_marker<S: DrawingSurface>(
    surface: &mut S,
    handle: &S::Marker,
    update: &MarkerUpdate,
    popup: Option<&PopupRecord<S::Content>>,
) -> SurfaceResult<()> {
    surface.set_marker_position(handle, update.coordinate)?;

    // Icons only apply to pins.
    let icon = match update.kind {
        MarkerKind::Pin => update.icon.as_ref(),
        MarkerKind::Circle { .. } => None,
    };
    surface.set_marker_appearance(handle, &update.kind, icon)?;

    if let Some(record) = popup {
        surface.bind_marker_popup(handle, &record.content, &record.options)?;
    }
    Ok(())
}
