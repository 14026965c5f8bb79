//! Popup update and delete.
//!
//! A popup is stored by owner id, independent of any marker or polygon. It is
//! bound onto the marker and onto the polygon carrying the same number,
//! whichever exist, now and every time either is updated later.

use std::collections::HashMap;

use mapbridge_shared::{
    BodyId, EntityKind, MarkerId, PolygonId, PopupId, PopupOptions, PopupRef, PopupUpdate,
};
use tracing::{debug, info, warn};

use super::{Bridge, BridgeState};
use crate::config::BridgeConfig;
use crate::error::{BridgeError, BridgeResult};
use crate::surface::DrawingSurface;

/// A stored popup.
#[derive(Clone, Debug, PartialEq)]
pub struct PopupRecord<C> {
    /// Body content id the host sent.
    pub body_id: BodyId,
    /// Element the body was resolved from.
    pub element_id: String,
    /// Resolved content.
    pub content: C,
    /// Presentation options.
    pub options: PopupOptions,
}

/// One record per owner id.
#[derive(Debug)]
pub(crate) struct PopupTable<C> {
    records: HashMap<PopupId, PopupRecord<C>>,
}

impl<C> Default for PopupTable<C> {
    fn default() -> Self {
        Self {
            records: HashMap::new(),
        }
    }
}

impl<C> PopupTable<C> {
    pub(crate) fn get(&self, owner: PopupId) -> Option<&PopupRecord<C>> {
        self.records.get(&owner)
    }

    pub(crate) fn insert(
        &mut self,
        owner: PopupId,
        record: PopupRecord<C>,
    ) -> Option<PopupRecord<C>> {
        self.records.insert(owner, record)
    }

    pub(crate) fn remove(&mut self, owner: PopupId) -> Option<PopupRecord<C>> {
        self.records.remove(&owner)
    }

    pub(crate) fn len(&self) -> usize {
        self.records.len()
    }

    pub(crate) fn clear(&mut self) {
        self.records.clear();
    }
}

impl<S: DrawingSurface> Bridge<S> {
    /// Stores a popup and binds it onto the marker and polygon with the same id.
    ///
    /// Succeeds when neither exists yet; the record is applied as soon as one
    /// is created or updated. Fails when the body element cannot be resolved.
    pub fn update_popup(&self, update: PopupUpdate) -> BridgeResult<()> {
        self.state.lock().apply_popup(&self.config, update)
    }

    /// Unbinds a popup from its targets and forgets the record.
    pub fn delete_popup(&self, target: PopupRef) -> BridgeResult<()> {
        self.state.lock().remove_popup(target)
    }
}

impl<S: DrawingSurface> BridgeState<S> {
    fn apply_popup(&mut self, config: &BridgeConfig, update: PopupUpdate) -> BridgeResult<()> {
        let owner = update.marker_id;
        let element_id = config.popup_element_id(update.body_id);
        let content = self.surface.resolve_content(&element_id).ok_or_else(|| {
            BridgeError::ContentNotFound {
                element_id: element_id.clone(),
                owner: owner.get(),
            }
        })?;

        let marker = self.registry.marker(MarkerId::from(owner));
        let polygon = self.registry.polygon(PolygonId::from(owner));
        if let Some(entry) = marker {
            self.surface
                .bind_marker_popup(&entry.handle, &content, &update.options)?;
        }
        if let Some(entry) = polygon {
            let bound = self
                .surface
                .bind_polygon_popup(&entry.handle, &content, &update.options);
            if let Err(e) = bound {
                // The marker already carries the new body; give it back the old one.
                if let Some(marker) = marker {
                    match self.popups.get(owner) {
                        Some(previous) => {
                            let restored = self.surface.bind_marker_popup(
                                &marker.handle,
                                &previous.content,
                                &previous.options,
                            );
                            if let Err(restore) = restored {
                                warn!(%owner, error = %restore, "Could not restore marker popup");
                            }
                        }
                        None => self.surface.unbind_marker_popup(&marker.handle),
                    }
                }
                return Err(e.into());
            }
        }
        let bound = usize::from(marker.is_some()) + usize::from(polygon.is_some());

        let replaced = self.popups.insert(
            owner,
            PopupRecord {
                body_id: update.body_id,
                element_id,
                content,
                options: update.options,
            },
        );
        debug!(
            %owner,
            body_id = %update.body_id,
            bound,
            replaced = replaced.is_some(),
            "Popup stored"
        );
        Ok(())
    }

    fn remove_popup(&mut self, target: PopupRef) -> BridgeResult<()> {
        let owner = target.marker_id;
        let record = self.popups.remove(owner).ok_or_else(|| {
            BridgeError::not_found(EntityKind::Popup, owner.get(), "deleting popup")
        })?;

        if let Some(entry) = self.registry.marker(MarkerId::from(owner)) {
            self.surface.unbind_marker_popup(&entry.handle);
        }
        if let Some(entry) = self.registry.polygon(PolygonId::from(owner)) {
            self.surface.unbind_polygon_popup(&entry.handle);
        }
        info!(%owner, body_id = %record.body_id, "Popup deleted");
        Ok(())
    }
}
