//! # Bridge Context
//!
//! The [`Bridge`] owns everything the synchronization layer keeps between
//! host commands: the drawing surface, the entity registry, the popup table,
//! event subscriptions and the readiness waiter.
//!
//! ```text
//!                       ┌──────────────────────────────────────┐
//!  host command ──────► │ Mutex<BridgeState>                   │
//!                       │   surface   registry   popups        │
//!                       │   subscriptions        waiter        │
//!                       └──────────────────────────────────────┘
//!                                  ▲               │
//!                 surface listener │               ▼ oneshot
//!                        relay task ◄──── events   parked subscribe()
//! ```
//!
//! ## Locking
//!
//! One `parking_lot::Mutex` guards all state. Every operation body runs under
//! it from precondition check to last surface call, so no other operation can
//! see a half-built entity. The guard is never held across an `.await`: the
//! two suspension points (waiting for a map, the settle delay after building
//! one) release it first and take it again afterwards.

mod map;
mod marker;
mod polygon;
mod popup;

pub use popup::PopupRecord;

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use mapbridge_shared::{BodyId, EntityKind, MapId, MarkerId, PolygonId, PopupId};
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::config::BridgeConfig;
use crate::error::{BridgeError, BridgeResult};
use crate::events::Subscriptions;
use crate::registry::Registry;
use crate::surface::DrawingSurface;
use crate::waiter::ReadinessWaiter;

use popup::PopupTable;

/// Bridge statistics.
#[derive(Debug, Default)]
pub struct BridgeStats {
    /// Host commands that succeeded.
    pub commands_ok: AtomicU64,
    /// Host commands that failed.
    pub commands_failed: AtomicU64,
    /// Maps, markers and polygons constructed.
    pub entities_created: AtomicU64,
    /// Events delivered to a host callback.
    pub events_forwarded: AtomicU64,
    /// Events discarded because their subscription was retired.
    pub events_dropped: AtomicU64,
    /// Host callbacks that returned an error or panicked.
    pub callback_failures: AtomicU64,
}

/// Point-in-time copy of [`BridgeStats`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Host commands that succeeded.
    pub commands_ok: u64,
    /// Host commands that failed.
    pub commands_failed: u64,
    /// Maps, markers and polygons constructed.
    pub entities_created: u64,
    /// Events delivered to a host callback.
    pub events_forwarded: u64,
    /// Events discarded because their subscription was retired.
    pub events_dropped: u64,
    /// Host callbacks that returned an error or panicked.
    pub callback_failures: u64,
}

impl BridgeStats {
    /// Reads every counter.
    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            commands_ok: self.commands_ok.load(Ordering::Relaxed),
            commands_failed: self.commands_failed.load(Ordering::Relaxed),
            entities_created: self.entities_created.load(Ordering::Relaxed),
            events_forwarded: self.events_forwarded.load(Ordering::Relaxed),
            events_dropped: self.events_dropped.load(Ordering::Relaxed),
            callback_failures: self.callback_failures.load(Ordering::Relaxed),
        }
    }

    #[inline]
    pub(crate) fn record_created(&self) {
        self.entities_created.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_command(&self, ok: bool) {
        let counter = if ok {
            &self.commands_ok
        } else {
            &self.commands_failed
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Everything behind the bridge lock.
pub(crate) struct BridgeState<S: DrawingSurface> {
    pub(crate) surface: S,
    pub(crate) registry: Registry<S>,
    pub(crate) popups: PopupTable<S::Content>,
    pub(crate) subscriptions: Subscriptions<S>,
    pub(crate) waiter: ReadinessWaiter<S::Map>,
    pub(crate) next_generation: u64,
}

/// Synchronization bridge between a host and a drawing surface.
///
/// Cheap to clone; clones share state.
pub struct Bridge<S: DrawingSurface> {
    pub(crate) state: Arc<Mutex<BridgeState<S>>>,
    pub(crate) config: Arc<BridgeConfig>,
    pub(crate) stats: Arc<BridgeStats>,
}

impl<S: DrawingSurface> Clone for Bridge<S> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            config: Arc::clone(&self.config),
            stats: Arc::clone(&self.stats),
        }
    }
}

impl<S: DrawingSurface> Bridge<S> {
    /// Creates a bridge with the default configuration.
    pub fn new(surface: S) -> Self {
        Self::with_config(surface, BridgeConfig::default())
    }

    /// Creates a bridge.
    pub fn with_config(surface: S, config: BridgeConfig) -> Self {
        Self {
            state: Arc::new(Mutex::new(BridgeState {
                surface,
                registry: Registry::new(),
                popups: PopupTable::default(),
                subscriptions: Subscriptions::new(),
                waiter: ReadinessWaiter::new(),
                next_generation: 0,
            })),
            config: Arc::new(config),
            stats: Arc::new(BridgeStats::default()),
        }
    }

    /// Active configuration.
    #[must_use]
    #[inline]
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Shared statistics.
    #[must_use]
    pub fn stats(&self) -> Arc<BridgeStats> {
        Arc::clone(&self.stats)
    }

    /// Runs `f` with exclusive access to the drawing surface.
    ///
    /// Used to inspect the surface and to dispatch surface-side events.
    /// Do not call back into the bridge from `f`.
    pub fn with_surface<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        f(&mut self.state.lock().surface)
    }

    // ========================================================================
    // INSPECTION
    // ========================================================================

    /// Surface handle of a live map.
    #[must_use]
    pub fn map_handle(&self, map_id: MapId) -> Option<S::Map> {
        self.state
            .lock()
            .registry
            .map(map_id)
            .map(|entry| entry.handle.clone())
    }

    /// Surface handle of a live marker.
    #[must_use]
    pub fn marker_handle(&self, marker_id: MarkerId) -> Option<S::Marker>
    where
        S::Marker: Clone,
    {
        self.state
            .lock()
            .registry
            .marker(marker_id)
            .map(|entry| entry.handle.clone())
    }

    /// Surface handle of a live polygon.
    #[must_use]
    pub fn polygon_handle(&self, polygon_id: PolygonId) -> Option<S::Polygon>
    where
        S::Polygon: Clone,
    {
        self.state
            .lock()
            .registry
            .polygon(polygon_id)
            .map(|entry| entry.handle.clone())
    }

    /// Map a live marker is drawn on.
    #[must_use]
    pub fn marker_map(&self, marker_id: MarkerId) -> Option<MapId> {
        self.state
            .lock()
            .registry
            .marker(marker_id)
            .map(|entry| entry.map_id)
    }

    /// Body id of the stored popup for `owner`.
    #[must_use]
    pub fn popup_body(&self, owner: PopupId) -> Option<BodyId> {
        self.state.lock().popups.get(owner).map(|record| record.body_id)
    }

    /// Copy of the stored popup for `owner`.
    #[must_use]
    pub fn popup_record(&self, owner: PopupId) -> Option<PopupRecord<S::Content>> {
        self.state.lock().popups.get(owner).cloned()
    }

    /// Whether an entity exists. Popups count when their record is stored.
    #[must_use]
    pub fn contains(&self, kind: EntityKind, id: u32) -> bool {
        let state = self.state.lock();
        match kind {
            EntityKind::Popup => state.popups.get(PopupId(id)).is_some(),
            _ => state.registry.contains(kind, id),
        }
    }

    /// Number of live entities of `kind`.
    #[must_use]
    pub fn count(&self, kind: EntityKind) -> usize {
        let state = self.state.lock();
        match kind {
            EntityKind::Popup => state.popups.len(),
            _ => state.registry.len(kind),
        }
    }

    /// Number of active event subscriptions.
    #[must_use]
    pub fn subscription_count(&self) -> usize {
        self.state.lock().subscriptions.len()
    }

    /// Callers currently parked on a map that does not exist yet.
    #[must_use]
    pub fn pending_waits(&self) -> usize {
        self.state.lock().waiter.pending()
    }

    // ========================================================================
    // READINESS
    // ========================================================================

    /// Returns the map's handle, waiting for its creation if necessary.
    ///
    /// Bounded by the configured ready timeout. Bridge teardown cancels the wait.
    pub async fn await_ready(&self, map_id: MapId) -> BridgeResult<S::Map> {
        self.await_ready_or(map_id, std::future::pending::<()>()).await
    }

    /// Like [`Bridge::await_ready`], but also gives up when `cancel` completes.
    pub async fn await_ready_or<F>(&self, map_id: MapId, cancel: F) -> BridgeResult<S::Map>
    where
        F: Future<Output = ()>,
    {
        let receiver = {
            let mut state = self.state.lock();
            if let Some(entry) = state.registry.map(map_id) {
                return Ok(entry.handle.clone());
            }
            debug!(%map_id, "Map not created yet, parking caller");
            state.waiter.register(map_id)
        };

        let wait = async {
            let resolved = async { receiver.await.map_err(|_| BridgeError::Cancelled { map_id }) };
            match self.config.ready_timeout() {
                Some(limit) => match tokio::time::timeout(limit, resolved).await {
                    Ok(result) => result,
                    Err(_) => Err(BridgeError::ReadyTimeout {
                        map_id,
                        waited: limit,
                    }),
                },
                None => resolved.await,
            }
        };

        let outcome = tokio::select! {
            result = wait => result,
            () = cancel => Err(BridgeError::Cancelled { map_id }),
        };
        if outcome.is_err() {
            // Our receiver is gone by now; drop its sender so an id that is
            // never created leaves nothing behind.
            self.state.lock().waiter.forget(map_id);
        }
        outcome
    }

    // ========================================================================
    // TEARDOWN
    // ========================================================================

    /// Tears everything down.
    ///
    /// Detaches every listener and waits for relay tasks to deliver what was
    /// already queued, cancels parked waits, destroys every map and clears all
    /// tables. The bridge stays usable afterwards, starting from empty.
    pub async fn close(&self) {
        let relays = {
            let mut guard = self.state.lock();
            let state = &mut *guard;

            let relays = state.subscriptions.detach_all(&mut state.surface);
            let cancelled = state.waiter.cancel_all();

            let (maps, markers, polygons) = state.registry.drain();
            for (_, entry) in markers {
                state.surface.remove_marker(entry.handle);
            }
            for (_, entry) in polygons {
                state.surface.remove_polygon(entry.handle);
            }
            let map_count = maps.len();
            for (_, entry) in maps {
                if let Some((_, layer)) = entry.tile {
                    state.surface.remove_tile_layer(&entry.handle, layer);
                }
                state.surface.destroy_map(&entry.handle);
            }
            state.popups.clear();

            info!(
                maps = map_count,
                relays = relays.len(),
                cancelled_waits = cancelled,
                "Bridge closed"
            );
            relays
        };

        for relay in relays {
            // A relay only ends abnormally if the runtime is shutting down.
            let _ = relay.await;
        }
    }
}
