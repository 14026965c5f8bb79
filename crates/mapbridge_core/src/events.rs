//! # Event Forwarding
//!
//! Relays user interaction on a map back to the host.
//!
//! ```text
//! surface dispatch ──► listener ──► unbounded mpsc ──► relay task ──► host callback
//!      (sync)          (extract)                       (in order)      (async, isolated)
//! ```
//!
//! The listener runs inside the drawing library's own dispatch, so it only
//! extracts the payload and queues it. The relay task runs callbacks one at a
//! time, each in its own task, so an error or panic in one is logged and
//! counted while later events keep flowing.
//!
//! Subscriptions are keyed by `(map id, event kind)`. Subscribing again
//! replaces the previous listener. Deleting the map retires both kinds: their
//! listeners are detached and anything already queued is dropped.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use mapbridge_shared::{EntityKind, EventKind, EventPayload, MapId};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::bridge::{Bridge, BridgeStats};
use crate::error::{BridgeError, BridgeResult, CallbackError};
use crate::surface::{DrawingSurface, Listener, SurfaceEvent};

/// Future returned by a host callback.
pub type CallbackFuture = Pin<Box<dyn Future<Output = Result<(), CallbackError>> + Send>>;

/// Asynchronous host callback receiving one event payload per call.
pub type HostCallback = Arc<dyn Fn(EventPayload) -> CallbackFuture + Send + Sync>;

/// Wraps an async closure as a [`HostCallback`].
pub fn host_callback<F, Fut>(f: F) -> HostCallback
where
    F: Fn(EventPayload) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), CallbackError>> + Send + 'static,
{
    Arc::new(move |payload| Box::pin(f(payload)))
}

/// Pulls the host-facing payload out of a raw surface event.
#[must_use]
pub fn extract(kind: EventKind, event: SurfaceEvent) -> Option<EventPayload> {
    match (kind, event) {
        (EventKind::Click, SurfaceEvent::Click { latlng, .. }) => Some(EventPayload::Click(latlng)),
        (EventKind::Move, SurfaceEvent::MoveEnd { center, zoom }) => {
            Some(EventPayload::Move { center, zoom })
        }
        _ => None,
    }
}

struct Subscription<S: DrawingSurface> {
    map: S::Map,
    token: S::Subscription,
    active: Arc<AtomicBool>,
    relay: JoinHandle<()>,
}

impl<S: DrawingSurface> Subscription<S> {
    /// Stops delivery, detaches the listener and lets the relay task finish.
    fn retire(self, surface: &mut S) {
        self.active.store(false, Ordering::Release);
        surface.off(&self.map, self.token);
    }
}

/// Active subscriptions, keyed by `(map id, event kind)`.
pub(crate) struct Subscriptions<S: DrawingSurface> {
    entries: HashMap<(MapId, EventKind), Subscription<S>>,
}

impl<S: DrawingSurface> Subscriptions<S> {
    pub(crate) fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn contains(&self, map_id: MapId, kind: EventKind) -> bool {
        self.entries.contains_key(&(map_id, kind))
    }

    /// Installs a subscription, retiring whatever held the key before.
    fn replace(
        &mut self,
        surface: &mut S,
        map_id: MapId,
        kind: EventKind,
        subscription: Subscription<S>,
    ) -> bool {
        match self.entries.insert((map_id, kind), subscription) {
            Some(previous) => {
                previous.retire(surface);
                true
            }
            None => false,
        }
    }

    fn remove(&mut self, surface: &mut S, map_id: MapId, kind: EventKind) -> bool {
        match self.entries.remove(&(map_id, kind)) {
            Some(subscription) => {
                subscription.retire(surface);
                true
            }
            None => false,
        }
    }

    /// Retires every subscription on `map_id`. Returns how many there were.
    pub(crate) fn retire_map(&mut self, surface: &mut S, map_id: MapId) -> usize {
        EventKind::ALL
            .into_iter()
            .filter(|kind| self.remove(surface, map_id, *kind))
            .count()
    }

    /// Detaches every listener without discarding queued events and hands
    /// back the relay tasks so the caller can wait for them to drain.
    pub(crate) fn detach_all(&mut self, surface: &mut S) -> Vec<JoinHandle<()>> {
        self.entries
            .drain()
            .map(|(_, subscription)| {
                surface.off(&subscription.map, subscription.token);
                subscription.relay
            })
            .collect()
    }
}

impl<S: DrawingSurface> Bridge<S> {
    /// Forwards every `kind` event on `map_id` to `callback`.
    ///
    /// Waits for the map if it does not exist yet (bounded by the ready
    /// timeout). Replaces any earlier subscription for the same map and kind.
    pub async fn subscribe(
        &self,
        map_id: MapId,
        kind: EventKind,
        callback: HostCallback,
    ) -> BridgeResult<()> {
        self.await_ready(map_id).await?;

        let mut guard = self.state.lock();
        let state = &mut *guard;

        // The map may have been deleted between waking up and taking the lock.
        let map = state
            .registry
            .map(map_id)
            .ok_or_else(|| {
                BridgeError::not_found(EntityKind::Map, map_id.get(), format!("subscribing to {kind}"))
            })?
            .handle
            .clone();

        let (sender, receiver) = mpsc::unbounded_channel();
        let active = Arc::new(AtomicBool::new(true));

        let listener_active = Arc::clone(&active);
        let listener_stats = Arc::clone(&self.stats);
        let listener: Listener = Box::new(move |event| {
            if !listener_active.load(Ordering::Acquire) {
                return;
            }
            if let Some(payload) = extract(kind, event) {
                if sender.send(payload).is_err() {
                    listener_stats.events_dropped.fetch_add(1, Ordering::Relaxed);
                }
            }
        });
        let token = state.surface.on(&map, kind, listener)?;

        let relay = tokio::spawn(relay(
            receiver,
            callback,
            Arc::clone(&active),
            Arc::clone(&self.stats),
            map_id,
            kind,
        ));

        let subscription = Subscription {
            map,
            token,
            active,
            relay,
        };
        let replaced = state
            .subscriptions
            .replace(&mut state.surface, map_id, kind, subscription);
        debug!(%map_id, %kind, replaced, "Subscribed");
        Ok(())
    }

    /// Stops forwarding `kind` events on `map_id`.
    pub fn unsubscribe(&self, map_id: MapId, kind: EventKind) -> BridgeResult<()> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        if state.subscriptions.remove(&mut state.surface, map_id, kind) {
            info!(%map_id, %kind, "Unsubscribed");
            Ok(())
        } else {
            Err(BridgeError::not_found(
                EntityKind::Map,
                map_id.get(),
                format!("unsubscribing from {kind}"),
            ))
        }
    }

    /// Whether `kind` events on `map_id` are being forwarded.
    #[must_use]
    pub fn is_subscribed(&self, map_id: MapId, kind: EventKind) -> bool {
        self.state.lock().subscriptions.contains(map_id, kind)
    }
}

/// Delivers queued payloads to the host, one at a time, until every sender
/// is gone.
async fn relay(
    mut receiver: mpsc::UnboundedReceiver<EventPayload>,
    callback: HostCallback,
    active: Arc<AtomicBool>,
    stats: Arc<BridgeStats>,
    map_id: MapId,
    kind: EventKind,
) {
    while let Some(payload) = receiver.recv().await {
        if !active.load(Ordering::Acquire) {
            stats.events_dropped.fetch_add(1, Ordering::Relaxed);
            continue;
        }

        let callback = Arc::clone(&callback);
        let outcome = tokio::spawn(async move { callback(payload).await }).await;
        match outcome {
            Ok(Ok(())) => {
                stats.events_forwarded.fetch_add(1, Ordering::Relaxed);
            }
            Ok(Err(e)) => {
                stats.callback_failures.fetch_add(1, Ordering::Relaxed);
                warn!(%map_id, %kind, error = %e, "Host callback failed");
            }
            Err(e) => {
                stats.callback_failures.fetch_add(1, Ordering::Relaxed);
                warn!(%map_id, %kind, error = %e, "Host callback panicked");
            }
        }
    }
    debug!(%map_id, %kind, "Relay finished");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BridgeConfig;
    use crate::surface::RecordingSurface;
    use mapbridge_shared::{LatLng, MapPosition, MapRef, MapUpdate};
    use std::time::Duration;
    use tokio::sync::mpsc::UnboundedReceiver;

    fn bridge() -> Bridge<RecordingSurface> {
        Bridge::with_config(
            RecordingSurface::new(),
            BridgeConfig::default().with_settle_delay(Duration::ZERO),
        )
    }

    fn collector() -> (HostCallback, UnboundedReceiver<EventPayload>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let callback = host_callback(move |payload| {
            let tx = tx.clone();
            async move {
                tx.send(payload)
                    .map_err(|_| CallbackError::new("collector gone"))
            }
        });
        (callback, rx)
    }

    fn click(lat: f64, lng: f64) -> SurfaceEvent {
        SurfaceEvent::Click {
            latlng: LatLng::new(lat, lng),
            container_point: [0.0, 0.0],
        }
    }

    async fn create_map(bridge: &Bridge<RecordingSurface>, id: u32) {
        bridge
            .update_map(MapUpdate::new(MapId(id), MapPosition::default()))
            .await
            .unwrap();
    }

    fn fire(bridge: &Bridge<RecordingSurface>, id: u32, event: SurfaceEvent) -> usize {
        let handle = bridge.map_handle(MapId(id)).unwrap();
        bridge.with_surface(|s| s.fire(handle, event))
    }

    #[test]
    fn test_extract_matches_kind() {
        assert_eq!(
            extract(EventKind::Click, click(1.0, 2.0)),
            Some(EventPayload::Click(LatLng::new(1.0, 2.0)))
        );
        assert_eq!(extract(EventKind::Move, click(1.0, 2.0)), None);
    }

    #[tokio::test]
    async fn test_events_reach_host_in_order() {
        let bridge = bridge();
        create_map(&bridge, 1).await;
        let (callback, mut rx) = collector();
        bridge.subscribe(MapId(1), EventKind::Click, callback).await.unwrap();

        fire(&bridge, 1, click(1.0, 1.0));
        fire(&bridge, 1, click(2.0, 2.0));

        assert_eq!(rx.recv().await, Some(EventPayload::Click(LatLng::new(1.0, 1.0))));
        assert_eq!(rx.recv().await, Some(EventPayload::Click(LatLng::new(2.0, 2.0))));
    }

    #[tokio::test]
    async fn test_resubscribe_replaces_listener() {
        let bridge = bridge();
        create_map(&bridge, 1).await;
        let (first, _first_rx) = collector();
        let (second, mut second_rx) = collector();

        bridge.subscribe(MapId(1), EventKind::Click, first).await.unwrap();
        bridge.subscribe(MapId(1), EventKind::Click, second).await.unwrap();

        assert_eq!(fire(&bridge, 1, click(5.0, 5.0)), 1);
        assert_eq!(bridge.subscription_count(), 1);
        assert!(second_rx.recv().await.is_some());
    }

    #[tokio::test]
    async fn test_failing_callback_does_not_stop_later_events() {
        let bridge = bridge();
        create_map(&bridge, 1).await;

        let (tx, mut rx) = mpsc::unbounded_channel();
        let callback = host_callback(move |payload| {
            let tx = tx.clone();
            async move {
                match payload {
                    EventPayload::Click(at) if at.lat < 0.0 => {
                        Err(CallbackError::new("host rejected"))
                    }
                    EventPayload::Click(at) if at.lat > 100.0 => panic!("host blew up"),
                    other => tx
                        .send(other)
                        .map_err(|_| CallbackError::new("collector gone")),
                }
            }
        });
        bridge.subscribe(MapId(1), EventKind::Click, callback).await.unwrap();

        fire(&bridge, 1, click(-1.0, 0.0));
        fire(&bridge, 1, click(500.0, 0.0));
        fire(&bridge, 1, click(3.0, 0.0));

        assert_eq!(rx.recv().await, Some(EventPayload::Click(LatLng::new(3.0, 0.0))));
        let stats = bridge.stats().snapshot();
        assert_eq!(stats.callback_failures, 2);
        assert_eq!(stats.events_forwarded, 1);
    }

    #[tokio::test]
    async fn test_deleting_map_retires_subscriptions() {
        let bridge = bridge();
        create_map(&bridge, 1).await;
        let (click_cb, _click_rx) = collector();
        let (move_cb, _move_rx) = collector();
        bridge.subscribe(MapId(1), EventKind::Click, click_cb).await.unwrap();
        bridge.subscribe(MapId(1), EventKind::Move, move_cb).await.unwrap();
        assert_eq!(bridge.subscription_count(), 2);

        bridge.delete_map(MapRef { map_id: MapId(1) }).unwrap();

        assert_eq!(bridge.subscription_count(), 0);
        assert!(!bridge.is_subscribed(MapId(1), EventKind::Click));
    }

    #[tokio::test]
    async fn test_unsubscribe_unknown() {
        let bridge = bridge();
        assert!(bridge.unsubscribe(MapId(1), EventKind::Move).is_err());
    }
}
