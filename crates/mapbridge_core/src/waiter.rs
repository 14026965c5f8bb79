//! # Readiness Waiter
//!
//! Parks callers that need a map which has not been created yet.
//!
//! ```text
//! subscribe(map 4) ──► register(4) ──► oneshot rx ──┐
//! subscribe(map 4) ──► register(4) ──► oneshot rx ──┤
//!                                                   │  notify_created(4, handle)
//! update_map(map 4) ── create + register ───────────┴─► every rx resolves
//! ```
//!
//! The waiter is plain data kept under the bridge's state lock, next to the
//! registry. A caller checks the registry and registers here under the same
//! guard, so a creation can never slip between the two.
//!
//! Dropping a sender (teardown, [`ReadinessWaiter::cancel_all`]) resolves the
//! receiver with an error, which the bridge reports as a cancelled wait.

use std::collections::HashMap;

use mapbridge_shared::MapId;
use tokio::sync::oneshot;

/// Pending waits keyed by map id.
#[derive(Debug)]
pub struct ReadinessWaiter<H> {
    pending: HashMap<MapId, Vec<oneshot::Sender<H>>>,
}

impl<H> Default for ReadinessWaiter<H> {
    fn default() -> Self {
        Self {
            pending: HashMap::new(),
        }
    }
}

impl<H: Clone> ReadinessWaiter<H> {
    /// Creates an empty waiter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parks a caller on `map_id`.
    ///
    /// Senders whose receivers were dropped (timed out, cancelled) are pruned
    /// here so an id that is never created does not grow without bound.
    pub fn register(&mut self, map_id: MapId) -> oneshot::Receiver<H> {
        let (tx, rx) = oneshot::channel();
        let waiters = self.pending.entry(map_id).or_default();
        waiters.retain(|sender| !sender.is_closed());
        waiters.push(tx);
        rx
    }

    /// Resolves every caller parked on `map_id`. Returns how many were woken.
    ///
    /// A creation nobody waits for is a no-op.
    pub fn notify_created(&mut self, map_id: MapId, handle: &H) -> usize {
        let Some(waiters) = self.pending.remove(&map_id) else {
            return 0;
        };
        waiters
            .into_iter()
            .filter_map(|sender| sender.send(handle.clone()).ok())
            .count()
    }

    /// Drops abandoned senders for `map_id`, and the id itself once nothing
    /// is parked on it. Returns how many callers remain.
    pub fn forget(&mut self, map_id: MapId) -> usize {
        let Some(waiters) = self.pending.get_mut(&map_id) else {
            return 0;
        };
        waiters.retain(|sender| !sender.is_closed());
        let remaining = waiters.len();
        if remaining == 0 {
            self.pending.remove(&map_id);
        }
        remaining
    }

    /// Drops every pending sender. Parked callers observe cancellation.
    pub fn cancel_all(&mut self) -> usize {
        let cancelled = self.pending();
        self.pending.clear();
        cancelled
    }

    /// Callers still parked, across all ids.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending
            .values()
            .flatten()
            .filter(|sender| !sender.is_closed())
            .count()
    }

    /// Map ids with at least one sender on file, abandoned or not.
    #[must_use]
    pub fn tracked_ids(&self) -> usize {
        self.pending.len()
    }

    /// Callers still parked on one id.
    #[must_use]
    pub fn pending_for(&self, map_id: MapId) -> usize {
        self.pending
            .get(&map_id)
            .map_or(0, |w| w.iter().filter(|s| !s.is_closed()).count())
    }
}
