//! Movement activity tracking.
//!
//! Movement producers (one per moving entity, possibly many at once) mark
//! entities as active; the scheduler drains the whole set once per tick.
//! Draining swaps the set out under the lock, so a record inserted during
//! a drain lands in the next tick rather than being lost or counted twice.

use std::collections::BTreeSet;
use std::sync::{Mutex, PoisonError};

use pathwear_types::EntityId;

/// Concurrent set of entities that moved since the last evaluation.
#[derive(Debug, Default)]
pub struct ActivityTracker {
    gating: bool,
    moved: Mutex<BTreeSet<EntityId>>,
}

impl ActivityTracker {
    /// A tracker. With `gating` off, movement is never recorded and every
    /// entity is always eligible.
    pub const fn new(gating: bool) -> Self {
        Self {
            gating,
            moved: Mutex::new(BTreeSet::new()),
        }
    }

    /// Whether movement gating is enabled.
    pub const fn is_gating(&self) -> bool {
        self.gating
    }

    /// Record that an entity moved. Returns `true` if the entity had no
    /// pending record. A no-op when gating is disabled.
    pub fn record_movement(&self, id: EntityId) -> bool {
        if !self.gating {
            return false;
        }
        self.moved
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id)
    }

    /// Whether an entity has a pending record.
    pub fn has_moved(&self, id: EntityId) -> bool {
        self.moved
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&id)
    }

    /// Drop a pending record without evaluating it, e.g. on disconnect.
    pub fn forget(&self, id: EntityId) -> bool {
        self.moved
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)
    }

    /// Number of pending records.
    pub fn pending(&self) -> usize {
        self.moved
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Take every pending record, leaving the set empty.
    pub fn drain(&self) -> BTreeSet<EntityId> {
        let mut moved = self.moved.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::take(&mut *moved)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn disabled_gating_records_nothing() {
        let tracker = ActivityTracker::new(false);
        assert!(!tracker.is_gating());
        assert!(!tracker.record_movement(EntityId::new()));
        assert_eq!(tracker.pending(), 0);
    }

    #[test]
    fn records_are_deduplicated_and_drained_once() {
        let tracker = ActivityTracker::new(true);
        let id = EntityId::new();
        assert!(tracker.record_movement(id));
        assert!(!tracker.record_movement(id));
        assert!(tracker.has_moved(id));

        let drained = tracker.drain();
        assert_eq!(drained.len(), 1);
        assert!(drained.contains(&id));
        assert!(tracker.drain().is_empty());
        assert!(!tracker.has_moved(id));
    }

    #[test]
    fn forget_removes_a_pending_record() {
        let tracker = ActivityTracker::new(true);
        let id = EntityId::new();
        tracker.record_movement(id);
        assert!(tracker.forget(id));
        assert!(!tracker.forget(id));
        assert_eq!(tracker.pending(), 0);
    }

    #[test]
    fn concurrent_producers_lose_nothing() {
        let tracker = Arc::new(ActivityTracker::new(true));
        let ids: Vec<EntityId> = (0..400).map(|_| EntityId::new()).collect();

        let mut drained = BTreeSet::new();
        std::thread::scope(|scope| {
            for chunk in ids.chunks(50) {
                let tracker = Arc::clone(&tracker);
                scope.spawn(move || {
                    for &id in chunk {
                        tracker.record_movement(id);
                    }
                });
            }
            for _ in 0..20 {
                let batch = tracker.drain();
                assert!(batch.is_disjoint(&drained));
                drained.extend(batch);
            }
        });
        drained.extend(tracker.drain());

        assert_eq!(drained.len(), ids.len());
        assert!(ids.iter().all(|id| drained.contains(id)));
    }
}
