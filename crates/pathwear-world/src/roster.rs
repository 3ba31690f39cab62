//! Thread-safe table of online entities.
//!
//! The host's movement code updates entries while the wear scheduler takes
//! snapshots from another task. A poisoned lock is recovered rather than
//! propagated: the table holds plain snapshots, so a panic mid-update can at
//! worst leave one entity's previous position behind.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

use pathwear_types::{EntityId, EntitySnapshot};

use crate::access::EntityDirectory;

/// Online entities keyed by identity.
#[derive(Debug, Default)]
pub struct EntityRoster {
    entries: RwLock<BTreeMap<EntityId, EntitySnapshot>>,
}

impl EntityRoster {
    /// Create an empty roster.
    pub const fn new() -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
        }
    }

    /// Add or replace an entity.
    pub fn join(&self, snapshot: EntitySnapshot) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(snapshot.id, snapshot);
    }

    /// Remove an entity. Returns its last snapshot if it was online.
    pub fn leave(&self, id: EntityId) -> Option<EntitySnapshot> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.remove(&id)
    }

    /// Apply an in-place change to one entity. Returns `false` if the entity
    /// is not online.
    pub fn update(&self, id: EntityId, change: impl FnOnce(&mut EntitySnapshot)) -> bool {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.get_mut(&id).map(change).is_some()
    }

    /// Snapshot of one entity.
    pub fn get(&self, id: EntityId) -> Option<EntitySnapshot> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.get(&id).cloned()
    }

    /// Identities of every online entity.
    pub fn ids(&self) -> Vec<EntityId> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.keys().copied().collect()
    }

    /// Number of online entities.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether no entity is online.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EntityDirectory for EntityRoster {
    fn online_entities(&self) -> Vec<EntitySnapshot> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.values().cloned().collect()
    }
}
