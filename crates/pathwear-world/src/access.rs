//! Traits the wear engine uses to talk to its host.
//!
//! [`SurfaceAccess`] is implemented by whatever owns block-mutation
//! authority. The engine holds it exclusively on one task, so
//! implementations need no internal locking. [`EntityDirectory`] is read
//! from the scheduler task and must be shareable across threads.

use pathwear_types::{BlockLocation, EntitySnapshot, SurfaceType};

use crate::error::SurfaceError;

/// Read and write access to the surface at a block location.
pub trait SurfaceAccess {
    /// Whether the host has a world with this name loaded.
    fn has_world(&self, world: &str) -> bool;

    /// Current surface type at a location.
    ///
    /// # Errors
    ///
    /// Returns [`SurfaceError`] if the world or position is not loaded.
    fn surface_at(&self, location: &BlockLocation) -> Result<SurfaceType, SurfaceError>;

    /// Replace the surface at a location.
    ///
    /// A host may accept the write and still leave the block unchanged (a
    /// protected block, physics reverting the change). Callers that need
    /// certainty read the surface back afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`SurfaceError`] if the world or position is not loaded.
    fn set_surface(
        &mut self,
        location: &BlockLocation,
        surface: SurfaceType,
    ) -> Result<(), SurfaceError>;
}

/// The set of entities currently connected to the host.
pub trait EntityDirectory: Send + Sync {
    /// Snapshot every online entity.
    fn online_entities(&self) -> Vec<EntitySnapshot>;
}
