//! Error types for the `pathwear-world` crate.

use pathwear_types::BlockLocation;

/// Errors that can occur when reading or writing surfaces.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SurfaceError {
    /// The named world is not loaded by the host.
    #[error("unknown world: {0}")]
    UnknownWorld(String),

    /// A world with the same name is already loaded.
    #[error("duplicate world: {0}")]
    DuplicateWorld(String),

    /// The position lies outside the loaded area of its world.
    #[error("location {0} is not loaded")]
    NotLoaded(BlockLocation),
}
