//! Host-side world state for the Pathwear terrain wear engine.
//!
//! The wear engine never owns the world. It reads and writes surfaces
//! through the [`SurfaceAccess`] trait and learns which entities are online
//! through the [`EntityDirectory`] trait. This crate defines both seams and
//! ships in-memory implementations used by the sandbox engine and tests.
//!
//! # Modules
//!
//! - [`access`] -- The [`SurfaceAccess`] and [`EntityDirectory`] traits.
//! - [`error`] -- Error types for surface operations.
//! - [`grid`] -- [`SurfaceGrid`], a sparse multi-world block store.
//! - [`roster`] -- [`EntityRoster`], a thread-safe table of online entities.
//! - [`sandbox`] -- A flat meadow world with a rail line and a plaza.

pub mod access;
pub mod error;
pub mod grid;
pub mod roster;
pub mod sandbox;

// Re-export primary types at crate root.
pub use access::{EntityDirectory, SurfaceAccess};
pub use error::SurfaceError;
pub use grid::SurfaceGrid;
pub use roster::EntityRoster;
pub use sandbox::{SandboxLayout, build_meadow};
