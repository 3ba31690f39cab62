//! Shared type definitions for the Pathwear terrain wear engine.
//!
//! This crate is the single source of truth for the value types that flow
//! between the host world, the wear-decision engine, and audit sinks.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for entity identifiers
//! - [`enums`] -- Zones, postures, game modes, vehicles, and boot materials
//! - [`surface`] -- The closed set of surface (block) types and name parsing
//! - [`structs`] -- Positions, block locations, entity snapshots, and
//!   transition records

pub mod enums;
pub mod ids;
pub mod structs;
pub mod surface;

// Re-export all public types at crate root for convenience.
pub use enums::{BootMaterial, Enchantment, GameMode, MountKind, Posture, Vehicle, Zone};
pub use ids::EntityId;
pub use structs::{BlockLocation, BlockPos, EntitySnapshot, Footwear, Position, TransitionRecord};
pub use surface::{SurfaceType, UnknownSurface};
