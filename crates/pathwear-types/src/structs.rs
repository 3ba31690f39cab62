//! Core value structs for the Pathwear engine.
//!
//! Covers entity positions, block coordinates, the read-only
//! [`EntitySnapshot`] a host hands to each evaluation, and the
//! [`TransitionRecord`] emitted to audit sinks after a confirmed swap.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::{BootMaterial, Enchantment, GameMode, Posture, Vehicle, Zone};
use crate::ids::EntityId;
use crate::surface::SurfaceType;

// ---------------------------------------------------------------------------
// Coordinates
// ---------------------------------------------------------------------------

/// Continuous position of an entity inside a world.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// East-west coordinate.
    pub x: f64,
    /// Vertical coordinate. Whole numbers mean the entity stands on top of a
    /// full block.
    pub y: f64,
    /// North-south coordinate.
    pub z: f64,
}

impl Position {
    /// Create a position from its three coordinates.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// The block containing this position.
    #[allow(clippy::cast_possible_truncation)]
    pub fn block(&self) -> BlockPos {
        // World coordinates stay far inside i32 range; `as` saturates anyway.
        BlockPos::new(
            self.x.floor() as i32,
            self.y.floor() as i32,
            self.z.floor() as i32,
        )
    }

    /// Whether the entity's feet rest exactly on a block boundary.
    ///
    /// False while jumping, falling, or standing on slabs and stairs.
    pub fn on_whole_block(&self) -> bool {
        self.y.fract().abs() < f64::EPSILON
    }
}

/// Integer coordinates of a single block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BlockPos {
    /// East-west coordinate.
    pub x: i32,
    /// Vertical coordinate.
    pub y: i32,
    /// North-south coordinate.
    pub z: i32,
}

impl BlockPos {
    /// Create a block position.
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// The block directly above.
    pub const fn up(self) -> Self {
        Self::new(self.x, self.y.saturating_add(1), self.z)
    }

    /// The block directly below.
    pub const fn down(self) -> Self {
        Self::new(self.x, self.y.saturating_sub(1), self.z)
    }
}

impl core::fmt::Display for BlockPos {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{},{},{}", self.x, self.y, self.z)
    }
}

/// A block position qualified by the world it lives in.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BlockLocation {
    /// World name.
    pub world: String,
    /// Position inside the world.
    pub pos: BlockPos,
}

impl BlockLocation {
    /// Create a block location.
    pub fn new(world: impl Into<String>, pos: BlockPos) -> Self {
        Self {
            world: world.into(),
            pos,
        }
    }

    /// The location directly above this one, in the same world.
    pub fn above(&self) -> Self {
        Self {
            world: self.world.clone(),
            pos: self.pos.up(),
        }
    }
}

impl core::fmt::Display for BlockLocation {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}@{}", self.world, self.pos)
    }
}

// ---------------------------------------------------------------------------
// Equipment
// ---------------------------------------------------------------------------

/// The boots an entity is wearing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Footwear {
    /// Boot material.
    pub material: BootMaterial,
    /// Enchantments on the boots.
    #[serde(default)]
    pub enchantments: BTreeSet<Enchantment>,
}

impl Footwear {
    /// Unenchanted boots of the given material.
    pub const fn plain(material: BootMaterial) -> Self {
        Self {
            material,
            enchantments: BTreeSet::new(),
        }
    }

    /// Add an enchantment, consuming and returning the boots.
    #[must_use]
    pub fn enchanted(mut self, enchantment: Enchantment) -> Self {
        self.enchantments.insert(enchantment);
        self
    }

    /// Whether the boots carry the given enchantment.
    pub fn has(&self, enchantment: Enchantment) -> bool {
        self.enchantments.contains(&enchantment)
    }
}

// ---------------------------------------------------------------------------
// Entity snapshot
// ---------------------------------------------------------------------------

/// Read-only view of one entity at the moment of evaluation.
///
/// Owned by the host; the engine never mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySnapshot {
    /// Entity identity.
    pub id: EntityId,
    /// Display name, carried into audit records.
    pub name: String,
    /// Name of the world the entity is in.
    pub world: String,
    /// Current position.
    pub position: Position,
    /// Boots, if any.
    pub footwear: Option<Footwear>,
    /// Vehicle being ridden, if any.
    pub vehicle: Option<Vehicle>,
    /// Movement posture.
    pub posture: Posture,
    /// Game mode.
    pub game_mode: GameMode,
}

impl EntitySnapshot {
    /// A barefoot, unmounted, survival-mode entity in neutral posture.
    pub fn new(
        id: EntityId,
        name: impl Into<String>,
        world: impl Into<String>,
        position: Position,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            world: world.into(),
            position,
            footwear: None,
            vehicle: None,
            posture: Posture::Neutral,
            game_mode: GameMode::Survival,
        }
    }

    /// Replace the boots.
    #[must_use]
    pub fn wearing(mut self, footwear: Footwear) -> Self {
        self.footwear = Some(footwear);
        self
    }

    /// Seat the entity on a vehicle.
    #[must_use]
    pub const fn riding(mut self, vehicle: Vehicle) -> Self {
        self.vehicle = Some(vehicle);
        self
    }

    /// Replace the posture.
    #[must_use]
    pub const fn with_posture(mut self, posture: Posture) -> Self {
        self.posture = posture;
        self
    }

    /// Replace the game mode.
    #[must_use]
    pub const fn in_mode(mut self, game_mode: GameMode) -> Self {
        self.game_mode = game_mode;
        self
    }

    /// The block the entity occupies.
    pub fn at_feet(&self) -> BlockLocation {
        BlockLocation::new(self.world.clone(), self.position.block())
    }

    /// The block directly beneath the entity.
    pub fn below_feet(&self) -> BlockLocation {
        BlockLocation::new(self.world.clone(), self.position.block().down())
    }

    /// The block evaluated for the given zone.
    pub fn location_for(&self, zone: Zone) -> BlockLocation {
        match zone {
            Zone::AtFeet => self.at_feet(),
            Zone::BelowFeet => self.below_feet(),
        }
    }
}

// ---------------------------------------------------------------------------
// Transition record
// ---------------------------------------------------------------------------

/// A confirmed surface swap, as reported to audit sinks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRecord {
    /// The entity whose movement caused the swap.
    pub entity: EntityId,
    /// The entity's display name at the time of the swap.
    pub entity_name: String,
    /// Zone that was evaluated.
    pub zone: Zone,
    /// Where the swap happened.
    pub location: BlockLocation,
    /// Surface before the swap.
    pub from: SurfaceType,
    /// Surface after the swap.
    pub to: SurfaceType,
    /// Wall-clock time of the swap.
    pub recorded_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_floors_negative_coordinates() {
        let pos = Position::new(-0.5, 64.0, 3.9);
        assert_eq!(pos.block(), BlockPos::new(-1, 64, 3));
    }

    #[test]
    fn whole_block_detection() {
        assert!(Position::new(0.3, 64.0, 0.0).on_whole_block());
        assert!(!Position::new(0.3, 64.5, 0.0).on_whole_block());
        assert!(!Position::new(0.3, 64.42, 0.0).on_whole_block());
    }

    #[test]
    fn zone_locations() {
        let entity = EntitySnapshot::new(
            EntityId::new(),
            "Wren",
            "world",
            Position::new(10.2, 65.0, -4.7),
        );
        assert_eq!(entity.at_feet(), BlockLocation::new("world", BlockPos::new(10, 65, -5)));
        assert_eq!(
            entity.location_for(Zone::BelowFeet),
            BlockLocation::new("world", BlockPos::new(10, 64, -5))
        );
        assert_eq!(entity.below_feet().above(), entity.at_feet());
    }

    #[test]
    fn footwear_enchantments() {
        let boots = Footwear::plain(BootMaterial::Iron).enchanted(Enchantment::FeatherFalling);
        assert!(boots.has(Enchantment::FeatherFalling));
        assert!(!boots.has(Enchantment::Mending));
    }
}
