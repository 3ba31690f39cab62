//! Enumeration types for the Pathwear engine.
//!
//! Covers the two wear zones, movement postures, game modes, the vehicles a
//! host can report, and the footwear vocabulary the modifier resolver reads.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Zones
// ---------------------------------------------------------------------------

/// One of the two surface locations evaluated for each entity per tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Zone {
    /// The block the entity occupies (grass tufts, snow layers, flowers).
    AtFeet,
    /// The block directly beneath the entity (the ground it stands on).
    BelowFeet,
}

impl Zone {
    /// Both zones in evaluation order: the ground first, then the block at
    /// the entity's feet.
    pub const ALL: [Self; 2] = [Self::BelowFeet, Self::AtFeet];

    /// Stable lowercase label used in logs and audit output.
    pub const fn label(self) -> &'static str {
        match self {
            Self::AtFeet => "at_feet",
            Self::BelowFeet => "below_feet",
        }
    }
}

impl core::fmt::Display for Zone {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Posture and game mode
// ---------------------------------------------------------------------------

/// Movement posture reported by the host. The three postures are mutually
/// exclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Posture {
    /// Walking, standing, or any movement that is neither sprint nor crouch.
    #[default]
    Neutral,
    /// Sprinting.
    Sprinting,
    /// Crouching (sneaking).
    Crouching,
}

/// Game mode of an entity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    /// Normal play. Always participates in wear.
    #[default]
    Survival,
    /// Creative building mode.
    Creative,
    /// Adventure maps.
    Adventure,
    /// Non-interacting observer.
    Spectator,
}

impl GameMode {
    /// Whether this mode participates in wear without the creative opt-in.
    pub const fn is_survival(self) -> bool {
        matches!(self, Self::Survival)
    }
}

// ---------------------------------------------------------------------------
// Vehicles and mounts
// ---------------------------------------------------------------------------

/// The three mount families that carry their own wear chance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MountKind {
    /// Any horse-like mount.
    Horse,
    /// Any boat.
    Boat,
    /// A saddled pig.
    Pig,
}

impl core::fmt::Display for MountKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let label = match self {
            Self::Horse => "horse",
            Self::Boat => "boat",
            Self::Pig => "pig",
        };
        f.write_str(label)
    }
}

/// A vehicle an entity may be riding, as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Vehicle {
    /// Horse.
    Horse,
    /// Donkey.
    Donkey,
    /// Mule.
    Mule,
    /// Llama.
    Llama,
    /// Skeleton horse.
    SkeletonHorse,
    /// Zombie horse.
    ZombieHorse,
    /// Camel.
    Camel,
    /// Boat.
    Boat,
    /// Boat with a chest.
    ChestBoat,
    /// Pig.
    Pig,
    /// Minecart. Not a recognized mount.
    Minecart,
    /// Strider. Not a recognized mount.
    Strider,
    /// Anything else the host can seat an entity on.
    Other,
}

impl Vehicle {
    /// Map a vehicle onto its mount family, if it has one.
    ///
    /// All horse-like animals share the horse family; both boat kinds share
    /// the boat family. Minecarts, striders, and unknown vehicles have no
    /// family and fall through to footwear resolution.
    pub const fn mount_kind(self) -> Option<MountKind> {
        match self {
            Self::Horse
            | Self::Donkey
            | Self::Mule
            | Self::Llama
            | Self::SkeletonHorse
            | Self::ZombieHorse
            | Self::Camel => Some(MountKind::Horse),
            Self::Boat | Self::ChestBoat => Some(MountKind::Boat),
            Self::Pig => Some(MountKind::Pig),
            Self::Minecart | Self::Strider | Self::Other => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Footwear
// ---------------------------------------------------------------------------

/// Material of a pair of boots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BootMaterial {
    /// Leather boots.
    Leather,
    /// Chainmail boots.
    Chainmail,
    /// Iron boots.
    Iron,
    /// Golden boots.
    Golden,
    /// Diamond boots.
    Diamond,
    /// Netherite boots.
    Netherite,
}

/// An enchantment that can sit on a pair of boots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Enchantment {
    /// Reduces fall damage. The only enchantment the wear engine reads.
    FeatherFalling,
    /// General protection.
    Protection,
    /// Durability.
    Unbreaking,
    /// Self-repair.
    Mending,
    /// Faster underwater movement.
    DepthStrider,
    /// Freezes water underfoot.
    FrostWalker,
    /// Faster movement on soul blocks.
    SoulSpeed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zone_order_puts_ground_first() {
        assert_eq!(Zone::ALL, [Zone::BelowFeet, Zone::AtFeet]);
    }

    #[test]
    fn horse_family_covers_all_horse_like_mounts() {
        for vehicle in [
            Vehicle::Horse,
            Vehicle::Donkey,
            Vehicle::Mule,
            Vehicle::Llama,
            Vehicle::SkeletonHorse,
            Vehicle::ZombieHorse,
            Vehicle::Camel,
        ] {
            assert_eq!(vehicle.mount_kind(), Some(MountKind::Horse), "{vehicle:?}");
        }
    }

    #[test]
    fn unrecognized_vehicles_have_no_mount_kind() {
        assert_eq!(Vehicle::Minecart.mount_kind(), None);
        assert_eq!(Vehicle::Strider.mount_kind(), None);
        assert_eq!(Vehicle::Other.mount_kind(), None);
        assert_eq!(Vehicle::ChestBoat.mount_kind(), Some(MountKind::Boat));
    }

    #[test]
    fn zone_serializes_snake_case() {
        let json = serde_json::to_string(&Zone::BelowFeet).ok();
        assert_eq!(json.as_deref(), Some("\"below_feet\""));
    }
}
