//! Modifier-class resolution.
//!
//! Every evaluation selects exactly one [`ModifierClass`] for the entity.
//! Precedence, highest first:
//!
//! 1. A recognized mount ([`MountKind`]) overrides any footwear state.
//! 2. Protective footwear enchanted with fall protection.
//! 3. Protective footwear.
//! 4. Basic footwear.
//! 5. No footwear, which also covers materials in neither set.

use pathwear_types::{BootMaterial, EntitySnapshot, Enchantment, MountKind};
use serde::{Deserialize, Serialize};

/// Materials that count as protective footwear.
pub const PROTECTIVE_MATERIALS: [BootMaterial; 4] = [
    BootMaterial::Iron,
    BootMaterial::Golden,
    BootMaterial::Diamond,
    BootMaterial::Netherite,
];

/// The single material that counts as basic footwear.
pub const BASIC_MATERIAL: BootMaterial = BootMaterial::Leather;

/// The enchantment that upgrades protective footwear.
pub const FALL_PROTECTION: Enchantment = Enchantment::FeatherFalling;

/// The contextual category that selects an entity's base wear chance.
///
/// Variant order is precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModifierClass {
    /// Riding a recognized mount.
    MountedSpecial(MountKind),
    /// Protective footwear carrying fall protection.
    FallProtectionEnchanted,
    /// Protective footwear without fall protection.
    ProtectiveFootwear,
    /// Basic footwear.
    BasicFootwear,
    /// Barefoot, or wearing something neither protective nor basic.
    NoFootwear,
}

impl core::fmt::Display for ModifierClass {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::MountedSpecial(kind) => write!(f, "mounted_{kind}"),
            Self::FallProtectionEnchanted => f.write_str("fall_protection_enchanted"),
            Self::ProtectiveFootwear => f.write_str("protective_footwear"),
            Self::BasicFootwear => f.write_str("basic_footwear"),
            Self::NoFootwear => f.write_str("no_footwear"),
        }
    }
}

/// Resolve the modifier class of an entity snapshot.
pub fn resolve(entity: &EntitySnapshot) -> ModifierClass {
    if let Some(kind) = entity.vehicle.and_then(pathwear_types::Vehicle::mount_kind) {
        return ModifierClass::MountedSpecial(kind);
    }

    let Some(footwear) = entity.footwear.as_ref() else {
        return ModifierClass::NoFootwear;
    };

    if PROTECTIVE_MATERIALS.contains(&footwear.material) {
        if footwear.has(FALL_PROTECTION) {
            ModifierClass::FallProtectionEnchanted
        } else {
            ModifierClass::ProtectiveFootwear
        }
    } else if footwear.material == BASIC_MATERIAL {
        ModifierClass::BasicFootwear
    } else {
        ModifierClass::NoFootwear
    }
}
