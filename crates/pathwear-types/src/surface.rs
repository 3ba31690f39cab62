//! Surface (block) types the wear engine can read and write.
//!
//! Surface names follow the host's upper-snake-case block vocabulary
//! (`GRASS_BLOCK`, `DIRT_PATH`). Parsing is case-insensitive and accepts an
//! optional `minecraft:` namespace so configuration can be written either
//! way.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A surface name that does not match any known [`SurfaceType`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown surface type: {name}")]
pub struct UnknownSurface {
    /// The name as it was given.
    pub name: String,
}

/// Generates the [`SurfaceType`] enum together with its name table.
macro_rules! define_surfaces {
    (
        $(
            $(#[$meta:meta])*
            $variant:ident => $name:literal
        ),+ $(,)?
    ) => {
        /// A block type that can occupy a position in the world.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "&'static str")]
        pub enum SurfaceType {
            $(
                $(#[$meta])*
                $variant,
            )+
        }

        impl SurfaceType {
            /// Every known surface type.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Canonical upper-snake-case name.
            pub const fn name(self) -> &'static str {
                match self {
                    $(Self::$variant => $name,)+
                }
            }

            fn from_canonical(name: &str) -> Option<Self> {
                match name {
                    $($name => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

define_surfaces! {
    /// Empty space.
    Air => "AIR",
    /// Grass-topped dirt.
    GrassBlock => "GRASS_BLOCK",
    /// Plain dirt.
    Dirt => "DIRT",
    /// Dirt that grass cannot spread onto.
    CoarseDirt => "COARSE_DIRT",
    /// Dirt with hanging roots.
    RootedDirt => "ROOTED_DIRT",
    /// Trodden path block.
    DirtPath => "DIRT_PATH",
    /// Forest floor.
    Podzol => "PODZOL",
    /// Mushroom-island ground.
    Mycelium => "MYCELIUM",
    /// Wet mud.
    Mud => "MUD",
    /// Packed mud.
    PackedMud => "PACKED_MUD",
    /// Moss carpet block.
    MossBlock => "MOSS_BLOCK",
    /// Tilled soil.
    Farmland => "FARMLAND",
    /// Sand.
    Sand => "SAND",
    /// Red sand.
    RedSand => "RED_SAND",
    /// Gravel.
    Gravel => "GRAVEL",
    /// Clay.
    Clay => "CLAY",
    /// Smooth stone.
    Stone => "STONE",
    /// Cobblestone.
    Cobblestone => "COBBLESTONE",
    /// Mossy cobblestone.
    MossyCobblestone => "MOSSY_COBBLESTONE",
    /// Stone bricks.
    StoneBricks => "STONE_BRICKS",
    /// Cracked stone bricks.
    CrackedStoneBricks => "CRACKED_STONE_BRICKS",
    /// Mossy stone bricks.
    MossyStoneBricks => "MOSSY_STONE_BRICKS",
    /// Short grass tuft.
    ShortGrass => "SHORT_GRASS",
    /// Tall grass.
    TallGrass => "TALL_GRASS",
    /// Fern.
    Fern => "FERN",
    /// Large fern.
    LargeFern => "LARGE_FERN",
    /// Dandelion.
    Dandelion => "DANDELION",
    /// Poppy.
    Poppy => "POPPY",
    /// Dead bush.
    DeadBush => "DEAD_BUSH",
    /// Thin snow layer.
    Snow => "SNOW",
    /// Full snow block.
    SnowBlock => "SNOW_BLOCK",
    /// Ice.
    Ice => "ICE",
    /// Regular rail.
    Rail => "RAIL",
    /// Powered rail.
    PoweredRail => "POWERED_RAIL",
    /// Detector rail.
    DetectorRail => "DETECTOR_RAIL",
    /// Activator rail.
    ActivatorRail => "ACTIVATOR_RAIL",
    /// Oak planks.
    OakPlanks => "OAK_PLANKS",
    /// Water.
    Water => "WATER",
}

impl SurfaceType {
    /// Whether this is one of the rail blocks.
    pub const fn is_rail(self) -> bool {
        matches!(
            self,
            Self::Rail | Self::PoweredRail | Self::DetectorRail | Self::ActivatorRail
        )
    }
}

impl FromStr for SurfaceType {
    type Err = UnknownSurface;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        let unqualified = trimmed
            .strip_prefix("minecraft:")
            .or_else(|| trimmed.strip_prefix("MINECRAFT:"))
            .unwrap_or(trimmed);
        let canonical = unqualified.to_uppercase().replace([' ', '-'], "_");
        Self::from_canonical(&canonical).ok_or_else(|| UnknownSurface {
            name: raw.to_owned(),
        })
    }
}

impl TryFrom<String> for SurfaceType {
    type Error = UnknownSurface;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SurfaceType> for &'static str {
    fn from(surface: SurfaceType) -> Self {
        surface.name()
    }
}

impl core::fmt::Display for SurfaceType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}
