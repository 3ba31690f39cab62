//! Base chances and posture deltas.
//!
//! A [`ChanceTable`] is compiled once from configuration. Lookups never
//! fail: classes and zones without a configured value read as zero.

use std::collections::BTreeMap;

use pathwear_types::{MountKind, Posture, Zone};
use tracing::warn;

use crate::config::{AdditiveModifiersConfig, ChanceModifiersConfig};
use crate::modifier::ModifierClass;

/// Upper bound of every effective chance, and the exclusive upper bound of
/// the wear draw.
pub const MAX_CHANCE: u32 = 100;

/// Posture deltas for one zone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct PostureDeltas {
    sprinting: i32,
    crouching: i32,
}

/// Base chance per modifier class plus per-zone posture deltas.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChanceTable {
    base: BTreeMap<ModifierClass, i32>,
    deltas: BTreeMap<Zone, PostureDeltas>,
}

impl ChanceTable {
    /// An empty table: every lookup reads zero.
    pub const fn new() -> Self {
        Self {
            base: BTreeMap::new(),
            deltas: BTreeMap::new(),
        }
    }

    /// Compile the chance sections of the configuration.
    ///
    /// A missing section is a configuration defect: it is reported and
    /// its values read as zero.
    pub fn from_config(
        chances: Option<&ChanceModifiersConfig>,
        additive: Option<&AdditiveModifiersConfig>,
    ) -> Self {
        let mut table = Self::new();

        match chances {
            Some(c) => {
                table.set_base(ModifierClass::NoFootwear, c.no_boots);
                table.set_base(ModifierClass::BasicFootwear, c.leather_boots);
                table.set_base(ModifierClass::ProtectiveFootwear, c.has_boots);
                table.set_base(ModifierClass::FallProtectionEnchanted, c.feather_falling);
                table.set_base(ModifierClass::MountedSpecial(MountKind::Horse), c.riding_horse);
                table.set_base(ModifierClass::MountedSpecial(MountKind::Boat), c.riding_boat);
                table.set_base(ModifierClass::MountedSpecial(MountKind::Pig), c.riding_pig);
            }
            None => warn!(
                section = "chance_modifiers",
                "Expected configuration section is missing; every base chance is 0"
            ),
        }

        match additive {
            Some(a) => {
                table.set_delta(Zone::BelowFeet, Posture::Sprinting, a.sprinting_block_below);
                table.set_delta(Zone::AtFeet, Posture::Sprinting, a.sprinting_block_at_feet);
                table.set_delta(Zone::BelowFeet, Posture::Crouching, a.crouching_block_below);
                table.set_delta(Zone::AtFeet, Posture::Crouching, a.crouching_block_at_feet);
            }
            None => warn!(
                section = "additive_modifiers",
                "Expected configuration section is missing; posture deltas are 0"
            ),
        }

        table
    }

    /// Set the base chance of a class. Values outside `0..=100` are kept
    /// as given and clamped only when the effective chance is computed.
    pub fn set_base(&mut self, class: ModifierClass, chance: i32) {
        self.base.insert(class, chance);
    }

    /// Set the delta applied in `zone` while in `posture`. Setting a
    /// neutral delta is ignored: neutral movement never adjusts the chance.
    pub fn set_delta(&mut self, zone: Zone, posture: Posture, delta: i32) {
        let entry = self.deltas.entry(zone).or_default();
        match posture {
            Posture::Neutral => {}
            Posture::Sprinting => entry.sprinting = delta,
            Posture::Crouching => entry.crouching = delta,
        }
    }

    /// Builder form of [`set_base`](Self::set_base).
    #[must_use]
    pub fn with_base(mut self, class: ModifierClass, chance: i32) -> Self {
        self.set_base(class, chance);
        self
    }

    /// Builder form of [`set_delta`](Self::set_delta).
    #[must_use]
    pub fn with_delta(mut self, zone: Zone, posture: Posture, delta: i32) -> Self {
        self.set_delta(zone, posture, delta);
        self
    }

    /// Configured base chance of a class, unclamped.
    pub fn base_chance(&self, class: ModifierClass) -> i32 {
        self.base.get(&class).copied().unwrap_or(0)
    }

    /// Additive offset for a zone and posture.
    pub fn delta(&self, zone: Zone, posture: Posture) -> i32 {
        let Some(deltas) = self.deltas.get(&zone) else {
            return 0;
        };
        match posture {
            Posture::Neutral => 0,
            Posture::Sprinting => deltas.sprinting,
            Posture::Crouching => deltas.crouching,
        }
    }

    /// Base chance plus the posture delta for the zone, clamped to
    /// `0..=100`. A draw mutates iff it is strictly below this value.
    pub fn effective_chance(&self, class: ModifierClass, zone: Zone, posture: Posture) -> u32 {
        let raw = self.base_chance(class).saturating_add(self.delta(zone, posture));
        u32::try_from(raw.max(0)).map_or(0, |chance| chance.min(MAX_CHANCE))
    }
}
