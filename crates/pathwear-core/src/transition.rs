//! Surface transition lookup.
//!
//! Configuration lists transitions per zone as `SOURCE:TARGET` entries.
//! Malformed entries and unknown surface names are configuration defects:
//! each is reported and skipped while the rest of the list stays active.
//! Unmapped sources are the normal case and simply leave the surface alone.

use std::collections::BTreeMap;

use pathwear_types::{SurfaceType, Zone};
use tracing::{debug, warn};

use crate::config::BlockModificationsConfig;

/// Separator between the source and target of a transition entry.
pub const ENTRY_SEPARATOR: char = ':';

/// A transition entry that could not be compiled.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionDefect {
    /// The entry does not have exactly one separator.
    #[error("invalid transition format '{entry}', expected SOURCE:TARGET")]
    Malformed {
        /// The raw entry.
        entry: String,
    },

    /// One side of the entry names no known surface.
    #[error("invalid surface type '{name}' in transition '{entry}'")]
    UnknownSurface {
        /// The raw entry.
        entry: String,
        /// The unrecognized name.
        name: String,
    },
}

/// Parse a single `SOURCE:TARGET` entry.
pub fn parse_entry(entry: &str) -> Result<(SurfaceType, SurfaceType), TransitionDefect> {
    let parts: Vec<&str> = entry.split(ENTRY_SEPARATOR).collect();
    let &[source, target] = parts.as_slice() else {
        return Err(TransitionDefect::Malformed {
            entry: entry.to_owned(),
        });
    };

    let parse_side = |name: &str| {
        name.parse::<SurfaceType>()
            .map_err(|unknown| TransitionDefect::UnknownSurface {
                entry: entry.to_owned(),
                name: unknown.name.trim().to_owned(),
            })
    };

    Ok((parse_side(source)?, parse_side(target)?))
}

/// Per-zone mapping from source surface to target surface.
///
/// At most one target exists per source per zone. Lookups are pure for
/// the lifetime of the table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransitionTable {
    at_feet: BTreeMap<SurfaceType, SurfaceType>,
    below_feet: BTreeMap<SurfaceType, SurfaceType>,
}

impl TransitionTable {
    /// An empty table.
    pub const fn new() -> Self {
        Self {
            at_feet: BTreeMap::new(),
            below_feet: BTreeMap::new(),
        }
    }

    /// Compile the transition lists of the configuration.
    pub fn from_config(config: Option<&BlockModificationsConfig>) -> Self {
        let mut table = Self::new();
        let Some(config) = config else {
            warn!(
                section = "block_modifications",
                "Expected configuration section is missing; no surface will ever change"
            );
            return table;
        };

        table.extend_zone(Zone::AtFeet, &config.block_at_feet);
        table.extend_zone(Zone::BelowFeet, &config.block_below);
        table
    }

    /// Compile raw entries into one zone, skipping defects.
    ///
    /// Returns how many entries were accepted. When a source appears more
    /// than once the last entry wins.
    pub fn extend_zone<S: AsRef<str>>(&mut self, zone: Zone, entries: &[S]) -> usize {
        if entries.is_empty() {
            warn!(zone = %zone, "Transition list is empty; this zone will never change");
            return 0;
        }

        let mut accepted: usize = 0;
        for raw in entries {
            let entry = raw.as_ref();
            match parse_entry(entry) {
                Ok((source, target)) => {
                    if let Some(previous) = self.insert(zone, source, target) {
                        warn!(
                            zone = %zone,
                            source = %source,
                            previous = %previous,
                            target = %target,
                            "Duplicate transition source; keeping the later entry"
                        );
                    }
                    accepted = accepted.saturating_add(1);
                }
                Err(defect) => warn!(zone = %zone, error = %defect, "Skipping transition entry"),
            }
        }

        debug!(zone = %zone, accepted, total = entries.len(), "Transition list compiled");
        accepted
    }

    /// Map `source` to `target` in `zone`, returning any replaced target.
    pub fn insert(&mut self, zone: Zone, source: SurfaceType, target: SurfaceType) -> Option<SurfaceType> {
        self.zone_mut(zone).insert(source, target)
    }

    /// Builder form of [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, zone: Zone, source: SurfaceType, target: SurfaceType) -> Self {
        self.insert(zone, source, target);
        self
    }

    /// The configured target for a source surface in a zone.
    pub fn target_for(&self, zone: Zone, source: SurfaceType) -> Option<SurfaceType> {
        self.zone(zone).get(&source).copied()
    }

    /// Number of transitions configured for a zone.
    pub fn len(&self, zone: Zone) -> usize {
        self.zone(zone).len()
    }

    /// Whether no zone has any transition.
    pub fn is_empty(&self) -> bool {
        self.at_feet.is_empty() && self.below_feet.is_empty()
    }

    const fn zone(&self, zone: Zone) -> &BTreeMap<SurfaceType, SurfaceType> {
        match zone {
            Zone::AtFeet => &self.at_feet,
            Zone::BelowFeet => &self.below_feet,
        }
    }

    const fn zone_mut(&mut self, zone: Zone) -> &mut BTreeMap<SurfaceType, SurfaceType> {
        match zone {
            Zone::AtFeet => &mut self.at_feet,
            Zone::BelowFeet => &mut self.below_feet,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid_entries() {
        assert_eq!(
            parse_entry("GRASS_BLOCK:DIRT_PATH").unwrap(),
            (SurfaceType::GrassBlock, SurfaceType::DirtPath)
        );
        assert_eq!(
            parse_entry(" short_grass : air ").unwrap(),
            (SurfaceType::ShortGrass, SurfaceType::Air)
        );
    }

    #[test]
    fn parse_rejects_wrong_separator_count() {
        for entry in ["STONE-COBBLESTONE", "", "A:B:C", "minecraft:stone:minecraft:cobblestone"] {
            assert!(
                matches!(parse_entry(entry), Err(TransitionDefect::Malformed { .. })),
                "{entry} should be malformed"
            );
        }
    }

    #[test]
    fn parse_rejects_unknown_names() {
        let err = parse_entry("GRASS_BLOCK:MARBLE").unwrap_err();
        assert_eq!(
            err,
            TransitionDefect::UnknownSurface {
                entry: "GRASS_BLOCK:MARBLE".to_owned(),
                name: "MARBLE".to_owned(),
            }
        );
        assert!(matches!(parse_entry(":DIRT"), Err(TransitionDefect::UnknownSurface { .. })));
    }

    #[test]
    fn defects_are_skipped_and_valid_entries_kept() {
        let config = BlockModificationsConfig {
            block_at_feet: vec!["SHORT_GRASS:AIR".to_owned()],
            block_below: vec![
                "GRASS_BLOCK:DIRT".to_owned(),
                "STONE-COBBLESTONE".to_owned(),
                "DIRT:NOT_A_BLOCK".to_owned(),
                "DIRT:DIRT_PATH".to_owned(),
            ],
        };
        let table = TransitionTable::from_config(Some(&config));

        assert_eq!(table.len(Zone::BelowFeet), 2);
        assert_eq!(table.len(Zone::AtFeet), 1);
        assert_eq!(table.target_for(Zone::BelowFeet, SurfaceType::GrassBlock), Some(SurfaceType::Dirt));
        assert_eq!(table.target_for(Zone::BelowFeet, SurfaceType::Dirt), Some(SurfaceType::DirtPath));
        assert_eq!(table.target_for(Zone::BelowFeet, SurfaceType::Stone), None);
    }

    #[test]
    fn zones_are_independent() {
        let table = TransitionTable::new().with(Zone::AtFeet, SurfaceType::ShortGrass, SurfaceType::Air);
        assert_eq!(table.target_for(Zone::AtFeet, SurfaceType::ShortGrass), Some(SurfaceType::Air));
        assert_eq!(table.target_for(Zone::BelowFeet, SurfaceType::ShortGrass), None);
    }

    #[test]
    fn last_duplicate_wins() {
        let mut table = TransitionTable::new();
        let accepted = table.extend_zone(Zone::BelowFeet, &["DIRT:COARSE_DIRT", "DIRT:DIRT_PATH"]);
        assert_eq!(accepted, 2);
        assert_eq!(table.len(Zone::BelowFeet), 1);
        assert_eq!(table.target_for(Zone::BelowFeet, SurfaceType::Dirt), Some(SurfaceType::DirtPath));
    }

    #[test]
    fn lookup_is_pure() {
        let table = TransitionTable::from_config(Some(&BlockModificationsConfig::default()));
        let first = table.target_for(Zone::BelowFeet, SurfaceType::GrassBlock);
        for _ in 0..10 {
            assert_eq!(table.target_for(Zone::BelowFeet, SurfaceType::GrassBlock), first);
        }
    }

    #[test]
    fn missing_or_empty_lists_compile_to_nothing() {
        assert!(TransitionTable::from_config(None).is_empty());

        let empty = BlockModificationsConfig {
            block_at_feet: Vec::new(),
            block_below: Vec::new(),
        };
        assert!(TransitionTable::from_config(Some(&empty)).is_empty());
    }
}
