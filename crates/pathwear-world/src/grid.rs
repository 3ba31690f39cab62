//! Sparse in-memory block store spanning any number of named worlds.
//!
//! Positions that were never written read back as [`SurfaceType::Air`].
//! Each world has a vertical build range; positions outside it are not
//! loaded. Individual positions can be pinned: the grid accepts writes to a
//! pinned position but leaves the block as it was, which is how a host
//! behaves when a protection layer or block physics reverts a change.

use std::collections::{BTreeMap, BTreeSet};

use pathwear_types::{BlockLocation, BlockPos, SurfaceType};

use crate::access::SurfaceAccess;
use crate::error::SurfaceError;

/// Lowest loaded block height in a default world.
pub const DEFAULT_MIN_Y: i32 = -64;

/// Highest loaded block height in a default world.
pub const DEFAULT_MAX_Y: i32 = 319;

/// Blocks and pins for one world.
#[derive(Debug, Clone)]
struct WorldSurfaces {
    /// Lowest loaded height (inclusive).
    min_y: i32,
    /// Highest loaded height (inclusive).
    max_y: i32,
    /// Every non-air block.
    blocks: BTreeMap<BlockPos, SurfaceType>,
    /// Positions whose writes are silently discarded.
    pinned: BTreeSet<BlockPos>,
}

impl WorldSurfaces {
    const fn new(min_y: i32, max_y: i32) -> Self {
        Self {
            min_y,
            max_y,
            blocks: BTreeMap::new(),
            pinned: BTreeSet::new(),
        }
    }

    const fn is_loaded(&self, pos: BlockPos) -> bool {
        pos.y >= self.min_y && pos.y <= self.max_y
    }

    fn write(&mut self, pos: BlockPos, surface: SurfaceType) {
        if surface == SurfaceType::Air {
            self.blocks.remove(&pos);
        } else {
            self.blocks.insert(pos, surface);
        }
    }
}

/// A sparse block store for several worlds.
#[derive(Debug, Clone, Default)]
pub struct SurfaceGrid {
    /// Worlds indexed by name.
    worlds: BTreeMap<String, WorldSurfaces>,
}

impl SurfaceGrid {
    /// Create an empty grid with no worlds loaded.
    pub const fn new() -> Self {
        Self {
            worlds: BTreeMap::new(),
        }
    }

    /// Load an empty world with the default build range.
    ///
    /// # Errors
    ///
    /// Returns [`SurfaceError::DuplicateWorld`] if the name is taken.
    pub fn add_world(&mut self, name: &str) -> Result<(), SurfaceError> {
        self.add_world_with_range(name, DEFAULT_MIN_Y, DEFAULT_MAX_Y)
    }

    /// Load an empty world with an explicit inclusive build range.
    ///
    /// # Errors
    ///
    /// Returns [`SurfaceError::DuplicateWorld`] if the name is taken.
    pub fn add_world_with_range(
        &mut self,
        name: &str,
        min_y: i32,
        max_y: i32,
    ) -> Result<(), SurfaceError> {
        if self.worlds.contains_key(name) {
            return Err(SurfaceError::DuplicateWorld(name.to_owned()));
        }
        self.worlds
            .insert(name.to_owned(), WorldSurfaces::new(min_y, max_y));
        Ok(())
    }

    /// Names of all loaded worlds, in sorted order.
    pub fn world_names(&self) -> Vec<String> {
        self.worlds.keys().cloned().collect()
    }

    /// Place a block as world generation would, ignoring pins.
    ///
    /// # Errors
    ///
    /// Returns [`SurfaceError`] if the world or position is not loaded.
    pub fn place(
        &mut self,
        location: &BlockLocation,
        surface: SurfaceType,
    ) -> Result<(), SurfaceError> {
        let world = self.loaded_world_mut(location)?;
        world.write(location.pos, surface);
        Ok(())
    }

    /// Pin a position so later writes through [`SurfaceAccess`] are
    /// discarded.
    ///
    /// # Errors
    ///
    /// Returns [`SurfaceError`] if the world or position is not loaded.
    pub fn pin(&mut self, location: &BlockLocation) -> Result<(), SurfaceError> {
        let world = self.loaded_world_mut(location)?;
        world.pinned.insert(location.pos);
        Ok(())
    }

    /// Count blocks of one surface type in a world. Air is not counted.
    pub fn count(&self, world: &str, surface: SurfaceType) -> usize {
        self.worlds.get(world).map_or(0, |w| {
            w.blocks.values().filter(|&&s| s == surface).count()
        })
    }

    fn loaded_world(&self, location: &BlockLocation) -> Result<&WorldSurfaces, SurfaceError> {
        let world = self
            .worlds
            .get(&location.world)
            .ok_or_else(|| SurfaceError::UnknownWorld(location.world.clone()))?;
        if !world.is_loaded(location.pos) {
            return Err(SurfaceError::NotLoaded(location.clone()));
        }
        Ok(world)
    }

    fn loaded_world_mut(
        &mut self,
        location: &BlockLocation,
    ) -> Result<&mut WorldSurfaces, SurfaceError> {
        let world = self
            .worlds
            .get_mut(&location.world)
            .ok_or_else(|| SurfaceError::UnknownWorld(location.world.clone()))?;
        if !world.is_loaded(location.pos) {
            return Err(SurfaceError::NotLoaded(location.clone()));
        }
        Ok(world)
    }
}

impl SurfaceAccess for SurfaceGrid {
    fn has_world(&self, world: &str) -> bool {
        self.worlds.contains_key(world)
    }

    fn surface_at(&self, location: &BlockLocation) -> Result<SurfaceType, SurfaceError> {
        let world = self.loaded_world(location)?;
        Ok(world
            .blocks
            .get(&location.pos)
            .copied()
            .unwrap_or(SurfaceType::Air))
    }

    fn set_surface(
        &mut self,
        location: &BlockLocation,
        surface: SurfaceType,
    ) -> Result<(), SurfaceError> {
        let world = self.loaded_world_mut(location)?;
        if world.pinned.contains(&location.pos) {
            tracing::trace!(%location, %surface, "write to pinned block discarded");
            return Ok(());
        }
        world.write(location.pos, surface);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn at(x: i32, y: i32, z: i32) -> BlockLocation {
        BlockLocation::new("world", BlockPos::new(x, y, z))
    }

    fn grid() -> SurfaceGrid {
        let mut grid = SurfaceGrid::new();
        grid.add_world("world").unwrap();
        grid
    }

    #[test]
    fn unset_positions_read_as_air() {
        let grid = grid();
        assert_eq!(grid.surface_at(&at(0, 64, 0)).unwrap(), SurfaceType::Air);
    }

    #[test]
    fn writes_are_read_back() {
        let mut grid = grid();
        grid.set_surface(&at(1, 64, 1), SurfaceType::GrassBlock).unwrap();
        assert_eq!(grid.surface_at(&at(1, 64, 1)).unwrap(), SurfaceType::GrassBlock);
        assert_eq!(grid.count("world", SurfaceType::GrassBlock), 1);

        grid.set_surface(&at(1, 64, 1), SurfaceType::Air).unwrap();
        assert_eq!(grid.count("world", SurfaceType::GrassBlock), 0);
    }

    #[test]
    fn unknown_world_is_an_error() {
        let grid = grid();
        let loc = BlockLocation::new("nether", BlockPos::new(0, 0, 0));
        assert_eq!(
            grid.surface_at(&loc),
            Err(SurfaceError::UnknownWorld("nether".to_owned()))
        );
        assert!(!grid.has_world("nether"));
    }

    #[test]
    fn positions_outside_build_range_are_not_loaded() {
        let mut grid = grid();
        let loc = at(0, 400, 0);
        assert!(matches!(grid.surface_at(&loc), Err(SurfaceError::NotLoaded(_))));
        assert!(grid.set_surface(&loc, SurfaceType::Dirt).is_err());
    }

    #[test]
    fn pinned_positions_discard_writes() {
        let mut grid = grid();
        let loc = at(2, 64, 2);
        grid.place(&loc, SurfaceType::GrassBlock).unwrap();
        grid.pin(&loc).unwrap();

        assert!(grid.set_surface(&loc, SurfaceType::Dirt).is_ok());
        assert_eq!(grid.surface_at(&loc).unwrap(), SurfaceType::GrassBlock);

        grid.place(&loc, SurfaceType::Sand).unwrap();
        assert_eq!(grid.surface_at(&loc).unwrap(), SurfaceType::Sand);
    }

    #[test]
    fn duplicate_world_is_rejected() {
        let mut grid = grid();
        assert_eq!(
            grid.add_world("world"),
            Err(SurfaceError::DuplicateWorld("world".to_owned()))
        );
        assert_eq!(grid.world_names(), vec!["world".to_owned()]);
    }
}
