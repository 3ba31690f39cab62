//! A small generated meadow world for the sandbox engine.
//!
//! The meadow is a square of grass over dirt with scattered tufts, a rail
//! line running east-west through the middle on a gravel bed, and a stone
//! brick plaza at the origin. It exercises every branch of the wear
//! pipeline: ground transitions, at-feet transitions, the rail guard, and
//! surfaces with no configured transition.

use pathwear_types::{BlockLocation, BlockPos, SurfaceType};
use tracing::info;

use crate::error::SurfaceError;
use crate::grid::SurfaceGrid;

/// Half the side length of the plaza at the origin.
const PLAZA_RADIUS: u32 = 2;

/// Where the meadow was built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SandboxLayout {
    /// World name.
    pub world: String,
    /// Height of the grass layer.
    pub ground_y: i32,
    /// The meadow spans `-half_extent..=half_extent` on both axes.
    pub half_extent: i32,
}

impl SandboxLayout {
    /// Vertical coordinate of an entity standing on the meadow.
    pub fn standing_height(&self) -> f64 {
        f64::from(self.ground_y.saturating_add(1))
    }

    /// Whether a block column lies inside the meadow.
    pub const fn contains(&self, x: i32, z: i32) -> bool {
        x.unsigned_abs() <= self.half_extent.unsigned_abs()
            && z.unsigned_abs() <= self.half_extent.unsigned_abs()
    }
}

/// Generate the meadow into a fresh world of `grid`.
///
/// # Errors
///
/// Returns [`SurfaceError`] if the world name is taken or the ground height
/// falls outside the build range.
pub fn build_meadow(
    grid: &mut SurfaceGrid,
    world: &str,
    half_extent: i32,
    ground_y: i32,
) -> Result<SandboxLayout, SurfaceError> {
    grid.add_world(world)?;
    let extent = half_extent.saturating_abs();
    let above = ground_y.saturating_add(1);
    let below = ground_y.saturating_sub(1);

    for x in extent.saturating_neg()..=extent {
        for z in extent.saturating_neg()..=extent {
            let at = |y: i32| BlockLocation::new(world, BlockPos::new(x, y, z));
            grid.place(&at(below), SurfaceType::Dirt)?;

            if z == 0 {
                grid.place(&at(ground_y), SurfaceType::Gravel)?;
                grid.place(&at(above), SurfaceType::Rail)?;
                continue;
            }
            if x.unsigned_abs() <= PLAZA_RADIUS && z.unsigned_abs() <= PLAZA_RADIUS {
                grid.place(&at(ground_y), SurfaceType::StoneBricks)?;
                continue;
            }

            grid.place(&at(ground_y), SurfaceType::GrassBlock)?;
            match scatter(x, z) {
                0 | 1 => grid.place(&at(above), SurfaceType::ShortGrass)?,
                2 => grid.place(&at(above), SurfaceType::Fern)?,
                _ => {}
            }
        }
    }

    info!(
        world,
        half_extent = extent,
        ground_y,
        grass = grid.count(world, SurfaceType::GrassBlock),
        "Sandbox meadow generated"
    );

    Ok(SandboxLayout {
        world: world.to_owned(),
        ground_y,
        half_extent: extent,
    })
}

/// Deterministic pseudo-random bucket in `0..7` for a block column.
const fn scatter(x: i32, z: i32) -> i32 {
    (x.wrapping_mul(73_856_093) ^ z.wrapping_mul(19_349_663)).rem_euclid(7)
}
