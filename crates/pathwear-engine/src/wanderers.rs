//! Wandering entities that populate the sandbox meadow.
//!
//! At startup a fixed number of wanderers join the [`EntityRoster`] with
//! randomly chosen boots, mounts, and game modes. A background task then
//! walks each of them one block at a time, reporting every step to the
//! [`ActivityTracker`] the way a host's movement callback would.

use std::sync::Arc;
use std::time::Duration;

use pathwear_core::activity::ActivityTracker;
use pathwear_core::control::ControlState;
use pathwear_types::{
    BootMaterial, Enchantment, EntityId, EntitySnapshot, Footwear, GameMode, Position, Posture,
    Vehicle,
};
use pathwear_world::{EntityRoster, SandboxLayout};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::error::EngineError;

/// Height gained mid-jump. Never a whole block, so the footing check
/// refuses wear while it lasts.
const HOP_HEIGHT: f64 = 0.42;

/// Probability that a step lands mid-jump.
const HOP_PROBABILITY: f64 = 0.1;

// -----------------------------------------------------------------------
// Configuration
// -----------------------------------------------------------------------

/// The `sandbox` section of `pathwear-config.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SandboxConfig {
    /// Name of the generated world.
    #[serde(default = "default_world")]
    pub world: String,

    /// The meadow spans `-half_extent..=half_extent` on both axes.
    #[serde(default = "default_half_extent")]
    pub half_extent: i32,

    /// Height of the grass layer.
    #[serde(default = "default_ground_y")]
    pub ground_y: i32,

    /// Number of wanderers to spawn.
    #[serde(default = "default_wanderers")]
    pub wanderers: u32,

    /// Real milliseconds between steps.
    #[serde(default = "default_step_interval_ms")]
    pub step_interval_ms: u64,

    /// Stop after this many seconds. Runs until Ctrl-C when absent.
    #[serde(default)]
    pub run_seconds: Option<u64>,

    /// Seed for spawning and walking. Random when absent.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            world: default_world(),
            half_extent: default_half_extent(),
            ground_y: default_ground_y(),
            wanderers: default_wanderers(),
            step_interval_ms: default_step_interval_ms(),
            run_seconds: None,
            seed: None,
        }
    }
}

impl SandboxConfig {
    /// Extract the `sandbox` section from a full config document. A
    /// document without one yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Sandbox`] if the section has the wrong shape.
    pub fn from_document(document: &serde_yml::Value) -> Result<Self, EngineError> {
        let Some(section) = document.get("sandbox") else {
            return Ok(Self::default());
        };
        serde_yml::from_value(section.clone()).map_err(|e| EngineError::Sandbox {
            message: format!("failed to parse sandbox config: {e}"),
        })
    }

    /// Delay between two walking steps.
    pub const fn step_interval(&self) -> Duration {
        Duration::from_millis(self.step_interval_ms)
    }

    /// A random source honoring the configured seed.
    pub fn rng(&self) -> SmallRng {
        self.seed
            .map_or_else(SmallRng::from_os_rng, SmallRng::seed_from_u64)
    }
}

fn default_world() -> String {
    String::from("meadow")
}

const fn default_half_extent() -> i32 {
    16
}

const fn default_ground_y() -> i32 {
    64
}

const fn default_wanderers() -> u32 {
    6
}

const fn default_step_interval_ms() -> u64 {
    250
}

// -----------------------------------------------------------------------
// Name pool
// -----------------------------------------------------------------------

/// Names handed out without replacement.
const NAME_POOL: &[&str] = &[
    "Alder", "Bramble", "Cotter", "Drover", "Ember", "Furrow", "Gleaner", "Hollis",
    "Ives", "Jessamy", "Kestrel", "Linnet", "Marram", "Nettle", "Osier", "Pollard",
    "Quickset", "Rook", "Sedge", "Teasel", "Umber", "Vetch", "Wren", "Yarrow",
];

// -----------------------------------------------------------------------
// Spawning
// -----------------------------------------------------------------------

/// Place `config.wanderers` entities on random meadow columns.
///
/// # Errors
///
/// Returns [`EngineError::Sandbox`] if more wanderers are requested than
/// there are names in the pool.
pub fn spawn_wanderers<R: Rng + ?Sized>(
    config: &SandboxConfig,
    layout: &SandboxLayout,
    roster: &EntityRoster,
    rng: &mut R,
) -> Result<Vec<EntityId>, EngineError> {
    let names = pick_unique_names(rng, config.wanderers)?;
    let extent = layout.half_extent;
    let mut spawned = Vec::with_capacity(names.len());

    for name in names {
        let x = rng.random_range(extent.saturating_neg()..=extent);
        let z = rng.random_range(extent.saturating_neg()..=extent);
        let position = Position::new(
            f64::from(x) + 0.5,
            layout.standing_height(),
            f64::from(z) + 0.5,
        );

        let mut wanderer = EntitySnapshot::new(EntityId::new(), name, layout.world.clone(), position)
            .in_mode(random_mode(rng));
        if let Some(boots) = random_footwear(rng) {
            wanderer = wanderer.wearing(boots);
        }
        if let Some(vehicle) = random_vehicle(rng) {
            wanderer = wanderer.riding(vehicle);
        }

        info!(
            entity = %wanderer.id,
            name = %wanderer.name,
            x,
            z,
            boots = ?wanderer.footwear.as_ref().map(|boots| boots.material),
            vehicle = ?wanderer.vehicle,
            mode = ?wanderer.game_mode,
            "Wanderer spawned"
        );
        spawned.push(wanderer.id);
        roster.join(wanderer);
    }

    Ok(spawned)
}

/// Pick `count` distinct names with a partial Fisher-Yates shuffle.
fn pick_unique_names<R: Rng + ?Sized>(rng: &mut R, count: u32) -> Result<Vec<String>, EngineError> {
    let pool_len = NAME_POOL.len();
    let count = usize::try_from(count).unwrap_or(usize::MAX);
    if count > pool_len {
        return Err(EngineError::Sandbox {
            message: format!("requested {count} wanderers but name pool only has {pool_len}"),
        });
    }

    let mut pool: Vec<&str> = NAME_POOL.to_vec();
    for i in 0..count {
        let j = rng.random_range(i..pool_len);
        pool.swap(i, j);
    }
    Ok(pool.into_iter().take(count).map(String::from).collect())
}

fn random_footwear<R: Rng + ?Sized>(rng: &mut R) -> Option<Footwear> {
    let material = match rng.random_range(0..8_u8) {
        0 | 1 => return None,
        2 | 3 => BootMaterial::Leather,
        4 => BootMaterial::Chainmail,
        5 => BootMaterial::Iron,
        6 => BootMaterial::Diamond,
        _ => BootMaterial::Netherite,
    };
    let boots = Footwear::plain(material);
    if rng.random_bool(0.3) {
        Some(boots.enchanted(Enchantment::FeatherFalling))
    } else {
        Some(boots)
    }
}

fn random_vehicle<R: Rng + ?Sized>(rng: &mut R) -> Option<Vehicle> {
    match rng.random_range(0..12_u8) {
        0 => Some(Vehicle::Horse),
        1 => Some(Vehicle::Boat),
        2 => Some(Vehicle::Pig),
        3 => Some(Vehicle::Minecart),
        _ => None,
    }
}

fn random_mode<R: Rng + ?Sized>(rng: &mut R) -> GameMode {
    match rng.random_range(0..10_u8) {
        0 => GameMode::Creative,
        1 => GameMode::Adventure,
        _ => GameMode::Survival,
    }
}

fn random_posture<R: Rng + ?Sized>(rng: &mut R) -> Posture {
    match rng.random_range(0..8_u8) {
        0 | 1 => Posture::Sprinting,
        2 => Posture::Crouching,
        _ => Posture::Neutral,
    }
}

// -----------------------------------------------------------------------
// Walking
// -----------------------------------------------------------------------

/// Move one wanderer by at most one block on each horizontal axis.
///
/// Returns whether the wanderer changed position. Steps that would leave
/// the meadow are refused and the wanderer stays put.
pub fn wander<R: Rng + ?Sized>(
    rng: &mut R,
    layout: &SandboxLayout,
    wanderer: &mut EntitySnapshot,
) -> bool {
    let dx = rng.random_range(-1..=1_i32);
    let dz = rng.random_range(-1..=1_i32);
    if dx == 0 && dz == 0 {
        wanderer.posture = Posture::Neutral;
        return false;
    }

    let current = wanderer.position.block();
    let x = current.x.saturating_add(dx);
    let z = current.z.saturating_add(dz);
    if !layout.contains(x, z) {
        return false;
    }

    let y = if rng.random_bool(HOP_PROBABILITY) {
        layout.standing_height() + HOP_HEIGHT
    } else {
        layout.standing_height()
    };
    wanderer.position = Position::new(f64::from(x) + 0.5, y, f64::from(z) + 0.5);
    wanderer.posture = random_posture(rng);
    true
}

/// Walk every rostered wanderer once per `config.step_interval()` until
/// `control` requests a stop.
///
/// The task returns the number of steps taken.
pub fn spawn_movement(
    roster: Arc<EntityRoster>,
    tracker: Arc<ActivityTracker>,
    control: Arc<ControlState>,
    layout: SandboxLayout,
    config: &SandboxConfig,
) -> JoinHandle<u64> {
    let interval = config.step_interval();
    let mut rng = config.rng();

    tokio::spawn(async move {
        let mut steps: u64 = 0;
        loop {
            tokio::select! {
                () = tokio::time::sleep(interval) => {}
                () = control.stopped() => break,
            }

            for id in roster.ids() {
                let mut moved = false;
                roster.update(id, |wanderer| moved = wander(&mut rng, &layout, wanderer));
                if moved {
                    steps = steps.saturating_add(1);
                    tracker.record_movement(id);
                }
            }
        }
        debug!(steps, "Wanderers stopped");
        steps
    })
}
