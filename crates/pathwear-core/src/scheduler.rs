//! Per-tick wear planning.
//!
//! [`WearScheduler::plan_tick`] turns the current entity snapshots into
//! [`WearAttempt`]s. Planning is read-only with respect to the world and
//! runs off the task that owns surface mutation; it consumes activity
//! records, checks eligibility, resolves each entity's modifier class,
//! looks up the per-zone chance, and takes one draw per entity.
//!
//! One draw is shared by both zones of an entity in a tick, so the at-feet
//! and below-feet outcomes are correlated: whenever the zone with the lower
//! threshold hits, the other one does too.

use std::collections::{BTreeSet, VecDeque};
use std::sync::Arc;

use pathwear_types::{BlockLocation, EntityId, EntitySnapshot, Zone};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::activity::ActivityTracker;
use crate::chance::{ChanceTable, MAX_CHANCE};
use crate::config::GeneralConfig;
use crate::control::ControlState;
use crate::modifier::{self, ModifierClass};

// ---------------------------------------------------------------------------
// Draws
// ---------------------------------------------------------------------------

/// Supplies the uniform draw in `0..100` taken once per entity per tick.
pub trait DrawSource {
    /// The next draw. Must be below [`MAX_CHANCE`].
    fn next_draw(&mut self) -> u32;
}

/// Draws from a random number generator.
#[derive(Debug, Clone)]
pub struct RandomDraw<R>(pub R);

impl<R: Rng> DrawSource for RandomDraw<R> {
    fn next_draw(&mut self) -> u32 {
        self.0.random_range(0..MAX_CHANCE)
    }
}

/// Replays a script of draws, cycling when exhausted.
///
/// Values at or above [`MAX_CHANCE`] are clamped to the largest valid draw.
#[derive(Debug, Clone)]
pub struct FixedDraw {
    script: VecDeque<u32>,
}

impl FixedDraw {
    /// Always draw `value`.
    pub fn always(value: u32) -> Self {
        Self::script([value])
    }

    /// Draw each value in order, then start over. An empty script always
    /// draws zero.
    pub fn script(values: impl IntoIterator<Item = u32>) -> Self {
        let highest = MAX_CHANCE.saturating_sub(1);
        Self {
            script: values.into_iter().map(|value| value.min(highest)).collect(),
        }
    }
}

impl DrawSource for FixedDraw {
    fn next_draw(&mut self) -> u32 {
        let Some(value) = self.script.pop_front() else {
            return 0;
        };
        self.script.push_back(value);
        value
    }
}

// ---------------------------------------------------------------------------
// Plans
// ---------------------------------------------------------------------------

/// One zone of one entity, ready for authorization and execution.
#[derive(Debug, Clone, PartialEq)]
pub struct WearAttempt {
    /// The acting entity as seen when the tick was planned.
    pub entity: EntitySnapshot,
    /// The zone being evaluated.
    pub zone: Zone,
    /// The block evaluated for the zone.
    pub location: BlockLocation,
    /// The entity's resolved modifier class.
    pub modifier: ModifierClass,
    /// Effective chance for the zone and posture, in `0..=100`.
    pub chance: u32,
    /// The entity's shared draw for this tick.
    pub draw: u32,
}

impl WearAttempt {
    /// Whether the draw falls strictly below the chance.
    pub const fn hits(&self) -> bool {
        self.draw < self.chance
    }
}

/// Why an entity was or was not planned this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Eligibility {
    /// Evaluated.
    Eligible,
    /// Movement gating is on and the entity has not moved.
    Idle,
    /// The entity's game mode does not participate.
    ModeExcluded,
    /// The entity opted out of wear.
    ToggledOff,
}

/// Counters for one planned tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickSummary {
    /// Tick sequence number, starting at 1.
    pub tick: u64,
    /// Entities online when the tick was planned.
    pub entities_seen: u64,
    /// Skipped by movement gating.
    pub skipped_idle: u64,
    /// Skipped by game mode.
    pub skipped_mode: u64,
    /// Skipped by the per-entity toggle.
    pub skipped_toggle: u64,
    /// Attempts planned (two per evaluated entity).
    pub attempts: u64,
}

impl TickSummary {
    /// Entities that were actually evaluated.
    pub const fn evaluated(&self) -> u64 {
        self.entities_seen
            .saturating_sub(self.skipped_idle)
            .saturating_sub(self.skipped_mode)
            .saturating_sub(self.skipped_toggle)
    }

    fn count(&mut self, eligibility: Eligibility) {
        let counter = match eligibility {
            Eligibility::Eligible => return,
            Eligibility::Idle => &mut self.skipped_idle,
            Eligibility::ModeExcluded => &mut self.skipped_mode,
            Eligibility::ToggledOff => &mut self.skipped_toggle,
        };
        *counter = counter.saturating_add(1);
    }
}

/// The output of one planned tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickPlan {
    /// Counters for the tick.
    pub summary: TickSummary,
    /// Attempts in entity order, below-feet before at-feet per entity.
    pub attempts: Vec<WearAttempt>,
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Scheduler settings taken from the `general` configuration section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerSettings {
    /// Whether non-survival game modes participate.
    pub creative_participation: bool,
}

impl SchedulerSettings {
    /// Settings from configuration.
    pub const fn from_config(general: &GeneralConfig) -> Self {
        Self {
            creative_participation: general.enable_in_creative_mode,
        }
    }
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self::from_config(&GeneralConfig::default())
    }
}

/// Plans wear attempts for every eligible entity once per tick.
#[derive(Debug)]
pub struct WearScheduler {
    settings: SchedulerSettings,
    chances: ChanceTable,
    tracker: Arc<ActivityTracker>,
    control: Arc<ControlState>,
    tick: u64,
}

impl WearScheduler {
    /// A scheduler over compiled chances and shared state.
    pub const fn new(
        settings: SchedulerSettings,
        chances: ChanceTable,
        tracker: Arc<ActivityTracker>,
        control: Arc<ControlState>,
    ) -> Self {
        Self {
            settings,
            chances,
            tracker,
            control,
            tick: 0,
        }
    }

    /// The activity tracker movement producers write to.
    pub const fn tracker(&self) -> &Arc<ActivityTracker> {
        &self.tracker
    }

    /// The compiled chance table.
    pub const fn chances(&self) -> &ChanceTable {
        &self.chances
    }

    /// Number of ticks planned so far.
    pub const fn ticks(&self) -> u64 {
        self.tick
    }

    /// Plan one tick for the given online entities.
    ///
    /// Pending activity records are consumed for every entity, whether or
    /// not it ends up evaluated. Records of entities that are no longer
    /// online are discarded.
    pub fn plan_tick<D: DrawSource + ?Sized>(
        &mut self,
        entities: &[EntitySnapshot],
        draws: &mut D,
    ) -> TickPlan {
        self.tick = self.tick.saturating_add(1);
        let moved = self.tracker.drain();

        let mut plan = TickPlan {
            summary: TickSummary {
                tick: self.tick,
                entities_seen: u64::try_from(entities.len()).unwrap_or(u64::MAX),
                ..TickSummary::default()
            },
            attempts: Vec::with_capacity(entities.len().saturating_mul(Zone::ALL.len())),
        };

        for entity in entities {
            let eligibility = self.eligibility(entity, &moved);
            plan.summary.count(eligibility);
            if eligibility != Eligibility::Eligible {
                continue;
            }
            let draw = draws.next_draw();
            plan.attempts.extend(self.plan_entity(entity, draw));
        }

        plan.summary.attempts = u64::try_from(plan.attempts.len()).unwrap_or(u64::MAX);
        plan
    }

    /// Whether an entity is evaluated this tick, given the records
    /// drained at its start.
    pub fn eligibility(&self, entity: &EntitySnapshot, moved: &BTreeSet<EntityId>) -> Eligibility {
        if self.tracker.is_gating() && !moved.contains(&entity.id) {
            return Eligibility::Idle;
        }
        if !entity.game_mode.is_survival() && !self.settings.creative_participation {
            return Eligibility::ModeExcluded;
        }
        if !self.control.is_toggled_on(entity.id) {
            return Eligibility::ToggledOff;
        }
        Eligibility::Eligible
    }

    /// Both zone attempts for an eligible entity sharing `draw`.
    pub fn plan_entity(&self, entity: &EntitySnapshot, draw: u32) -> [WearAttempt; 2] {
        let modifier = modifier::resolve(entity);
        Zone::ALL.map(|zone| WearAttempt {
            entity: entity.clone(),
            zone,
            location: entity.location_for(zone),
            modifier,
            chance: self.chances.effective_chance(modifier, zone, entity.posture),
            draw,
        })
    }
}
