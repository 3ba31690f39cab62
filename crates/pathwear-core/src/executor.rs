//! Execution of planned attempts against the surface store.
//!
//! Each [`WearAttempt`] runs through, in order: authorization, the
//! threshold comparison, the transition lookup for the surface currently at
//! the location, and application. Only the task that owns the surface
//! store calls [`WearExecutor::execute`], so swaps never interleave.

use pathwear_types::{EntitySnapshot, TransitionRecord};
use pathwear_world::{SurfaceAccess, SurfaceError};
use tracing::{debug, trace, warn};

use crate::applier::{ApplyOutcome, MutationApplier};
use crate::authorization::{AuthorizationGate, Denial};
use crate::scheduler::{DrawSource, TickSummary, WearAttempt, WearScheduler};
use crate::transition::TransitionTable;

/// What happened to one attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WearOutcome {
    /// The gate refused.
    Denied(Denial),
    /// The draw was not below the chance.
    Missed,
    /// No transition is configured for the current surface.
    NoTransition,
    /// The configured target equals the current surface.
    Unchanged,
    /// The swap took effect.
    Applied(TransitionRecord),
    /// The host discarded the write.
    NotConfirmed,
    /// The store could not be read or written.
    Failed(SurfaceError),
}

impl WearOutcome {
    /// Short label for logs and counters.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Denied(_) => "denied",
            Self::Missed => "missed",
            Self::NoTransition => "no_transition",
            Self::Unchanged => "unchanged",
            Self::Applied(_) => "applied",
            Self::NotConfirmed => "not_confirmed",
            Self::Failed(_) => "failed",
        }
    }
}

/// Authorization, transition lookup, and application for planned attempts.
#[derive(Debug)]
pub struct WearExecutor {
    gate: AuthorizationGate,
    transitions: TransitionTable,
    applier: MutationApplier,
}

impl WearExecutor {
    /// An executor over a gate, compiled transitions, and an applier.
    pub const fn new(
        gate: AuthorizationGate,
        transitions: TransitionTable,
        applier: MutationApplier,
    ) -> Self {
        Self {
            gate,
            transitions,
            applier,
        }
    }

    /// The authorization gate.
    pub const fn gate(&self) -> &AuthorizationGate {
        &self.gate
    }

    /// The compiled transitions.
    pub const fn transitions(&self) -> &TransitionTable {
        &self.transitions
    }

    /// Execute one attempt.
    pub fn execute(&self, attempt: &WearAttempt, surfaces: &mut dyn SurfaceAccess) -> WearOutcome {
        if let Err(denial) = self.gate.check(&attempt.entity, &attempt.location, surfaces) {
            trace!(entity = %attempt.entity.id, zone = %attempt.zone, denial = %denial, "Attempt denied");
            return WearOutcome::Denied(denial);
        }

        if !attempt.hits() {
            return WearOutcome::Missed;
        }

        let current = match surfaces.surface_at(&attempt.location) {
            Ok(current) => current,
            Err(err) => {
                warn!(location = %attempt.location, error = %err, "Surface read failed");
                return WearOutcome::Failed(err);
            }
        };

        let Some(target) = self.transitions.target_for(attempt.zone, current) else {
            return WearOutcome::NoTransition;
        };

        match self.applier.apply(
            &attempt.entity,
            attempt.zone,
            &attempt.location,
            current,
            target,
            surfaces,
        ) {
            ApplyOutcome::Unchanged => WearOutcome::Unchanged,
            ApplyOutcome::Applied(record) => WearOutcome::Applied(record),
            ApplyOutcome::NotConfirmed { .. } => WearOutcome::NotConfirmed,
            ApplyOutcome::Failed(err) => WearOutcome::Failed(err),
        }
    }

    /// Plan and execute one tick in place.
    ///
    /// For hosts that drive ticks synchronously from the thread that
    /// already owns the surface store.
    pub fn run_tick<D: DrawSource + ?Sized>(
        &self,
        scheduler: &mut WearScheduler,
        entities: &[EntitySnapshot],
        draws: &mut D,
        surfaces: &mut dyn SurfaceAccess,
    ) -> TickReport {
        let plan = scheduler.plan_tick(entities, draws);
        let outcomes = plan
            .attempts
            .iter()
            .map(|attempt| self.execute(attempt, surfaces))
            .collect();
        let report = TickReport {
            summary: plan.summary,
            outcomes,
        };
        debug!(
            tick = report.summary.tick,
            evaluated = report.summary.evaluated(),
            applied = report.applied().count(),
            "Tick executed"
        );
        report
    }
}

/// Summary and outcomes of one synchronously executed tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Planning counters.
    pub summary: TickSummary,
    /// One outcome per planned attempt, in plan order.
    pub outcomes: Vec<WearOutcome>,
}

impl TickReport {
    /// Records of every applied swap.
    pub fn applied(&self) -> impl Iterator<Item = &TransitionRecord> {
        self.outcomes.iter().filter_map(|outcome| match outcome {
            WearOutcome::Applied(record) => Some(record),
            _ => None,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use pathwear_types::{BlockLocation, BlockPos, EntityId, Position, SurfaceType, Zone};
    use pathwear_world::SurfaceGrid;

    use super::*;
    use crate::activity::ActivityTracker;
    use crate::authorization::CapabilityRegistry;
    use crate::chance::ChanceTable;
    use crate::control::ControlState;
    use crate::modifier::ModifierClass;
    use crate::scheduler::{FixedDraw, SchedulerSettings};

    fn world() -> SurfaceGrid {
        let mut grid = SurfaceGrid::new();
        grid.add_world("meadow").unwrap();
        grid.place(&BlockLocation::new("meadow", BlockPos::new(0, 63, 0)), SurfaceType::GrassBlock)
            .unwrap();
        grid.place(&BlockLocation::new("meadow", BlockPos::new(0, 64, 0)), SurfaceType::ShortGrass)
            .unwrap();
        grid
    }

    fn walker() -> EntitySnapshot {
        EntitySnapshot::new(EntityId::new(), "walker", "meadow", Position::new(0.5, 64.0, 0.5))
    }

    fn executor(control: Arc<ControlState>, transitions: TransitionTable) -> WearExecutor {
        WearExecutor::new(
            AuthorizationGate::new(control, CapabilityRegistry::new()),
            transitions,
            MutationApplier::new(),
        )
    }

    fn transitions() -> TransitionTable {
        TransitionTable::new()
            .with(Zone::BelowFeet, SurfaceType::GrassBlock, SurfaceType::DirtPath)
            .with(Zone::AtFeet, SurfaceType::ShortGrass, SurfaceType::Air)
    }

    fn attempt(entity: &EntitySnapshot, zone: Zone, chance: u32, draw: u32) -> WearAttempt {
        WearAttempt {
            entity: entity.clone(),
            zone,
            location: entity.location_for(zone),
            modifier: ModifierClass::NoFootwear,
            chance,
            draw,
        }
    }

    #[test]
    fn draw_below_chance_applies() {
        let mut grid = world();
        let executor = executor(Arc::new(ControlState::new(20)), transitions());
        let entity = walker();

        let outcome = executor.execute(&attempt(&entity, Zone::BelowFeet, 10, 9), &mut grid);
        assert!(matches!(outcome, WearOutcome::Applied(_)));
        assert_eq!(grid.surface_at(&entity.below_feet()).unwrap(), SurfaceType::DirtPath);
    }

    #[test]
    fn draw_equal_to_chance_misses() {
        let mut grid = world();
        let executor = executor(Arc::new(ControlState::new(20)), transitions());
        let entity = walker();

        let outcome = executor.execute(&attempt(&entity, Zone::BelowFeet, 10, 10), &mut grid);
        assert_eq!(outcome, WearOutcome::Missed);
        assert_eq!(grid.surface_at(&entity.below_feet()).unwrap(), SurfaceType::GrassBlock);
    }

    #[test]
    fn zero_chance_never_hits_and_full_chance_always_hits() {
        let executor = executor(Arc::new(ControlState::new(20)), transitions());
        let entity = walker();
        for draw in 0..100 {
            let mut grid = world();
            let missed = executor.execute(&attempt(&entity, Zone::AtFeet, 0, draw), &mut grid);
            assert_eq!(missed, WearOutcome::Missed);
            let hit = executor.execute(&attempt(&entity, Zone::AtFeet, 100, draw), &mut grid);
            assert!(matches!(hit, WearOutcome::Applied(_)));
        }
    }

    #[test]
    fn authorization_runs_before_threshold() {
        let mut grid = world();
        let control = Arc::new(ControlState::new(20));
        control.set_maintenance(true);
        let executor = executor(control, transitions());
        let entity = walker();

        let outcome = executor.execute(&attempt(&entity, Zone::BelowFeet, 0, 99), &mut grid);
        assert_eq!(outcome, WearOutcome::Denied(Denial::Maintenance));
    }

    #[test]
    fn unmapped_surfaces_are_left_alone() {
        let mut grid = world();
        grid.place(&BlockLocation::new("meadow", BlockPos::new(0, 63, 0)), SurfaceType::Stone)
            .unwrap();
        let executor = executor(Arc::new(ControlState::new(20)), transitions());
        let entity = walker();

        let outcome = executor.execute(&attempt(&entity, Zone::BelowFeet, 100, 0), &mut grid);
        assert_eq!(outcome, WearOutcome::NoTransition);
    }

    #[test]
    fn identity_transitions_are_unchanged() {
        let mut grid = world();
        let table = TransitionTable::new().with(Zone::BelowFeet, SurfaceType::GrassBlock, SurfaceType::GrassBlock);
        let executor = executor(Arc::new(ControlState::new(20)), table);
        let entity = walker();

        let outcome = executor.execute(&attempt(&entity, Zone::BelowFeet, 100, 0), &mut grid);
        assert_eq!(outcome, WearOutcome::Unchanged);
    }

    #[test]
    fn pinned_blocks_are_not_confirmed() {
        let mut grid = world();
        let entity = walker();
        grid.pin(&entity.below_feet()).unwrap();
        let executor = executor(Arc::new(ControlState::new(20)), transitions());

        let outcome = executor.execute(&attempt(&entity, Zone::BelowFeet, 100, 0), &mut grid);
        assert_eq!(outcome, WearOutcome::NotConfirmed);
    }

    #[test]
    fn run_tick_wears_both_zones_on_a_shared_hit() {
        let mut grid = world();
        let control = Arc::new(ControlState::new(20));
        let executor = executor(Arc::clone(&control), transitions());
        let mut scheduler = WearScheduler::new(
            SchedulerSettings::default(),
            ChanceTable::new().with_base(ModifierClass::NoFootwear, 10),
            Arc::new(ActivityTracker::new(false)),
            control,
        );
        let entity = walker();

        let report = executor.run_tick(
            &mut scheduler,
            std::slice::from_ref(&entity),
            &mut FixedDraw::always(3),
            &mut grid,
        );
        assert_eq!(report.outcomes.len(), 2);
        assert_eq!(report.applied().count(), 2);
        assert_eq!(grid.surface_at(&entity.below_feet()).unwrap(), SurfaceType::DirtPath);
        assert_eq!(grid.surface_at(&entity.at_feet()).unwrap(), SurfaceType::Air);
        assert_eq!(WearOutcome::Missed.label(), "missed");
    }
}
