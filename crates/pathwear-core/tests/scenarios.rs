//! End-to-end wear scenarios driven through the public API.

#![allow(clippy::unwrap_used)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use pathwear_core::activity::ActivityTracker;
use pathwear_core::applier::{AuditError, AuditSink, MutationApplier};
use pathwear_core::authorization::{
    AuthorizationCollaborator, AuthorizationGate, CapabilityRegistry, Denial,
};
use pathwear_core::chance::ChanceTable;
use pathwear_core::config::{BlockModificationsConfig, WearConfig};
use pathwear_core::control::ControlState;
use pathwear_core::executor::{WearExecutor, WearOutcome};
use pathwear_core::modifier::ModifierClass;
use pathwear_core::scheduler::{FixedDraw, SchedulerSettings, WearScheduler};
use pathwear_core::transition::TransitionTable;
use pathwear_types::{
    BlockLocation, BlockPos, BootMaterial, EntityId, EntitySnapshot, Footwear, MountKind,
    Position, SurfaceType, TransitionRecord, Vehicle, Zone,
};
use pathwear_world::{SurfaceAccess, SurfaceGrid};
use tracing::Level;
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::Layer;

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

#[derive(Default)]
struct RecordingSink {
    records: Mutex<Vec<TransitionRecord>>,
}

impl AuditSink for RecordingSink {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn record_transition(&self, record: &TransitionRecord) -> Result<(), AuditError> {
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }
}

struct Counting {
    name: &'static str,
    allow: bool,
    calls: Arc<AtomicUsize>,
}

impl AuthorizationCollaborator for Counting {
    fn name(&self) -> &str {
        self.name
    }

    fn is_allowed(&self, _entity: &EntitySnapshot, _location: &BlockLocation) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.allow
    }
}

/// Counts `WARN` events.
#[derive(Clone, Default)]
struct WarnCounter(Arc<AtomicUsize>);

impl<S: tracing::Subscriber> Layer<S> for WarnCounter {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() == Level::WARN {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }
}

struct Harness {
    grid: SurfaceGrid,
    control: Arc<ControlState>,
    tracker: Arc<ActivityTracker>,
    sink: Arc<RecordingSink>,
    scheduler: WearScheduler,
    executor: WearExecutor,
}

impl Harness {
    fn new(chances: ChanceTable, transitions: TransitionTable, gating: bool) -> Self {
        Self::with_registry(chances, transitions, gating, CapabilityRegistry::new())
    }

    fn with_registry(
        chances: ChanceTable,
        transitions: TransitionTable,
        gating: bool,
        registry: CapabilityRegistry,
    ) -> Self {
        let mut grid = SurfaceGrid::new();
        grid.add_world("meadow").unwrap();
        grid.place(&below(), SurfaceType::GrassBlock).unwrap();

        let control = Arc::new(ControlState::new(20));
        let tracker = Arc::new(ActivityTracker::new(gating));
        let sink = Arc::new(RecordingSink::default());
        let scheduler = WearScheduler::new(
            SchedulerSettings::default(),
            chances,
            Arc::clone(&tracker),
            Arc::clone(&control),
        );
        let executor = WearExecutor::new(
            AuthorizationGate::new(Arc::clone(&control), registry),
            transitions,
            MutationApplier::with_audit(Arc::clone(&sink) as Arc<dyn AuditSink>),
        );
        Self {
            grid,
            control,
            tracker,
            sink,
            scheduler,
            executor,
        }
    }

    fn tick(&mut self, entity: &EntitySnapshot, draw: u32) -> Vec<WearOutcome> {
        self.executor
            .run_tick(
                &mut self.scheduler,
                std::slice::from_ref(entity),
                &mut FixedDraw::always(draw),
                &mut self.grid,
            )
            .outcomes
    }

    fn audit_count(&self) -> usize {
        self.sink.records.lock().unwrap().len()
    }

    fn below_surface(&self) -> SurfaceType {
        self.grid.surface_at(&below()).unwrap()
    }
}

fn below() -> BlockLocation {
    BlockLocation::new("meadow", BlockPos::new(0, 63, 0))
}

fn walker() -> EntitySnapshot {
    EntitySnapshot::new(EntityId::new(), "walker", "meadow", Position::new(0.5, 64.0, 0.5))
}

fn grass_to_path() -> TransitionTable {
    TransitionTable::new().with(Zone::BelowFeet, SurfaceType::GrassBlock, SurfaceType::DirtPath)
}

fn barefoot_chance(chance: i32) -> ChanceTable {
    ChanceTable::new().with_base(ModifierClass::NoFootwear, chance)
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn barefoot_hit_wears_grass_into_path_and_audits_once() {
    let mut harness = Harness::new(barefoot_chance(10), grass_to_path(), false);
    let entity = walker();

    let outcomes = harness.tick(&entity, 5);

    assert_eq!(harness.below_surface(), SurfaceType::DirtPath);
    assert_eq!(harness.audit_count(), 1);
    let record = harness.sink.records.lock().unwrap().first().cloned().unwrap();
    assert_eq!(record.from, SurfaceType::GrassBlock);
    assert_eq!(record.to, SurfaceType::DirtPath);
    assert_eq!(record.entity, entity.id);
    assert_eq!(record.location, below());
    assert!(outcomes.iter().any(|outcome| matches!(outcome, WearOutcome::Applied(_))));
}

#[test]
fn maintenance_blocks_every_draw() {
    let mut harness = Harness::new(barefoot_chance(10), grass_to_path(), false);
    harness.control.set_maintenance(true);
    let entity = walker();

    for draw in 0..100 {
        let outcomes = harness.tick(&entity, draw);
        assert!(
            outcomes
                .iter()
                .all(|outcome| *outcome == WearOutcome::Denied(Denial::Maintenance))
        );
    }
    assert_eq!(harness.below_surface(), SurfaceType::GrassBlock);
    assert_eq!(harness.audit_count(), 0);
}

#[test]
fn horse_riders_use_the_mount_chance_whatever_their_boots() {
    let chances = ChanceTable::new()
        .with_base(ModifierClass::MountedSpecial(MountKind::Horse), 80)
        .with_base(ModifierClass::BasicFootwear, 0)
        .with_base(ModifierClass::ProtectiveFootwear, 0)
        .with_base(ModifierClass::NoFootwear, 0);

    for material in [BootMaterial::Leather, BootMaterial::Iron, BootMaterial::Diamond] {
        let mut harness = Harness::new(chances.clone(), grass_to_path(), false);
        let rider = walker()
            .wearing(Footwear::plain(material))
            .riding(Vehicle::Horse);

        let [attempt, _] = harness.scheduler.plan_entity(&rider, 79);
        assert_eq!(attempt.modifier, ModifierClass::MountedSpecial(MountKind::Horse));
        assert_eq!(attempt.chance, 80);

        harness.tick(&rider, 79);
        assert_eq!(harness.below_surface(), SurfaceType::DirtPath);
    }
}

#[test]
fn idle_entities_are_skipped_before_any_check() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut registry = CapabilityRegistry::new();
    registry.register(Box::new(Counting {
        name: "counting",
        allow: true,
        calls: Arc::clone(&calls),
    }));
    let mut harness = Harness::with_registry(barefoot_chance(100), grass_to_path(), true, registry);
    let entity = walker();

    let outcomes = harness.tick(&entity, 0);
    assert!(outcomes.is_empty());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(harness.below_surface(), SurfaceType::GrassBlock);

    // Once it moves it is evaluated, exactly once.
    harness.tracker.record_movement(entity.id);
    assert_eq!(harness.tick(&entity, 0).len(), 2);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert!(harness.tick(&entity, 0).is_empty());
}

#[test]
fn malformed_transition_is_dropped_with_a_warning() {
    let warnings = WarnCounter::default();
    let subscriber = tracing_subscriber::registry().with(warnings.clone());

    let table = tracing::subscriber::with_default(subscriber, || {
        TransitionTable::from_config(Some(&BlockModificationsConfig {
            block_at_feet: vec!["SHORT_GRASS:AIR".to_owned()],
            block_below: vec![
                "GRASS_BLOCK:DIRT_PATH".to_owned(),
                "STONE-COBBLESTONE".to_owned(),
                "DIRT:COARSE_DIRT".to_owned(),
            ],
        }))
    });

    assert_eq!(warnings.0.load(Ordering::SeqCst), 1);
    assert_eq!(table.len(Zone::BelowFeet), 2);
    assert_eq!(table.target_for(Zone::BelowFeet, SurfaceType::Stone), None);
    assert_eq!(
        table.target_for(Zone::BelowFeet, SurfaceType::GrassBlock),
        Some(SurfaceType::DirtPath)
    );
    assert_eq!(table.target_for(Zone::AtFeet, SurfaceType::ShortGrass), Some(SurfaceType::Air));

    let mut harness = Harness::new(barefoot_chance(10), table, false);
    harness.tick(&walker(), 0);
    assert_eq!(harness.below_surface(), SurfaceType::DirtPath);
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

#[test]
fn a_single_veto_denies_regardless_of_the_others() {
    let entity = walker();
    for answers in [[true, true, false], [false, true, true], [true, false, true]] {
        let mut registry = CapabilityRegistry::new();
        for (allow, name) in answers.into_iter().zip(["a", "b", "c"]) {
            registry.register(Box::new(Counting {
                name,
                allow,
                calls: Arc::new(AtomicUsize::new(0)),
            }));
        }
        let mut harness = Harness::with_registry(barefoot_chance(100), grass_to_path(), false, registry);
        let outcomes = harness.tick(&entity, 0);
        assert!(
            outcomes
                .iter()
                .all(|outcome| matches!(outcome, WearOutcome::Denied(Denial::Collaborator(_))))
        );
        assert_eq!(harness.below_surface(), SurfaceType::GrassBlock);
    }
}

#[test]
fn identity_transition_emits_nothing() {
    let table = TransitionTable::new().with(Zone::BelowFeet, SurfaceType::GrassBlock, SurfaceType::GrassBlock);
    let mut harness = Harness::new(barefoot_chance(100), table, false);

    let outcomes = harness.tick(&walker(), 0);
    assert!(outcomes.contains(&WearOutcome::Unchanged));
    assert_eq!(harness.audit_count(), 0);
}

#[test]
fn shipped_configuration_runs_end_to_end() {
    let config = WearConfig::default();
    let chances = ChanceTable::from_config(
        config.chance_modifiers.as_ref(),
        config.additive_modifiers.as_ref(),
    );
    let transitions = TransitionTable::from_config(config.block_modifications.as_ref());
    let mut harness = Harness::new(chances, transitions, false);
    let entity = walker();

    // Barefoot chance is 10: draw 9 hits, draw 10 misses.
    harness.tick(&entity, 10);
    assert_eq!(harness.below_surface(), SurfaceType::GrassBlock);
    harness.tick(&entity, 9);
    assert_eq!(harness.below_surface(), SurfaceType::Dirt);
    harness.tick(&entity, 9);
    assert_eq!(harness.below_surface(), SurfaceType::CoarseDirt);
    harness.tick(&entity, 9);
    assert_eq!(harness.below_surface(), SurfaceType::DirtPath);
    harness.tick(&entity, 9);
    assert_eq!(harness.below_surface(), SurfaceType::DirtPath);
    assert_eq!(harness.audit_count(), 3);
}
