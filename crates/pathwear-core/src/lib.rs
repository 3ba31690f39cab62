//! Wear-decision engine for the Pathwear terrain wear simulation.
//!
//! As entities walk, ride, sprint, and crouch across a world, the ground
//! beneath and at their feet has a configurable chance of turning into
//! something more worn: grass into dirt, dirt into path. This crate owns
//! that decision.
//!
//! # Pipeline
//!
//! Each scheduler tick plans one evaluation per eligible entity
//! ([`scheduler`]), then each planned attempt is executed against the
//! world by the single task that owns block mutation ([`executor`]):
//!
//! 1. **Eligibility** -- movement gating, game mode, per-entity toggle.
//! 2. **Resolution** -- one [`ModifierClass`] per entity.
//! 3. **Chance** -- base chance plus posture delta, clamped, per zone.
//! 4. **Draw** -- one sample in `0..100` shared by both zones.
//! 5. **Authorization** -- maintenance, disabled worlds, footing, rails,
//!    then every registered collaborator.
//! 6. **Transition** -- configured source-to-target lookup per zone.
//! 7. **Application** -- swap, confirm, audit.
//!
//! # Modules
//!
//! - [`activity`] -- Concurrent set of entities that moved since last tick.
//! - [`applier`] -- [`MutationApplier`] and the [`AuditSink`] seam.
//! - [`authorization`] -- [`AuthorizationGate`] and the capability registry.
//! - [`chance`] -- [`ChanceTable`]: base chances and posture deltas.
//! - [`config`] -- YAML configuration into strongly-typed structs.
//! - [`control`] -- Runtime administrative state shared with the scheduler.
//! - [`executor`] -- Executes planned attempts against the world.
//! - [`modifier`] -- The pure modifier-class resolver.
//! - [`runner`] -- Periodic scheduler and serialized mutation tasks.
//! - [`scheduler`] -- Per-tick planning.
//! - [`transition`] -- [`TransitionTable`] and entry parsing.
//!
//! [`ModifierClass`]: modifier::ModifierClass
//! [`MutationApplier`]: applier::MutationApplier
//! [`AuditSink`]: applier::AuditSink
//! [`AuthorizationGate`]: authorization::AuthorizationGate
//! [`ChanceTable`]: chance::ChanceTable
//! [`TransitionTable`]: transition::TransitionTable

pub mod activity;
pub mod applier;
pub mod authorization;
pub mod chance;
pub mod config;
pub mod control;
pub mod executor;
pub mod modifier;
pub mod runner;
pub mod scheduler;
pub mod transition;
