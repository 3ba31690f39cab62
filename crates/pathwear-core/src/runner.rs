//! Periodic wear loop.
//!
//! [`spawn_wear_loop`] starts two Tokio tasks joined by a bounded channel:
//!
//! - The **scheduler task** wakes every `attempt_frequency` server ticks,
//!   snapshots the online entities, plans the tick, and sends each
//!   [`WearAttempt`] down the channel.
//! - The **mutation task** exclusively owns the surface store. It executes
//!   attempts one at a time in the order they were planned.
//!
//! Shutdown goes through [`ControlState::request_stop`]: the scheduler
//! leaves its sleep, finishes the send in progress, and drops its sender.
//! The mutation task drains whatever is still queued and hands the store
//! back through [`WearLoop::shutdown`].

use std::sync::Arc;
use std::time::Duration;

use pathwear_world::{EntityDirectory, SurfaceAccess};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::GeneralConfig;
use crate::control::ControlState;
use crate::executor::{WearExecutor, WearOutcome};
use crate::scheduler::{RandomDraw, TickSummary, WearAttempt, WearScheduler};

/// Attempts buffered between the scheduler and the mutation task before
/// the scheduler waits.
pub const ATTEMPT_QUEUE_CAPACITY: usize = 1024;

/// Errors from the periodic tasks.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// A task panicked or was cancelled.
    #[error("wear task failed: {source}")]
    Join {
        /// The underlying join error.
        #[from]
        source: tokio::task::JoinError,
    },
}

/// Timing for the periodic scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopTiming {
    /// Real-time milliseconds per server tick.
    pub server_tick_ms: u64,
    /// Seed for the wear draw; `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl LoopTiming {
    /// Timing from the `general` configuration section.
    pub const fn from_config(general: &GeneralConfig) -> Self {
        Self {
            server_tick_ms: general.server_tick_ms,
            seed: general.seed,
        }
    }

    /// Sleep between ticks for a frequency in server ticks.
    pub fn period(&self, attempt_frequency: u32) -> Duration {
        let tick_ms = self.server_tick_ms.max(1);
        Duration::from_millis(tick_ms.saturating_mul(u64::from(attempt_frequency.max(1))))
    }
}

/// Aggregated counters over the life of a wear loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopStats {
    /// Ticks planned.
    pub ticks: u64,
    /// Entities evaluated across all ticks.
    pub evaluated: u64,
    /// Entities skipped by gating, game mode, or toggle.
    pub skipped: u64,
    /// Attempts executed.
    pub attempts: u64,
    /// Attempts refused by the gate.
    pub denied: u64,
    /// Attempts whose draw missed.
    pub missed: u64,
    /// Hits on surfaces without a transition.
    pub no_transition: u64,
    /// Hits whose target equalled the current surface.
    pub unchanged: u64,
    /// Swaps that took effect.
    pub applied: u64,
    /// Swaps the host discarded.
    pub not_confirmed: u64,
    /// Store errors.
    pub failed: u64,
}

impl LoopStats {
    /// Fold in one planned tick.
    pub const fn record_tick(&mut self, summary: &TickSummary) {
        self.ticks = self.ticks.saturating_add(1);
        let evaluated = summary.evaluated();
        self.evaluated = self.evaluated.saturating_add(evaluated);
        self.skipped = self
            .skipped
            .saturating_add(summary.entities_seen.saturating_sub(evaluated));
    }

    /// Fold in one executed attempt.
    pub const fn record_outcome(&mut self, outcome: &WearOutcome) {
        self.attempts = self.attempts.saturating_add(1);
        let counter = match outcome {
            WearOutcome::Denied(_) => &mut self.denied,
            WearOutcome::Missed => &mut self.missed,
            WearOutcome::NoTransition => &mut self.no_transition,
            WearOutcome::Unchanged => &mut self.unchanged,
            WearOutcome::Applied(_) => &mut self.applied,
            WearOutcome::NotConfirmed => &mut self.not_confirmed,
            WearOutcome::Failed(_) => &mut self.failed,
        };
        *counter = counter.saturating_add(1);
    }

    /// Combine scheduler-side and mutation-side counters.
    #[must_use]
    pub const fn merge(self, other: Self) -> Self {
        Self {
            ticks: self.ticks.saturating_add(other.ticks),
            evaluated: self.evaluated.saturating_add(other.evaluated),
            skipped: self.skipped.saturating_add(other.skipped),
            attempts: self.attempts.saturating_add(other.attempts),
            denied: self.denied.saturating_add(other.denied),
            missed: self.missed.saturating_add(other.missed),
            no_transition: self.no_transition.saturating_add(other.no_transition),
            unchanged: self.unchanged.saturating_add(other.unchanged),
            applied: self.applied.saturating_add(other.applied),
            not_confirmed: self.not_confirmed.saturating_add(other.not_confirmed),
            failed: self.failed.saturating_add(other.failed),
        }
    }
}

/// What a stopped loop hands back.
#[derive(Debug)]
pub struct LoopReport<S> {
    /// The surface store, with every queued attempt applied.
    pub surfaces: S,
    /// Final counters.
    pub stats: LoopStats,
}

/// Handles to a running wear loop.
pub struct WearLoop<S> {
    control: Arc<ControlState>,
    scheduler: JoinHandle<LoopStats>,
    mutator: JoinHandle<(S, LoopStats)>,
}

impl<S> WearLoop<S> {
    /// The control state driving this loop.
    pub const fn control(&self) -> &Arc<ControlState> {
        &self.control
    }

    /// Whether both tasks have finished.
    pub fn is_finished(&self) -> bool {
        self.scheduler.is_finished() && self.mutator.is_finished()
    }

    /// Stop the scheduler, let the mutation task drain, and collect the
    /// store and counters.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::Join`] if either task panicked.
    pub async fn shutdown(self) -> Result<LoopReport<S>, RunnerError> {
        self.control.request_stop();
        let scheduled = self.scheduler.await?;
        let (surfaces, executed) = self.mutator.await?;
        let stats = scheduled.merge(executed);
        info!(
            ticks = stats.ticks,
            attempts = stats.attempts,
            applied = stats.applied,
            "Wear loop stopped"
        );
        Ok(LoopReport { surfaces, stats })
    }
}

/// Start the scheduler and mutation tasks on the current Tokio runtime.
///
/// The first tick is planned immediately; later ticks follow every
/// `attempt_frequency * server_tick_ms`, re-reading the frequency from
/// `control` before each sleep.
pub fn spawn_wear_loop<S, D>(
    scheduler: WearScheduler,
    executor: WearExecutor,
    directory: Arc<D>,
    surfaces: S,
    control: Arc<ControlState>,
    timing: LoopTiming,
) -> WearLoop<S>
where
    S: SurfaceAccess + Send + 'static,
    D: EntityDirectory + ?Sized + 'static,
{
    let (tx, rx) = mpsc::channel::<WearAttempt>(ATTEMPT_QUEUE_CAPACITY);

    let scheduler_task = tokio::spawn(run_scheduler(
        scheduler,
        directory,
        Arc::clone(&control),
        timing,
        tx,
    ));
    let mutation_task = tokio::spawn(run_mutations(executor, surfaces, rx));

    info!(
        server_tick_ms = timing.server_tick_ms,
        attempt_frequency = control.attempt_frequency(),
        seeded = timing.seed.is_some(),
        "Wear loop started"
    );

    WearLoop {
        control,
        scheduler: scheduler_task,
        mutator: mutation_task,
    }
}

async fn run_scheduler<D>(
    mut scheduler: WearScheduler,
    directory: Arc<D>,
    control: Arc<ControlState>,
    timing: LoopTiming,
    tx: mpsc::Sender<WearAttempt>,
) -> LoopStats
where
    D: EntityDirectory + ?Sized,
{
    let rng = timing
        .seed
        .map_or_else(SmallRng::from_os_rng, SmallRng::seed_from_u64);
    let mut draws = RandomDraw(rng);
    let mut stats = LoopStats::default();

    'ticks: loop {
        if control.is_stop_requested() {
            break;
        }

        let entities = directory.online_entities();
        let plan = scheduler.plan_tick(&entities, &mut draws);
        stats.record_tick(&plan.summary);
        debug!(
            tick = plan.summary.tick,
            seen = plan.summary.entities_seen,
            skipped_idle = plan.summary.skipped_idle,
            skipped_mode = plan.summary.skipped_mode,
            skipped_toggle = plan.summary.skipped_toggle,
            attempts = plan.summary.attempts,
            "Tick planned"
        );

        for attempt in plan.attempts {
            if tx.send(attempt).await.is_err() {
                warn!("Mutation task is gone; stopping the scheduler");
                break 'ticks;
            }
        }

        let period = timing.period(control.attempt_frequency());
        tokio::select! {
            () = tokio::time::sleep(period) => {}
            () = control.stopped() => break,
        }
    }

    debug!(ticks = stats.ticks, "Scheduler task finished");
    stats
}

async fn run_mutations<S>(
    executor: WearExecutor,
    mut surfaces: S,
    mut rx: mpsc::Receiver<WearAttempt>,
) -> (S, LoopStats)
where
    S: SurfaceAccess,
{
    let mut stats = LoopStats::default();
    while let Some(attempt) = rx.recv().await {
        let outcome = executor.execute(&attempt, &mut surfaces);
        stats.record_outcome(&outcome);
    }
    debug!(attempts = stats.attempts, applied = stats.applied, "Mutation task drained");
    (surfaces, stats)
}
