//! Administrative control state shared with the wear scheduler.
//!
//! The administrative surface (commands, an operator API, tests) writes;
//! the scheduler and authorization gate read on every evaluation. Flags
//! are atomics so reads on the hot path take no lock; the world and toggle
//! sets sit behind read-mostly [`RwLock`]s.
//!
//! # Architecture
//!
//! One [`ControlState`] is created at startup, wrapped in [`Arc`], and
//! handed by reference to the scheduler task, the mutation task, and the
//! authorization gate. Nothing here is global.
//!
//! [`Arc`]: std::sync::Arc

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Utc};
use pathwear_types::EntityId;
use pathwear_world::SurfaceAccess;
use serde::{Deserialize, Serialize};
use tokio::sync::Notify;
use tracing::{info, warn};

use crate::config::GeneralConfig;

/// Shared administrative control state.
#[derive(Debug)]
pub struct ControlState {
    /// Suppresses every mutation while set.
    maintenance: AtomicBool,

    /// Worlds in which nothing wears.
    disabled_worlds: RwLock<BTreeSet<String>>,

    /// Entities that opted out of wear. Everyone else is opted in.
    toggled_off: RwLock<BTreeSet<EntityId>>,

    /// Whether a stop has been requested.
    stop_requested: AtomicBool,

    /// Wakes the periodic scheduler when a stop is requested.
    stop_notify: Notify,

    /// Server ticks between evaluation passes (runtime-adjustable).
    attempt_frequency: AtomicU32,

    /// Wall-clock time when control started.
    started_at: DateTime<Utc>,
}

impl ControlState {
    /// Fresh state: not in maintenance, no disabled worlds, everyone opted
    /// in. A zero frequency is raised to one.
    pub fn new(attempt_frequency: u32) -> Self {
        Self {
            maintenance: AtomicBool::new(false),
            disabled_worlds: RwLock::new(BTreeSet::new()),
            toggled_off: RwLock::new(BTreeSet::new()),
            stop_requested: AtomicBool::new(false),
            stop_notify: Notify::new(),
            attempt_frequency: AtomicU32::new(attempt_frequency.max(1)),
            started_at: Utc::now(),
        }
    }

    /// Seed the state from configuration.
    ///
    /// Disabled world names the host does not know are configuration
    /// defects: each is reported and dropped.
    pub fn from_config(general: &GeneralConfig, surfaces: &dyn SurfaceAccess) -> Self {
        if general.attempt_frequency == 0 {
            warn!(
                section = "general",
                "attempt_frequency must be at least 1; using 1"
            );
        }
        let state = Self::new(general.attempt_frequency);

        for world in &general.disabled_worlds {
            if surfaces.has_world(world) {
                state.disable_world(world);
            } else {
                warn!(world = %world, "Disabled world does not exist; ignoring");
            }
        }

        state
    }

    // -----------------------------------------------------------------------
    // Maintenance
    // -----------------------------------------------------------------------

    /// Whether maintenance mode is on.
    pub fn is_maintenance(&self) -> bool {
        self.maintenance.load(Ordering::Acquire)
    }

    /// Switch maintenance mode, returning the previous value.
    pub fn set_maintenance(&self, enabled: bool) -> bool {
        let previous = self.maintenance.swap(enabled, Ordering::AcqRel);
        if previous != enabled {
            info!(enabled, "Maintenance mode changed");
        }
        previous
    }

    // -----------------------------------------------------------------------
    // Disabled worlds
    // -----------------------------------------------------------------------

    /// Disable wear in a world. Returns `false` if it already was.
    pub fn disable_world(&self, world: &str) -> bool {
        self.disabled_worlds
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(world.to_owned())
    }

    /// Re-enable wear in a world. Returns `false` if it was not disabled.
    pub fn enable_world(&self, world: &str) -> bool {
        self.disabled_worlds
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(world)
    }

    /// Whether a world is disabled.
    pub fn is_world_disabled(&self, world: &str) -> bool {
        self.disabled_worlds
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(world)
    }

    /// Snapshot of the disabled worlds, sorted.
    pub fn disabled_worlds(&self) -> Vec<String> {
        self.disabled_worlds
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    // -----------------------------------------------------------------------
    // Per-entity toggle
    // -----------------------------------------------------------------------

    /// Opt an entity in (`true`) or out (`false`) of wear.
    pub fn set_toggle(&self, id: EntityId, enabled: bool) {
        let mut off = self
            .toggled_off
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if enabled {
            off.remove(&id);
        } else {
            off.insert(id);
        }
    }

    /// Flip an entity's toggle, returning the new state.
    pub fn toggle_entity(&self, id: EntityId) -> bool {
        let mut off = self
            .toggled_off
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if off.remove(&id) {
            true
        } else {
            off.insert(id);
            false
        }
    }

    /// Whether an entity participates in wear.
    pub fn is_toggled_on(&self, id: EntityId) -> bool {
        !self
            .toggled_off
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&id)
    }

    // -----------------------------------------------------------------------
    // Stop
    // -----------------------------------------------------------------------

    /// Request a clean stop of the periodic scheduler.
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
        self.stop_notify.notify_waiters();
    }

    /// Whether a stop has been requested.
    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    /// Wait until a stop has been requested.
    ///
    /// Returns immediately if one already was. Any number of tasks may
    /// wait at once.
    pub async fn stopped(&self) {
        loop {
            // Created before the flag check so a concurrent stop cannot slip
            // between the two.
            let notified = self.stop_notify.notified();
            if self.is_stop_requested() {
                return;
            }
            notified.await;
        }
    }

    // -----------------------------------------------------------------------
    // Frequency
    // -----------------------------------------------------------------------

    /// Server ticks between evaluation passes.
    pub fn attempt_frequency(&self) -> u32 {
        self.attempt_frequency.load(Ordering::Acquire)
    }

    /// Change the evaluation frequency. Takes effect before the next
    /// scheduler sleep.
    ///
    /// Returns the previous frequency, or `None` if `ticks` is zero.
    pub fn set_attempt_frequency(&self, ticks: u32) -> Option<u32> {
        if ticks == 0 {
            return None;
        }
        Some(self.attempt_frequency.swap(ticks, Ordering::AcqRel))
    }

    // -----------------------------------------------------------------------
    // Status
    // -----------------------------------------------------------------------

    /// Return the wall-clock start time.
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Serializable snapshot for administrative display.
    pub fn status(&self) -> ControlStatus {
        ControlStatus {
            maintenance: self.is_maintenance(),
            disabled_worlds: self.disabled_worlds(),
            opted_out: self
                .toggled_off
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .len(),
            attempt_frequency: self.attempt_frequency(),
            stop_requested: self.is_stop_requested(),
            started_at: self.started_at.to_rfc3339(),
        }
    }
}

/// Point-in-time view of [`ControlState`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlStatus {
    /// Whether maintenance mode is on.
    pub maintenance: bool,
    /// Disabled worlds, sorted.
    pub disabled_worlds: Vec<String>,
    /// Number of entities opted out of wear.
    pub opted_out: usize,
    /// Server ticks between evaluation passes.
    pub attempt_frequency: u32,
    /// Whether a stop has been requested.
    pub stop_requested: bool,
    /// RFC 3339 start time.
    pub started_at: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use pathwear_world::SurfaceGrid;

    use super::*;

    #[test]
    fn maintenance_round_trip() {
        let control = ControlState::new(20);
        assert!(!control.is_maintenance());
        assert!(!control.set_maintenance(true));
        assert!(control.is_maintenance());
        assert!(control.set_maintenance(false));
        assert!(!control.is_maintenance());
    }

    #[test]
    fn worlds_enable_and_disable() {
        let control = ControlState::new(20);
        assert!(control.disable_world("nether"));
        assert!(!control.disable_world("nether"));
        assert!(control.is_world_disabled("nether"));
        assert_eq!(control.disabled_worlds(), vec!["nether".to_owned()]);
        assert!(control.enable_world("nether"));
        assert!(!control.is_world_disabled("nether"));
        assert!(!control.enable_world("nether"));
    }

    #[test]
    fn unknown_configured_worlds_are_dropped() {
        let mut grid = SurfaceGrid::new();
        grid.add_world("meadow").unwrap();
        grid.add_world("nether").unwrap();

        let general = GeneralConfig {
            disabled_worlds: vec!["nether".to_owned(), "atlantis".to_owned()],
            ..GeneralConfig::default()
        };
        let control = ControlState::from_config(&general, &grid);
        assert_eq!(control.disabled_worlds(), vec!["nether".to_owned()]);
        assert!(!control.is_world_disabled("meadow"));
    }

    #[test]
    fn entities_default_to_opted_in() {
        let control = ControlState::new(20);
        let id = EntityId::new();
        assert!(control.is_toggled_on(id));

        assert!(!control.toggle_entity(id));
        assert!(!control.is_toggled_on(id));
        assert!(control.toggle_entity(id));
        assert!(control.is_toggled_on(id));

        control.set_toggle(id, false);
        assert!(!control.is_toggled_on(id));
        control.set_toggle(id, true);
        assert!(control.is_toggled_on(id));
    }

    #[test]
    fn frequency_rejects_zero() {
        let control = ControlState::new(0);
        assert_eq!(control.attempt_frequency(), 1);
        assert_eq!(control.set_attempt_frequency(0), None);
        assert_eq!(control.set_attempt_frequency(40), Some(1));
        assert_eq!(control.attempt_frequency(), 40);
    }

    #[test]
    fn status_snapshot() {
        let control = ControlState::new(20);
        control.set_maintenance(true);
        control.disable_world("end");
        control.set_toggle(EntityId::new(), false);

        let status = control.status();
        assert!(status.maintenance);
        assert_eq!(status.disabled_worlds, vec!["end".to_owned()]);
        assert_eq!(status.opted_out, 1);
        assert_eq!(status.attempt_frequency, 20);
        assert!(!status.stop_requested);
    }

    #[tokio::test]
    async fn stopped_returns_after_request() {
        let control = Arc::new(ControlState::new(20));
        let waiter = {
            let control = Arc::clone(&control);
            tokio::spawn(async move { control.stopped().await })
        };
        tokio::time::sleep(Duration::from_millis(5)).await;
        control.request_stop();
        assert!(tokio::time::timeout(Duration::from_secs(1), waiter).await.is_ok());
        assert!(control.is_stop_requested());

        // Already stopped: returns immediately.
        control.stopped().await;
    }
}
