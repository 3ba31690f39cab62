//! Authorization of individual wear attempts.
//!
//! The [`AuthorizationGate`] is a logical AND over a fixed sequence of
//! checks, cheapest first. The first failing check short-circuits the
//! rest and is reported as a [`Denial`]:
//!
//! 1. Maintenance mode.
//! 2. The entity's world is disabled.
//! 3. The entity is not standing on a whole block height.
//! 4. The target location sits directly beneath a rail.
//! 5. Each registered [`AuthorizationCollaborator`], in registration order.
//!
//! External land-management systems are registered through a
//! [`CapabilityRegistry`] built once at startup. A system that is not
//! present is simply never registered, so its checks are omitted rather
//! than failing.

use std::sync::Arc;

use pathwear_types::{BlockLocation, EntitySnapshot};
use pathwear_world::SurfaceAccess;
use tracing::{info, trace, warn};

use crate::control::ControlState;

// ---------------------------------------------------------------------------
// Collaborators
// ---------------------------------------------------------------------------

/// An external system that may veto a wear attempt.
///
/// Calls are synchronous and expected to be fast in-process checks.
pub trait AuthorizationCollaborator: Send + Sync {
    /// Stable name used in logs and denials.
    fn name(&self) -> &str;

    /// Whether `entity` may wear the surface at `location`.
    fn is_allowed(&self, entity: &EntitySnapshot, location: &BlockLocation) -> bool;
}

/// Reports which external systems exist in the host environment.
pub trait HostProbe {
    /// Whether the named system is present.
    fn is_present(&self, system: &str) -> bool;
}

/// A present system whose collaborator could not be initialized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("collaborator '{system}' is unavailable: {reason}")]
pub struct UnavailableCollaborator {
    /// The system name.
    pub system: String,
    /// Why initialization failed.
    pub reason: String,
}

/// The ordered set of active collaborators.
#[derive(Default)]
pub struct CapabilityRegistry {
    entries: Vec<Box<dyn AuthorizationCollaborator>>,
}

impl core::fmt::Debug for CapabilityRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CapabilityRegistry")
            .field("entries", &self.names())
            .finish()
    }
}

impl CapabilityRegistry {
    /// An empty registry.
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Append a collaborator. A collaborator with an already-registered
    /// name replaces the earlier one in place.
    pub fn register(&mut self, collaborator: Box<dyn AuthorizationCollaborator>) {
        let name = collaborator.name().to_owned();
        if let Some(slot) = self.entries.iter_mut().find(|entry| entry.name() == name) {
            warn!(collaborator = %name, "Collaborator registered twice; replacing");
            *slot = collaborator;
        } else {
            info!(collaborator = %name, "Authorization collaborator registered");
            self.entries.push(collaborator);
        }
    }

    /// Register the collaborator for `system` if the host reports it
    /// present. `init` runs only for present systems.
    ///
    /// Returns whether a collaborator was registered.
    pub fn probe<F>(&mut self, host: &dyn HostProbe, system: &str, init: F) -> bool
    where
        F: FnOnce() -> Result<Box<dyn AuthorizationCollaborator>, UnavailableCollaborator>,
    {
        if !host.is_present(system) {
            info!(system, "External system not present; its checks are omitted");
            return false;
        }
        match init() {
            Ok(collaborator) => {
                self.register(collaborator);
                true
            }
            Err(err) => {
                warn!(system, error = %err, "External system present but unusable; its checks are omitted");
                false
            }
        }
    }

    /// Registered names in evaluation order.
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|entry| entry.name()).collect()
    }

    /// Number of registered collaborators.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no collaborator is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn first_veto(&self, entity: &EntitySnapshot, location: &BlockLocation) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| !entry.is_allowed(entity, location))
            .map(|entry| entry.name())
    }
}

// ---------------------------------------------------------------------------
// Gate
// ---------------------------------------------------------------------------

/// Why an attempt was not authorized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Denial {
    /// Maintenance mode is on.
    Maintenance,
    /// The entity's world is disabled.
    DisabledWorld,
    /// The entity is mid-air or on a partial block.
    Footing,
    /// The location is directly beneath a rail.
    BeneathRail,
    /// A collaborator vetoed the attempt.
    Collaborator(String),
}

impl core::fmt::Display for Denial {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Maintenance => f.write_str("maintenance"),
            Self::DisabledWorld => f.write_str("disabled_world"),
            Self::Footing => f.write_str("footing"),
            Self::BeneathRail => f.write_str("beneath_rail"),
            Self::Collaborator(name) => write!(f, "collaborator:{name}"),
        }
    }
}

/// Decides whether a single wear attempt may touch a location.
#[derive(Debug)]
pub struct AuthorizationGate {
    control: Arc<ControlState>,
    registry: CapabilityRegistry,
}

impl AuthorizationGate {
    /// A gate reading `control` and asking every collaborator in
    /// `registry`.
    pub const fn new(control: Arc<ControlState>, registry: CapabilityRegistry) -> Self {
        Self { control, registry }
    }

    /// The shared control state this gate reads.
    pub const fn control(&self) -> &Arc<ControlState> {
        &self.control
    }

    /// The active collaborators.
    pub const fn registry(&self) -> &CapabilityRegistry {
        &self.registry
    }

    /// Run every check in order, stopping at the first denial.
    pub fn check(
        &self,
        entity: &EntitySnapshot,
        location: &BlockLocation,
        surfaces: &dyn SurfaceAccess,
    ) -> Result<(), Denial> {
        if self.control.is_maintenance() {
            return Err(Denial::Maintenance);
        }
        if self.control.is_world_disabled(&entity.world) {
            return Err(Denial::DisabledWorld);
        }
        if !entity.position.on_whole_block() {
            return Err(Denial::Footing);
        }
        if beneath_rail(location, surfaces) {
            return Err(Denial::BeneathRail);
        }
        if let Some(name) = self.registry.first_veto(entity, location) {
            trace!(entity = %entity.id, location = %location, collaborator = name, "Vetoed");
            return Err(Denial::Collaborator(name.to_owned()));
        }
        Ok(())
    }

    /// Boolean form of [`check`](Self::check).
    pub fn allowed(
        &self,
        entity: &EntitySnapshot,
        location: &BlockLocation,
        surfaces: &dyn SurfaceAccess,
    ) -> bool {
        self.check(entity, location, surfaces).is_ok()
    }
}

/// Whether the block directly above `location` is a rail. An unreadable
/// block above is treated as no rail.
fn beneath_rail(location: &BlockLocation, surfaces: &dyn SurfaceAccess) -> bool {
    surfaces
        .surface_at(&location.above())
        .is_ok_and(|above| above.is_rail())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use pathwear_types::{BlockPos, EntityId, Position, SurfaceType};
    use pathwear_world::SurfaceGrid;

    use super::*;

    struct Fixed {
        name: &'static str,
        allow: bool,
        calls: Arc<AtomicUsize>,
    }

    impl Fixed {
        fn boxed(name: &'static str, allow: bool) -> (Box<dyn AuthorizationCollaborator>, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            let collaborator = Box::new(Self {
                name,
                allow,
                calls: Arc::clone(&calls),
            });
            (collaborator, calls)
        }
    }

    impl AuthorizationCollaborator for Fixed {
        fn name(&self) -> &str {
            self.name
        }

        fn is_allowed(&self, _entity: &EntitySnapshot, _location: &BlockLocation) -> bool {
            self.calls.fetch_add(1, Ordering::Relaxed);
            self.allow
        }
    }

    struct Present(BTreeSet<&'static str>);

    impl HostProbe for Present {
        fn is_present(&self, system: &str) -> bool {
            self.0.contains(system)
        }
    }

    fn grid() -> SurfaceGrid {
        let mut grid = SurfaceGrid::new();
        grid.add_world("meadow").unwrap();
        grid.place(&BlockLocation::new("meadow", BlockPos::new(0, 63, 0)), SurfaceType::GrassBlock)
            .unwrap();
        grid
    }

    fn walker() -> EntitySnapshot {
        EntitySnapshot::new(EntityId::new(), "walker", "meadow", Position::new(0.5, 64.0, 0.5))
    }

    fn gate(registry: CapabilityRegistry) -> AuthorizationGate {
        AuthorizationGate::new(Arc::new(ControlState::new(20)), registry)
    }

    #[test]
    fn empty_gate_allows() {
        let gate = gate(CapabilityRegistry::new());
        let entity = walker();
        assert!(gate.allowed(&entity, &entity.below_feet(), &grid()));
    }

    #[test]
    fn maintenance_denies_everyone_first() {
        let (veto, calls) = Fixed::boxed("veto", false);
        let mut registry = CapabilityRegistry::new();
        registry.register(veto);
        let gate = gate(registry);
        gate.control().set_maintenance(true);
        gate.control().disable_world("meadow");

        let entity = walker();
        assert_eq!(
            gate.check(&entity, &entity.below_feet(), &grid()),
            Err(Denial::Maintenance)
        );
        assert_eq!(calls.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn disabled_world_denies() {
        let gate = gate(CapabilityRegistry::new());
        gate.control().disable_world("meadow");
        let entity = walker();
        assert_eq!(
            gate.check(&entity, &entity.below_feet(), &grid()),
            Err(Denial::DisabledWorld)
        );
    }

    #[test]
    fn airborne_entities_are_denied() {
        let gate = gate(CapabilityRegistry::new());
        let mut entity = walker();
        entity.position = Position::new(0.5, 64.42, 0.5);
        assert_eq!(
            gate.check(&entity, &entity.below_feet(), &grid()),
            Err(Denial::Footing)
        );
    }

    #[test]
    fn locations_beneath_rails_are_denied() {
        let mut grid = grid();
        grid.place(&BlockLocation::new("meadow", BlockPos::new(0, 64, 0)), SurfaceType::PoweredRail)
            .unwrap();

        let (allow, _) = Fixed::boxed("allow", true);
        let mut registry = CapabilityRegistry::new();
        registry.register(allow);
        let gate = gate(registry);

        let entity = walker();
        assert_eq!(
            gate.check(&entity, &entity.below_feet(), &grid),
            Err(Denial::BeneathRail)
        );
        // The rail itself is not beneath a rail.
        assert!(gate.allowed(&entity, &entity.at_feet(), &grid));
    }

    #[test]
    fn any_veto_makes_the_aggregate_false() {
        let entity = walker();
        let location = entity.below_feet();
        let grid = grid();

        for veto_position in 0..3 {
            let mut registry = CapabilityRegistry::new();
            let mut counters = Vec::new();
            for index in 0..3 {
                let name = ["first", "second", "third"].get(index).copied().unwrap();
                let (collaborator, calls) = Fixed::boxed(name, index != veto_position);
                registry.register(collaborator);
                counters.push(calls);
            }
            let gate = gate(registry);
            let denial = gate.check(&entity, &location, &grid).unwrap_err();
            assert!(matches!(denial, Denial::Collaborator(_)));

            // Short-circuit: nobody after the veto is asked.
            for (index, calls) in counters.iter().enumerate() {
                let expected = usize::from(index <= veto_position);
                assert_eq!(calls.load(Ordering::Relaxed), expected);
            }
        }
    }

    #[test]
    fn probe_registers_present_systems_in_order() {
        let host = Present(BTreeSet::from(["regions", "plots"]));
        let mut registry = CapabilityRegistry::new();

        assert!(registry.probe(&host, "regions", || Ok(Fixed::boxed("regions", true).0)));
        assert!(!registry.probe(&host, "towns", || Ok(Fixed::boxed("towns", false).0)));
        assert!(!registry.probe(&host, "plots", || {
            Err(UnavailableCollaborator {
                system: "plots".to_owned(),
                reason: "api mismatch".to_owned(),
            })
        }));
        assert!(registry.probe(&host, "plots", || Ok(Fixed::boxed("plots", true).0)));

        assert_eq!(registry.names(), vec!["regions", "plots"]);

        // An absent system denying everything is never consulted.
        let gate = gate(registry);
        let entity = walker();
        assert!(gate.allowed(&entity, &entity.below_feet(), &grid()));
    }

    #[test]
    fn duplicate_names_replace_in_place() {
        let mut registry = CapabilityRegistry::new();
        registry.register(Fixed::boxed("a", true).0);
        registry.register(Fixed::boxed("b", true).0);
        registry.register(Fixed::boxed("a", false).0);
        assert_eq!(registry.names(), vec!["a", "b"]);

        let gate = gate(registry);
        let entity = walker();
        assert_eq!(
            gate.check(&entity, &entity.below_feet(), &grid()),
            Err(Denial::Collaborator("a".to_owned()))
        );
    }

    #[test]
    fn denial_labels() {
        assert_eq!(Denial::BeneathRail.to_string(), "beneath_rail");
        assert_eq!(Denial::Collaborator("plots".to_owned()).to_string(), "collaborator:plots");
    }
}
