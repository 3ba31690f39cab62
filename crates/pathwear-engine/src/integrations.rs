//! In-process stand-ins for external land-management systems.
//!
//! Each adapter reads its shapes from its own entry under `integrations`
//! in `pathwear-config.yaml`. An integration that is configured and not
//! disabled counts as present in the host; [`build_registry`] probes every
//! known adapter once at startup.

use pathwear_core::authorization::{
    AuthorizationCollaborator, CapabilityRegistry, HostProbe, UnavailableCollaborator,
};
use pathwear_core::config::{IntegrationSettings, WearConfig};
use pathwear_types::{BlockLocation, EntitySnapshot};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{info, trace, warn};

/// Region-flag style protection.
pub const PROTECTED_REGIONS: &str = "protected_regions";

/// Claim style protection with trusted members.
pub const CLAIMED_PLOTS: &str = "claimed_plots";

/// JSON-lines block logging, handled by [`crate::audit`].
pub const BLOCK_LOG: &str = "block_log";

/// Every integration name this binary has an adapter for.
const KNOWN_INTEGRATIONS: &[&str] = &[PROTECTED_REGIONS, CLAIMED_PLOTS, BLOCK_LOG];

// -----------------------------------------------------------------------
// Host probe
// -----------------------------------------------------------------------

/// Treats every configured, enabled integration as present.
#[derive(Debug, Clone, Copy)]
pub struct ConfiguredHost<'a> {
    config: &'a WearConfig,
}

impl<'a> ConfiguredHost<'a> {
    /// A probe over the given configuration.
    pub const fn new(config: &'a WearConfig) -> Self {
        Self { config }
    }
}

impl HostProbe for ConfiguredHost<'_> {
    fn is_present(&self, system: &str) -> bool {
        self.config.integration(system).is_some()
    }
}

// -----------------------------------------------------------------------
// Protected regions
// -----------------------------------------------------------------------

/// An axis-aligned box in which wear is forbidden.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Region {
    /// Region name, for logs.
    pub name: String,
    /// World the region lives in.
    pub world: String,
    /// One corner, `[x, y, z]`.
    pub min: [i32; 3],
    /// The opposite corner, `[x, y, z]`. Corners may be given in any order.
    pub max: [i32; 3],
}

impl Region {
    /// Whether `location` lies inside the box, corners included.
    pub fn contains(&self, location: &BlockLocation) -> bool {
        let [ax, ay, az] = self.min;
        let [bx, by, bz] = self.max;
        self.world == location.world
            && between(location.pos.x, ax, bx)
            && between(location.pos.y, ay, by)
            && between(location.pos.z, az, bz)
    }
}

/// Denies wear inside any configured region.
#[derive(Debug, Clone)]
pub struct ProtectedRegions {
    regions: Vec<Region>,
}

impl ProtectedRegions {
    /// Read `regions` from the integration settings.
    ///
    /// # Errors
    ///
    /// Returns [`UnavailableCollaborator`] if no regions are listed or the
    /// list has the wrong shape.
    pub fn from_settings(settings: &IntegrationSettings) -> Result<Self, UnavailableCollaborator> {
        let regions: Vec<Region> = read_list(settings, PROTECTED_REGIONS, "regions")?;
        Ok(Self { regions })
    }

    /// Number of regions.
    pub fn len(&self) -> usize {
        self.regions.len()
    }
}

impl AuthorizationCollaborator for ProtectedRegions {
    fn name(&self) -> &'static str {
        PROTECTED_REGIONS
    }

    fn is_allowed(&self, _entity: &EntitySnapshot, location: &BlockLocation) -> bool {
        let Some(region) = self.regions.iter().find(|region| region.contains(location)) else {
            return true;
        };
        trace!(region = %region.name, location = %location, "Inside protected region");
        false
    }
}

// -----------------------------------------------------------------------
// Claimed plots
// -----------------------------------------------------------------------

/// A claimed column of land, spanning every height.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Claim {
    /// Name of the owning entity.
    pub owner: String,
    /// World the claim lives in.
    pub world: String,
    /// One corner, `[x, z]`.
    pub corner_a: [i32; 2],
    /// The opposite corner, `[x, z]`.
    pub corner_b: [i32; 2],
    /// Other entities allowed to build inside.
    #[serde(default)]
    pub trusted: Vec<String>,
}

impl Claim {
    /// Whether `location` lies inside the claim.
    pub fn contains(&self, location: &BlockLocation) -> bool {
        let [ax, az] = self.corner_a;
        let [bx, bz] = self.corner_b;
        self.world == location.world && between(location.pos.x, ax, bx) && between(location.pos.z, az, bz)
    }

    /// Whether the named entity may build inside.
    pub fn permits(&self, name: &str) -> bool {
        self.owner == name || self.trusted.iter().any(|trusted| trusted == name)
    }
}

/// Denies wear inside a claim unless the entity owns it or is trusted.
#[derive(Debug, Clone)]
pub struct ClaimedPlots {
    claims: Vec<Claim>,
}

impl ClaimedPlots {
    /// Read `claims` from the integration settings.
    ///
    /// # Errors
    ///
    /// Returns [`UnavailableCollaborator`] if no claims are listed or the
    /// list has the wrong shape.
    pub fn from_settings(settings: &IntegrationSettings) -> Result<Self, UnavailableCollaborator> {
        let claims: Vec<Claim> = read_list(settings, CLAIMED_PLOTS, "claims")?;
        Ok(Self { claims })
    }
}

impl AuthorizationCollaborator for ClaimedPlots {
    fn name(&self) -> &'static str {
        CLAIMED_PLOTS
    }

    fn is_allowed(&self, entity: &EntitySnapshot, location: &BlockLocation) -> bool {
        self.claims
            .iter()
            .filter(|claim| claim.contains(location))
            .all(|claim| claim.permits(&entity.name))
    }
}

// -----------------------------------------------------------------------
// Registry
// -----------------------------------------------------------------------

/// Probe every known adapter against `config`, in a fixed order.
pub fn build_registry(config: &WearConfig) -> CapabilityRegistry {
    for name in config.integrations.keys() {
        if !KNOWN_INTEGRATIONS.contains(&name.as_str()) {
            warn!(integration = %name, "No adapter for configured integration; ignoring");
        }
    }

    let host = ConfiguredHost::new(config);
    let mut registry = CapabilityRegistry::new();

    registry.probe(&host, PROTECTED_REGIONS, || {
        let settings = settings_for(config, PROTECTED_REGIONS)?;
        let regions = ProtectedRegions::from_settings(settings)?;
        info!(regions = regions.len(), "Protected regions loaded");
        Ok(Box::new(regions) as Box<dyn AuthorizationCollaborator>)
    });

    registry.probe(&host, CLAIMED_PLOTS, || {
        let settings = settings_for(config, CLAIMED_PLOTS)?;
        let plots = ClaimedPlots::from_settings(settings)?;
        Ok(Box::new(plots) as Box<dyn AuthorizationCollaborator>)
    });

    info!(collaborators = ?registry.names(), "Capability registry built");
    registry
}

fn settings_for<'a>(
    config: &'a WearConfig,
    system: &str,
) -> Result<&'a IntegrationSettings, UnavailableCollaborator> {
    config.integration(system).ok_or_else(|| UnavailableCollaborator {
        system: system.to_owned(),
        reason: String::from("not configured"),
    })
}

fn read_list<T: DeserializeOwned>(
    settings: &IntegrationSettings,
    system: &str,
    key: &str,
) -> Result<Vec<T>, UnavailableCollaborator> {
    let unavailable = |reason: String| UnavailableCollaborator {
        system: system.to_owned(),
        reason,
    };
    let raw = settings
        .value(key)
        .ok_or_else(|| unavailable(format!("no `{key}` listed")))?;
    let list: Vec<T> = serde_yml::from_value(raw.clone())
        .map_err(|e| unavailable(format!("malformed `{key}`: {e}")))?;
    if list.is_empty() {
        return Err(unavailable(format!("`{key}` is empty")));
    }
    Ok(list)
}

/// Inclusive range test with corners in either order.
const fn between(value: i32, a: i32, b: i32) -> bool {
    let (low, high) = if a <= b { (a, b) } else { (b, a) };
    low <= value && value <= high
}
