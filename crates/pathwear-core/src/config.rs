//! Configuration loading and typed config structures for Pathwear.
//!
//! The canonical configuration lives in `pathwear-config.yaml` at the
//! project root. This module defines strongly-typed structs that mirror the
//! YAML structure and a loader that reads them. The raw structures are
//! compiled exactly once into runtime tables by
//! [`ChanceTable::from_config`](crate::chance::ChanceTable::from_config) and
//! [`TransitionTable::from_config`](crate::transition::TransitionTable::from_config);
//! defects inside well-formed YAML are reported there, never here.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level wear configuration.
///
/// Mirrors the structure of `pathwear-config.yaml`. [`WearConfig::default`]
/// carries the shipped values and is what the engine runs with when no file
/// is found. When a file *is* loaded, the chance and additive sections are
/// optional: leaving one out is a configuration defect that compiles to
/// all-zero values with a warning.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WearConfig {
    /// Worlds, game modes, gating, and timing.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Base chance per modifier class.
    #[serde(default)]
    pub chance_modifiers: Option<ChanceModifiersConfig>,

    /// Posture deltas per zone.
    #[serde(default)]
    pub additive_modifiers: Option<AdditiveModifiersConfig>,

    /// Surface transition lists for each zone.
    #[serde(default)]
    pub block_modifications: Option<BlockModificationsConfig>,

    /// Opaque settings for external authorization and audit systems,
    /// keyed by system name.
    #[serde(default)]
    pub integrations: BTreeMap<String, IntegrationSettings>,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for WearConfig {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            chance_modifiers: Some(ChanceModifiersConfig::default()),
            additive_modifiers: Some(AdditiveModifiersConfig::default()),
            block_modifications: Some(BlockModificationsConfig::default()),
            integrations: BTreeMap::new(),
            logging: LoggingConfig::default(),
        }
    }
}

impl WearConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        Ok(config)
    }

    /// Settings for the named integration, if configured and enabled.
    pub fn integration(&self, name: &str) -> Option<&IntegrationSettings> {
        self.integrations.get(name).filter(|settings| settings.enabled)
    }
}

// ---------------------------------------------------------------------------
// General
// ---------------------------------------------------------------------------

/// World, game-mode, gating, and timing settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GeneralConfig {
    /// World names in which no wear ever happens.
    #[serde(default)]
    pub disabled_worlds: Vec<String>,

    /// Whether entities outside survival mode participate.
    #[serde(default = "default_true")]
    pub enable_in_creative_mode: bool,

    /// Whether an entity must have moved since the previous tick to be
    /// evaluated.
    #[serde(default)]
    pub movement_check_enabled: bool,

    /// Server ticks between evaluation passes.
    #[serde(default = "default_attempt_frequency")]
    pub attempt_frequency: u32,

    /// Real-time milliseconds per server tick.
    #[serde(default = "default_server_tick_ms")]
    pub server_tick_ms: u64,

    /// Seed for the wear draw. Omit for an OS-seeded generator.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            disabled_worlds: Vec::new(),
            enable_in_creative_mode: default_true(),
            movement_check_enabled: false,
            attempt_frequency: default_attempt_frequency(),
            server_tick_ms: default_server_tick_ms(),
            seed: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Chances
// ---------------------------------------------------------------------------

/// Base chance (percent) per modifier class.
///
/// Keys left out of a loaded section default to zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ChanceModifiersConfig {
    /// No footwear, or footwear of an unlisted material.
    #[serde(default)]
    pub no_boots: i32,
    /// Basic footwear (leather).
    #[serde(default)]
    pub leather_boots: i32,
    /// Protective footwear without fall protection.
    #[serde(default)]
    pub has_boots: i32,
    /// Footwear enchanted with fall protection.
    #[serde(default)]
    pub feather_falling: i32,
    /// Riding a horse-like mount.
    #[serde(default)]
    pub riding_horse: i32,
    /// Riding a boat.
    #[serde(default)]
    pub riding_boat: i32,
    /// Riding a pig.
    #[serde(default)]
    pub riding_pig: i32,
}

impl Default for ChanceModifiersConfig {
    fn default() -> Self {
        Self {
            no_boots: 10,
            leather_boots: 8,
            has_boots: 5,
            feather_falling: 2,
            riding_horse: 40,
            riding_boat: 0,
            riding_pig: 20,
        }
    }
}

/// Posture deltas (percentage points) per zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct AdditiveModifiersConfig {
    /// Added to the below-feet chance while sprinting.
    #[serde(default)]
    pub sprinting_block_below: i32,
    /// Added to the at-feet chance while sprinting.
    #[serde(default)]
    pub sprinting_block_at_feet: i32,
    /// Added to the below-feet chance while crouching.
    #[serde(default)]
    pub crouching_block_below: i32,
    /// Added to the at-feet chance while crouching.
    #[serde(default)]
    pub crouching_block_at_feet: i32,
}

impl Default for AdditiveModifiersConfig {
    fn default() -> Self {
        Self {
            sprinting_block_below: 5,
            sprinting_block_at_feet: 5,
            crouching_block_below: -5,
            crouching_block_at_feet: -5,
        }
    }
}

// ---------------------------------------------------------------------------
// Transitions
// ---------------------------------------------------------------------------

/// Raw `SOURCE:TARGET` transition entries per zone.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BlockModificationsConfig {
    /// Entries for the block occupying the entity's feet position.
    #[serde(default)]
    pub block_at_feet: Vec<String>,

    /// Entries for the block directly beneath the entity.
    #[serde(default)]
    pub block_below: Vec<String>,
}

impl Default for BlockModificationsConfig {
    fn default() -> Self {
        Self {
            block_at_feet: to_owned_list(&["SHORT_GRASS:AIR", "TALL_GRASS:AIR", "FERN:AIR", "SNOW:AIR"]),
            block_below: to_owned_list(&[
                "GRASS_BLOCK:DIRT",
                "DIRT:COARSE_DIRT",
                "COARSE_DIRT:DIRT_PATH",
                "PODZOL:DIRT",
                "MYCELIUM:DIRT",
            ]),
        }
    }
}

// ---------------------------------------------------------------------------
// Integrations
// ---------------------------------------------------------------------------

/// Opaque per-system settings passed through to integration adapters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IntegrationSettings {
    /// Whether the integration should be probed at all.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Every other key, uninterpreted.
    #[serde(flatten)]
    pub settings: BTreeMap<String, serde_yml::Value>,
}

impl IntegrationSettings {
    /// A string setting.
    pub fn str(&self, key: &str) -> Option<&str> {
        self.settings.get(key).and_then(serde_yml::Value::as_str)
    }

    /// A boolean setting.
    pub fn bool(&self, key: &str) -> Option<bool> {
        self.settings.get(key).and_then(serde_yml::Value::as_bool)
    }

    /// A raw setting for adapters that deserialize their own shapes.
    pub fn value(&self, key: &str) -> Option<&serde_yml::Value> {
        self.settings.get(key)
    }
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions
// ---------------------------------------------------------------------------

const fn default_true() -> bool {
    true
}

const fn default_attempt_frequency() -> u32 {
    20
}

const fn default_server_tick_ms() -> u64 {
    50
}

fn default_log_level() -> String {
    "info".to_owned()
}

fn to_owned_list(entries: &[&str]) -> Vec<String> {
    entries.iter().map(|&entry| entry.to_owned()).collect()
}
