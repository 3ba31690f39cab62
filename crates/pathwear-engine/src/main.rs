//! Sandbox host for the Pathwear terrain wear engine.
//!
//! Generates a meadow world, fills it with wandering entities, and runs the
//! periodic wear loop over it until Ctrl-C or the configured run time.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `pathwear-config.yaml` (or `PATHWEAR_CONFIG`)
//! 2. Initialize structured logging (tracing)
//! 3. Generate the sandbox meadow
//! 4. Create control state and the activity tracker
//! 5. Compile chance and transition tables
//! 6. Spawn wanderers and start them walking
//! 7. Probe integrations into the capability registry
//! 8. Open the block log
//! 9. Start the wear loop
//! 10. Wait for Ctrl-C or the run time to elapse
//! 11. Drain the loop and log a summary

mod audit;
mod error;
mod integrations;
mod wanderers;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use pathwear_core::activity::ActivityTracker;
use pathwear_core::authorization::AuthorizationGate;
use pathwear_core::chance::ChanceTable;
use pathwear_core::config::WearConfig;
use pathwear_core::control::ControlState;
use pathwear_core::executor::WearExecutor;
use pathwear_core::runner::{self, LoopTiming, RunnerError};
use pathwear_core::scheduler::{SchedulerSettings, WearScheduler};
use pathwear_core::transition::TransitionTable;
use pathwear_types::{SurfaceType, Zone};
use pathwear_world::{EntityRoster, SurfaceGrid};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::wanderers::SandboxConfig;

/// Config file read when `PATHWEAR_CONFIG` is unset.
const DEFAULT_CONFIG_PATH: &str = "pathwear-config.yaml";

/// Environment variable overriding the config file path.
const CONFIG_PATH_VAR: &str = "PATHWEAR_CONFIG";

/// Application entry point for the sandbox engine.
///
/// # Errors
///
/// Returns an error if any initialization step or the final drain fails.
#[tokio::main]
#[allow(clippy::too_many_lines)]
async fn main() -> Result<(), EngineError> {
    // 1. Load configuration. Logging is configured from it, so nothing is
    //    logged until step 2.
    let config_path = config_path();
    let config_found = config_path.exists();
    let config = load_config(&config_path, config_found)?;
    let sandbox = load_sandbox_config(&config_path, config_found)?;

    // 2. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .init();

    info!("pathwear-engine starting");
    if config_found {
        info!(path = %config_path.display(), "Configuration loaded");
    } else {
        info!(path = %config_path.display(), "Config file not found, using defaults");
    }
    info!(
        attempt_frequency = config.general.attempt_frequency,
        server_tick_ms = config.general.server_tick_ms,
        movement_check_enabled = config.general.movement_check_enabled,
        enable_in_creative_mode = config.general.enable_in_creative_mode,
        "General settings"
    );

    // 3. Generate the sandbox meadow.
    let mut surfaces = SurfaceGrid::new();
    let layout = pathwear_world::build_meadow(
        &mut surfaces,
        &sandbox.world,
        sandbox.half_extent,
        sandbox.ground_y,
    )?;

    // 4. Create control state and the activity tracker.
    let control = Arc::new(ControlState::from_config(&config.general, &surfaces));
    let tracker = Arc::new(ActivityTracker::new(config.general.movement_check_enabled));
    info!(
        disabled_worlds = ?control.disabled_worlds(),
        gating = tracker.is_gating(),
        "Control state initialized"
    );

    // 5. Compile chance and transition tables.
    let chances = ChanceTable::from_config(
        config.chance_modifiers.as_ref(),
        config.additive_modifiers.as_ref(),
    );
    let transitions = TransitionTable::from_config(config.block_modifications.as_ref());
    info!(
        below_feet = transitions.len(Zone::BelowFeet),
        at_feet = transitions.len(Zone::AtFeet),
        "Transition table compiled"
    );

    // 6. Spawn wanderers and start them walking.
    let roster = Arc::new(EntityRoster::new());
    let mut rng = sandbox.rng();
    let spawned = wanderers::spawn_wanderers(&sandbox, &layout, &roster, &mut rng)?;
    info!(wanderers = spawned.len(), "Wanderers spawned");
    let movement = wanderers::spawn_movement(
        Arc::clone(&roster),
        Arc::clone(&tracker),
        Arc::clone(&control),
        layout.clone(),
        &sandbox,
    );

    // 7. Probe integrations.
    let registry = integrations::build_registry(&config);

    // 8. Open the block log.
    let applier = audit::applier_for(&config);
    info!(audit = ?applier.audit_name(), "Audit sink attached");

    // 9. Start the wear loop.
    let executor = WearExecutor::new(
        AuthorizationGate::new(Arc::clone(&control), registry),
        transitions,
        applier,
    );
    let scheduler = WearScheduler::new(
        SchedulerSettings::from_config(&config.general),
        chances,
        Arc::clone(&tracker),
        Arc::clone(&control),
    );
    let wear_loop = runner::spawn_wear_loop(
        scheduler,
        executor,
        Arc::clone(&roster),
        surfaces,
        Arc::clone(&control),
        LoopTiming::from_config(&config.general),
    );

    // 10. Wait for Ctrl-C or the run time to elapse.
    wait_for_shutdown(sandbox.run_seconds).await?;
    info!("Shutdown requested; draining in-flight attempts");

    // 11. Drain the loop and log a summary.
    let report = wear_loop.shutdown().await?;
    let steps = movement.await.map_err(RunnerError::from)?;

    match serde_json::to_string(&report.stats) {
        Ok(stats) => info!(stats = %stats, "Wear loop statistics"),
        Err(e) => warn!(error = %e, "Failed to encode wear loop statistics"),
    }
    info!(
        world = %layout.world,
        steps,
        dirt_path = report.surfaces.count(&layout.world, SurfaceType::DirtPath),
        coarse_dirt = report.surfaces.count(&layout.world, SurfaceType::CoarseDirt),
        grass = report.surfaces.count(&layout.world, SurfaceType::GrassBlock),
        "Meadow after the run"
    );
    info!(started_at = %control.started_at(), "pathwear-engine stopped");

    Ok(())
}

/// The config file path, honoring `PATHWEAR_CONFIG`.
fn config_path() -> PathBuf {
    std::env::var_os(CONFIG_PATH_VAR).map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from)
}

/// Load the wear configuration, falling back to defaults when the file
/// does not exist.
fn load_config(path: &Path, found: bool) -> Result<WearConfig, EngineError> {
    if found {
        Ok(WearConfig::from_file(path)?)
    } else {
        Ok(WearConfig::default())
    }
}

/// Load the `sandbox` section from the same file.
///
/// If the file does not exist or lacks the section, defaults are used.
fn load_sandbox_config(path: &Path, found: bool) -> Result<SandboxConfig, EngineError> {
    if !found {
        return Ok(SandboxConfig::default());
    }
    let contents = std::fs::read_to_string(path).map_err(|e| EngineError::Sandbox {
        message: format!("failed to read config file: {e}"),
    })?;
    let raw: serde_yml::Value = serde_yml::from_str(&contents).map_err(|e| EngineError::Sandbox {
        message: format!("failed to parse config YAML: {e}"),
    })?;
    SandboxConfig::from_document(&raw)
}

/// Resolve on Ctrl-C, or after `run_seconds` when set.
async fn wait_for_shutdown(run_seconds: Option<u64>) -> Result<(), EngineError> {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.map_err(|e| EngineError::Signal {
            message: format!("failed to listen for Ctrl-C: {e}"),
        })
    };

    match run_seconds {
        Some(seconds) => {
            tokio::select! {
                result = ctrl_c => result,
                () = tokio::time::sleep(Duration::from_secs(seconds)) => {
                    info!(seconds, "Run time elapsed");
                    Ok(())
                }
            }
        }
        None => ctrl_c.await,
    }
}
