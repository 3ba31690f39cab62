//! JSON-lines block log.
//!
//! Every confirmed transition becomes two lines, a `removal` of the old
//! surface followed by a `placement` of the new one, the way block-logging
//! tools record a swap. Lines are flushed per transition so a crash loses
//! at most the swap in flight.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use pathwear_core::applier::{AuditError, AuditSink, MutationApplier, TracingAuditSink};
use pathwear_core::config::WearConfig;
use pathwear_types::{EntityId, SurfaceType, TransitionRecord, Zone};
use serde::Serialize;
use tracing::{info, warn};

use crate::integrations::BLOCK_LOG;

/// File written when the `block_log` integration names no `path`.
pub const DEFAULT_AUDIT_PATH: &str = "pathwear-audit.jsonl";

/// What happened to the surface on one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum BlockAction {
    Removal,
    Placement,
}

#[derive(Serialize)]
struct BlockLogLine<'a> {
    time: &'a DateTime<Utc>,
    action: BlockAction,
    user: &'a str,
    entity: EntityId,
    zone: Zone,
    world: &'a str,
    x: i32,
    y: i32,
    z: i32,
    surface: SurfaceType,
}

/// Appends transitions to a JSON-lines file.
#[derive(Debug)]
pub struct JsonlAuditSink {
    path: PathBuf,
    writer: Mutex<BufWriter<File>>,
}

impl JsonlAuditSink {
    /// Open `path` for appending, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::Io`] if the file cannot be opened.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, AuditError> {
        let path = path.into();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            writer: Mutex::new(BufWriter::new(file)),
        })
    }

    /// Open the sink described by the `block_log` integration.
    ///
    /// Returns `None` when the integration is absent, disabled, or has
    /// `log_paths` turned off.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::Io`] if the configured file cannot be opened.
    pub fn from_config(config: &WearConfig) -> Result<Option<Self>, AuditError> {
        let Some(settings) = config.integration(BLOCK_LOG) else {
            info!("Block log not configured; transitions go to tracing only");
            return Ok(None);
        };
        if !settings.bool("log_paths").unwrap_or(true) {
            info!("Block log present with log_paths off");
            return Ok(None);
        }
        let path = settings.str("path").unwrap_or(DEFAULT_AUDIT_PATH);
        let sink = Self::open(path)?;
        info!(path = %sink.path().display(), "Block log opened");
        Ok(Some(sink))
    }

    /// The file being written.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Build the applier for `config`.
///
/// A disabled or absent block log leaves the applier without a sink. A
/// block log that cannot be opened degrades to [`TracingAuditSink`].
pub fn applier_for(config: &WearConfig) -> MutationApplier {
    match JsonlAuditSink::from_config(config) {
        Ok(Some(sink)) => MutationApplier::with_audit(Arc::new(sink)),
        Ok(None) => MutationApplier::new(),
        Err(e) => {
            warn!(error = %e, "Block log unavailable; recording transitions to tracing");
            MutationApplier::with_audit(Arc::new(TracingAuditSink))
        }
    }
}

impl AuditSink for JsonlAuditSink {
    fn name(&self) -> &'static str {
        BLOCK_LOG
    }

    fn record_transition(&self, record: &TransitionRecord) -> Result<(), AuditError> {
        let pos = record.location.pos;
        let line = |action, surface| BlockLogLine {
            time: &record.recorded_at,
            action,
            user: &record.entity_name,
            entity: record.entity,
            zone: record.zone,
            world: &record.location.world,
            x: pos.x,
            y: pos.y,
            z: pos.z,
            surface,
        };

        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        for entry in [
            line(BlockAction::Removal, record.from),
            line(BlockAction::Placement, record.to),
        ] {
            serde_json::to_writer(&mut *writer, &entry).map_err(|e| AuditError::Encode {
                message: e.to_string(),
            })?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
        Ok(())
    }
}
