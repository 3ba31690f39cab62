//! Surface mutation and audit reporting.
//!
//! [`MutationApplier::apply`] performs one swap on the surface store it is
//! handed, confirms by reading the location back, and only then reports
//! the transition to the optional [`AuditSink`]. Audit is best effort: a
//! failing sink is logged and the mutation stands.

use std::sync::Arc;

use chrono::Utc;
use pathwear_types::{BlockLocation, EntitySnapshot, SurfaceType, TransitionRecord, Zone};
use pathwear_world::{SurfaceAccess, SurfaceError};
use tracing::{debug, info, warn};

/// Target under which [`TracingAuditSink`] emits records.
pub const AUDIT_TARGET: &str = "pathwear::audit";

/// Errors raised by audit sinks.
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    /// Writing the record failed.
    #[error("audit I/O error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// The record could not be encoded.
    #[error("failed to encode audit record: {message}")]
    Encode {
        /// Encoder message.
        message: String,
    },
}

/// Receives confirmed transitions for block-logging systems.
pub trait AuditSink: Send + Sync {
    /// Stable name used in logs.
    fn name(&self) -> &str;

    /// Record a confirmed transition.
    fn record_transition(&self, record: &TransitionRecord) -> Result<(), AuditError>;
}

/// Emits every record as a structured `info!` event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn name(&self) -> &'static str {
        "tracing"
    }

    fn record_transition(&self, record: &TransitionRecord) -> Result<(), AuditError> {
        info!(
            target: AUDIT_TARGET,
            entity = %record.entity,
            entity_name = %record.entity_name,
            zone = %record.zone,
            location = %record.location,
            from = %record.from,
            to = %record.to,
            "surface transition"
        );
        Ok(())
    }
}

/// Result of one [`MutationApplier::apply`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The target equals the current surface; nothing was written.
    Unchanged,
    /// The swap took effect and was reported.
    Applied(TransitionRecord),
    /// The write was accepted but the location reads back differently.
    NotConfirmed {
        /// What the location holds after the write.
        observed: SurfaceType,
    },
    /// The store rejected the read-back or the write.
    Failed(SurfaceError),
}

/// Performs confirmed surface swaps and reports them.
#[derive(Clone, Default)]
pub struct MutationApplier {
    audit: Option<Arc<dyn AuditSink>>,
}

impl core::fmt::Debug for MutationApplier {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MutationApplier")
            .field("audit", &self.audit.as_ref().map(|sink| sink.name()))
            .finish()
    }
}

impl MutationApplier {
    /// An applier with no audit sink.
    pub const fn new() -> Self {
        Self { audit: None }
    }

    /// An applier reporting to `sink`.
    pub fn with_audit(sink: Arc<dyn AuditSink>) -> Self {
        Self { audit: Some(sink) }
    }

    /// Name of the attached sink, if any.
    pub fn audit_name(&self) -> Option<&str> {
        self.audit.as_ref().map(|sink| sink.name())
    }

    /// Swap `from` for `to` at `location`.
    ///
    /// `from` is the surface the caller observed at `location`. When it
    /// equals `to`, nothing is written and nothing is reported.
    pub fn apply(
        &self,
        entity: &EntitySnapshot,
        zone: Zone,
        location: &BlockLocation,
        from: SurfaceType,
        to: SurfaceType,
        surfaces: &mut dyn SurfaceAccess,
    ) -> ApplyOutcome {
        if from == to {
            return ApplyOutcome::Unchanged;
        }

        if let Err(err) = surfaces.set_surface(location, to) {
            warn!(location = %location, error = %err, "Surface write failed");
            return ApplyOutcome::Failed(err);
        }

        let observed = match surfaces.surface_at(location) {
            Ok(observed) => observed,
            Err(err) => {
                warn!(location = %location, error = %err, "Surface read-back failed");
                return ApplyOutcome::Failed(err);
            }
        };
        if observed != to {
            debug!(location = %location, expected = %to, observed = %observed, "Swap did not take effect");
            return ApplyOutcome::NotConfirmed { observed };
        }

        let record = TransitionRecord {
            entity: entity.id,
            entity_name: entity.name.clone(),
            zone,
            location: location.clone(),
            from,
            to,
            recorded_at: Utc::now(),
        };

        if let Some(sink) = &self.audit {
            if let Err(err) = sink.record_transition(&record) {
                warn!(sink = sink.name(), location = %location, error = %err, "Audit record failed; mutation kept");
            }
        }

        debug!(
            entity = %entity.id,
            zone = %zone,
            location = %location,
            from = %from,
            to = %to,
            "Surface worn"
        );
        ApplyOutcome::Applied(record)
    }
}
