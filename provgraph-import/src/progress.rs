//! Optional progress reporting.
//!
//! The observer is notified at entity-kind boundaries and per-record
//! milestones. It has no bearing on correctness: every implementation,
//! including one that does nothing, yields the same import.

use provgraph_model::EntityKind;

/// A phase of the import pipeline, for progress display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportPhase {
    /// Processing records of one entity kind.
    Entities(EntityKind),
    /// Resolving and persisting links.
    Links,
    /// Replaying memberships and assigning the destination group.
    Groups,
}

/// Receives progress notifications during an import.
///
/// All methods default to no-ops; implement only what the display
/// needs.
pub trait ImportObserver {
    /// A phase begins; `total` is the number of records it will touch.
    fn phase_started(&self, _phase: ImportPhase, _total: usize) {}

    /// One record of the current phase was processed.
    fn record_processed(&self, _phase: ImportPhase) {}

    /// A phase completed.
    fn phase_finished(&self, _phase: ImportPhase) {}
}

/// The default observer: ignores everything.
pub struct NoopObserver;

impl ImportObserver for NoopObserver {}
