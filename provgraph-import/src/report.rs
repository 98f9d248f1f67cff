//! The result record an import returns on success.

use provgraph_model::EntityKind;
use provgraph_types::{ArchiveId, StoreId};
use serde::Serialize;
use std::collections::BTreeMap;

/// Per-kind outcome: which archive records were created and which were
/// matched to entities already in the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EntityOutcome {
    /// `(archive_id, store_id)` pairs for newly created entities.
    pub new: Vec<(ArchiveId, StoreId)>,
    /// `(archive_id, store_id)` pairs matched by natural key.
    pub existing: Vec<(ArchiveId, StoreId)>,
}

/// An extras key whose conflicting values were left for manual
/// resolution (conflict policy `Defer`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeferredExtra {
    /// UUID of the node carrying the conflict.
    pub node_uuid: String,
    pub key: String,
}

/// The complete result of one import.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportReport {
    pub entities: BTreeMap<EntityKind, EntityOutcome>,
    /// Newly created links as `(source_id, target_id)` pairs.
    pub links_created: Vec<(StoreId, StoreId)>,
    /// Extras conflicts deferred for manual resolution.
    pub deferred_extras: Vec<DeferredExtra>,
    /// Label of the group the imported nodes were attached to, if any
    /// nodes were touched.
    pub destination_group: Option<String>,
}

impl ImportReport {
    /// The outcome bucket for a kind, creating it on first use.
    pub(crate) fn outcome_mut(&mut self, kind: EntityKind) -> &mut EntityOutcome {
        self.entities.entry(kind).or_default()
    }

    /// The outcome for a kind, if any record of it was processed.
    #[must_use]
    pub fn outcome(&self, kind: EntityKind) -> Option<&EntityOutcome> {
        self.entities.get(&kind)
    }
}
