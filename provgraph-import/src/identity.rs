//! Identity mapping between archive-local ids, natural keys, and
//! store-assigned ids.
//!
//! Two tables per entity kind: `archive_id → natural_key`, built
//! directly from archive data, and `natural_key → store_id`, populated
//! lazily — first by the bulk membership query that classifies records
//! as existing, then extended after each flush of new records.

use crate::error::{ImportError, ImportResult};
use provgraph_model::EntityKind;
use provgraph_store::StoreTransaction;
use provgraph_types::{ArchiveId, EntityUuid, StoreId};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::debug;

/// Progressive id-mapping state for one import.
#[derive(Debug, Default)]
pub struct IdentityResolver {
    natural_keys: BTreeMap<EntityKind, HashMap<ArchiveId, String>>,
    store_ids: BTreeMap<EntityKind, HashMap<String, StoreId>>,
}

impl IdentityResolver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalizes a raw natural key for lookups and table insertion.
    ///
    /// UUID keys are reduced to the canonical lowercase hyphenated
    /// form, so representation differences never cause spurious misses.
    pub fn normalize_key(kind: EntityKind, raw: &str) -> ImportResult<String> {
        if kind.natural_key_is_uuid() {
            let uuid = EntityUuid::parse(raw).map_err(|_| {
                ImportError::CorruptArchive(format!("invalid UUID '{raw}' as {kind} natural key"))
            })?;
            Ok(uuid.canonical())
        } else {
            Ok(raw.to_string())
        }
    }

    /// Records the natural key of one archive record.
    pub fn register(&mut self, kind: EntityKind, archive_id: ArchiveId, natural_key: String) {
        self.natural_keys
            .entry(kind)
            .or_default()
            .insert(archive_id, natural_key);
    }

    /// The natural key of an archive record, if registered.
    #[must_use]
    pub fn natural_key(&self, kind: EntityKind, archive_id: ArchiveId) -> Option<&str> {
        self.natural_keys
            .get(&kind)?
            .get(&archive_id)
            .map(String::as_str)
    }

    /// The store id behind a natural key, if resolved yet.
    #[must_use]
    pub fn store_id_by_key(&self, kind: EntityKind, natural_key: &str) -> Option<StoreId> {
        self.store_ids.get(&kind)?.get(natural_key).copied()
    }

    /// The store id behind an archive record, if resolved yet.
    #[must_use]
    pub fn store_id_by_archive_id(&self, kind: EntityKind, archive_id: ArchiveId) -> Option<StoreId> {
        let key = self.natural_key(kind, archive_id)?;
        self.store_ids.get(&kind)?.get(key).copied()
    }

    /// Extends the `natural_key → store_id` table with one mapping.
    pub fn record_store_id(&mut self, kind: EntityKind, natural_key: String, store_id: StoreId) {
        self.store_ids
            .entry(kind)
            .or_default()
            .insert(natural_key, store_id);
    }

    /// One bulk membership query: resolves which of `keys` already exist
    /// in the store, records their store ids, and returns the matched
    /// key set. Everything not returned classifies as *new*.
    pub fn classify(
        &mut self,
        tx: &StoreTransaction<'_>,
        kind: EntityKind,
        keys: &[String],
    ) -> ImportResult<HashSet<String>> {
        let matched = tx.ids_by_natural_key(kind, keys)?;
        debug!(
            "{kind}: {} of {} archive keys already in store",
            matched.len(),
            keys.len()
        );
        let mut existing = HashSet::with_capacity(matched.len());
        for (key, store_id) in matched {
            existing.insert(key.clone());
            self.record_store_id(kind, key, store_id);
        }
        Ok(existing)
    }

    /// Resolves a foreign key carried by an archive record: the archive
    /// id of the referenced record, through its natural key, to its
    /// store id. The referenced kind is processed earlier, so a miss
    /// means the archive is incomplete.
    pub fn resolve_foreign(
        &self,
        referenced: EntityKind,
        archive_id: ArchiveId,
        context: &str,
    ) -> ImportResult<StoreId> {
        self.store_id_by_archive_id(referenced, archive_id)
            .ok_or_else(|| {
                ImportError::CorruptArchive(format!(
                    "{context} references {referenced} with archive id {archive_id}, \
                     which is not present in the archive"
                ))
            })
    }
}
