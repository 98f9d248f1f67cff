//! The import pipeline: one transaction bracketing entity resolution,
//! deduplication, merging, link validation, and group assignment.

use crate::dedup::resolve_unique;
use crate::error::{ImportError, ImportResult};
use crate::groups::{assign_destination_group, replay_memberships};
use crate::identity::IdentityResolver;
use crate::links::import_links;
use crate::merge::{merge_comment, merge_extras, sanitize_extras, CommentDecision};
use crate::options::{ImportOptions, NewExtrasPolicy, UnknownNodePolicy};
use crate::ordering::validated_entity_order;
use crate::progress::{ImportObserver, ImportPhase, NoopObserver};
use crate::report::{DeferredExtra, ImportReport};
use crate::rows;
use provgraph_archive::Archive;
use provgraph_model::EntityKind;
use provgraph_repository::Repository;
use provgraph_store::{ProvStore, StoreTransaction};
use provgraph_types::{ArchiveId, StoreId};
use serde_json::{Map, Value};
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::{debug, info, warn};

/// Imports archives into a store, all-or-nothing.
///
/// One importer can run many archives; each [`run`](Self::run) holds a
/// single store transaction for its whole duration. Any failure at any
/// stage rolls back every write of that run.
pub struct ArchiveImporter {
    options: ImportOptions,
    observer: Box<dyn ImportObserver>,
}

impl ArchiveImporter {
    /// Creates an importer with the given options and no progress
    /// reporting.
    #[must_use]
    pub fn new(options: ImportOptions) -> Self {
        Self {
            options,
            observer: Box::new(NoopObserver),
        }
    }

    /// Attaches a progress observer. The observer is never load-bearing.
    #[must_use]
    pub fn with_observer(mut self, observer: Box<dyn ImportObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Runs the import.
    ///
    /// On success every archived entity is either matched to a store
    /// entity by natural key or newly created, links and memberships
    /// are replayed, and the touched nodes are attached to the
    /// destination group. On error the store is left exactly as it was.
    pub fn run(
        &self,
        store: &mut ProvStore,
        repository: &Repository,
        archive: &Archive,
    ) -> ImportResult<ImportReport> {
        self.upfront_dangling_scan(archive)?;
        let order = validated_entity_order(archive.metadata())?;

        let tx = store.transaction()?;
        let mut resolver = IdentityResolver::new();
        let mut report = ImportReport::default();
        let mut computer_name_claims = HashSet::new();
        let mut group_label_claims = HashSet::new();

        for kind in order {
            self.process_kind(
                &tx,
                repository,
                archive,
                kind,
                &mut resolver,
                &mut report,
                &mut computer_name_claims,
                &mut group_label_claims,
            )?;
        }

        report.links_created = import_links(
            &tx,
            &resolver,
            self.options.unknown_nodes,
            &archive.data().links,
            self.observer.as_ref(),
        )?;

        self.observer
            .phase_started(ImportPhase::Groups, archive.data().group_members.len());
        replay_memberships(&tx, &resolver, &archive.data().group_members)?;

        let touched = touched_node_ids(&report);
        report.destination_group = assign_destination_group(
            &tx,
            self.options.destination_group.as_deref(),
            &touched,
            &mut group_label_claims,
        )?;
        self.observer.phase_finished(ImportPhase::Groups);

        tx.commit()?;
        info!(
            "import committed: {} new links, destination group {:?}",
            report.links_created.len(),
            report.destination_group
        );
        Ok(report)
    }

    /// Under the `Fail` policy, rejects up front any archive whose link
    /// or membership lists reference node UUIDs the archive does not
    /// contain. Invalid UUID strings are not references and are left
    /// for the link phase to rule on.
    fn upfront_dangling_scan(&self, archive: &Archive) -> ImportResult<()> {
        if self.options.unknown_nodes == UnknownNodePolicy::Ignore {
            return Ok(());
        }

        let mut archive_nodes = HashSet::new();
        if let Some(node_rows) = archive.rows(EntityKind::Node.as_str()) {
            for row in node_rows.values() {
                if let Some(raw) = row.get("uuid").and_then(Value::as_str) {
                    if let Ok(key) = IdentityResolver::normalize_key(EntityKind::Node, raw) {
                        archive_nodes.insert(key);
                    }
                }
            }
        }

        let mut unknown = BTreeSet::new();
        {
            let mut check = |raw: &str| {
                if let Ok(key) = IdentityResolver::normalize_key(EntityKind::Node, raw) {
                    if !archive_nodes.contains(&key) {
                        unknown.insert(key);
                    }
                }
            };
            for link in &archive.data().links {
                check(&link.source);
                check(&link.target);
            }
            for members in archive.data().group_members.values() {
                for member in members {
                    check(member);
                }
            }
        }

        if unknown.is_empty() {
            Ok(())
        } else {
            Err(ImportError::DanglingReference(format!(
                "archive references {} node(s) it does not contain: {}",
                unknown.len(),
                unknown.into_iter().collect::<Vec<_>>().join(", ")
            )))
        }
    }

    /// Processes all archive records of one kind: classify against the
    /// store, merge what exists, create what doesn't, then resolve the
    /// assigned store ids.
    #[allow(clippy::too_many_arguments)]
    fn process_kind(
        &self,
        tx: &StoreTransaction<'_>,
        repository: &Repository,
        archive: &Archive,
        kind: EntityKind,
        resolver: &mut IdentityResolver,
        report: &mut ImportReport,
        computer_name_claims: &mut HashSet<String>,
        group_label_claims: &mut HashSet<String>,
    ) -> ImportResult<()> {
        let Some(records) = archive.rows(kind.as_str()) else {
            return Ok(());
        };
        let phase = ImportPhase::Entities(kind);
        self.observer.phase_started(phase, records.len());
        debug!("{kind}: {} archive records", records.len());

        let key_field = archive
            .metadata()
            .unique_identifiers
            .get(kind.as_str())
            .ok_or_else(|| {
                ImportError::CorruptArchive(format!("no unique identifier declared for {kind}"))
            })?;

        // archive_id → natural_key tables, plus a deterministic order.
        let mut ordered: Vec<(ArchiveId, &Map<String, Value>)> = Vec::with_capacity(records.len());
        let mut keys: Vec<String> = Vec::with_capacity(records.len());
        for (raw_id, row) in records {
            let archive_id: ArchiveId = raw_id.parse().map_err(|_| {
                ImportError::CorruptArchive(format!("invalid archive id '{raw_id}' for {kind}"))
            })?;
            let raw_key = row.get(key_field.as_str()).and_then(Value::as_str).ok_or_else(|| {
                ImportError::CorruptArchive(format!(
                    "{kind} {archive_id}: missing natural key field '{key_field}'"
                ))
            })?;
            let key = IdentityResolver::normalize_key(kind, raw_key)?;
            resolver.register(kind, archive_id, key.clone());
            ordered.push((archive_id, row));
            keys.push(key);
        }
        let mut order_index: Vec<usize> = (0..ordered.len()).collect();
        order_index.sort_by_key(|&i| ordered[i].0);

        // One bulk membership query classifies every record.
        let existing_keys = resolver.classify(tx, kind, &keys)?;

        let mut new_rows: Vec<(ArchiveId, Map<String, Value>, String)> = Vec::new();
        let mut existing_rows: Vec<(ArchiveId, &Map<String, Value>, String)> = Vec::new();
        for &i in &order_index {
            let (archive_id, row) = ordered[i];
            let key = keys[i].clone();
            if existing_keys.contains(&key) {
                existing_rows.push((archive_id, row, key));
            } else {
                new_rows.push((archive_id, row.clone(), key));
            }
        }

        // Existing entries: merge mutable metadata, never recreate.
        for (archive_id, row, key) in existing_rows {
            let store_id = resolver.store_id_by_key(kind, &key).ok_or_else(|| {
                ImportError::CorruptArchive(format!(
                    "{kind} {archive_id}: classified as existing but store id unresolved"
                ))
            })?;

            match kind {
                EntityKind::Node => {
                    self.merge_existing_node_extras(tx, archive, archive_id, &key, store_id, report)?;
                }
                EntityKind::Comment => {
                    let (existing_id, existing_mtime, existing_content) =
                        tx.comment_by_uuid(&key)?.ok_or_else(|| {
                            ImportError::CorruptArchive(format!(
                                "Comment {archive_id}: classified as existing but not found"
                            ))
                        })?;
                    let (incoming_mtime, incoming_content) =
                        rows::comment_merge_inputs(row, archive_id)?;
                    match merge_comment(
                        existing_mtime,
                        &existing_content,
                        incoming_mtime,
                        &incoming_content,
                        self.options.comments,
                    ) {
                        CommentDecision::LeaveExisting => {}
                        CommentDecision::OverwriteExisting => {
                            tx.update_comment(existing_id, &incoming_content, incoming_mtime)?;
                        }
                        CommentDecision::CreateRekeyed(fresh) => {
                            // The two comments coexist: route the archived
                            // one into the new pipeline under a fresh UUID.
                            debug!("re-keying comment {key} as {fresh}");
                            let mut rekeyed = row.clone();
                            rekeyed.insert("uuid".to_string(), Value::String(fresh.canonical()));
                            resolver.register(kind, archive_id, fresh.canonical());
                            new_rows.push((archive_id, rekeyed, fresh.canonical()));
                            self.observer.record_processed(phase);
                            continue;
                        }
                    }
                }
                _ => {}
            }

            report.outcome_mut(kind).existing.push((archive_id, store_id));
            self.observer.record_processed(phase);
        }

        // New entries: materialize and flush.
        let mut key_to_archive_id: HashMap<String, ArchiveId> = HashMap::new();
        for (archive_id, row, key) in &new_rows {
            key_to_archive_id.insert(key.clone(), *archive_id);
            match kind {
                EntityKind::User => {
                    tx.insert_user(&rows::build_user(row, *archive_id)?)?;
                }
                EntityKind::Computer => {
                    let original = rows::computer_name(row, *archive_id)?;
                    let name = resolve_unique(&original, computer_name_claims, |candidate| {
                        tx.computer_name_exists(candidate)
                    })?;
                    tx.insert_computer(&rows::build_computer(row, *archive_id, name)?)?;
                }
                EntityKind::Node => {
                    self.create_node(tx, repository, archive, *archive_id, row, resolver)?;
                }
                EntityKind::Group => {
                    let original = rows::group_label(row, *archive_id)?;
                    let label = resolve_unique(&original, group_label_claims, |candidate| {
                        tx.group_label_exists(candidate)
                    })?;
                    tx.insert_group(&rows::build_group(row, *archive_id, resolver, label)?)?;
                }
                EntityKind::Log => {
                    tx.insert_log(&rows::build_log(row, *archive_id, resolver)?)?;
                }
                EntityKind::Comment => {
                    tx.insert_comment(&rows::build_comment(row, *archive_id, resolver)?)?;
                }
            }
            self.observer.record_processed(phase);
        }

        // The flush boundary: the just-created rows are queryable, so
        // one bulk query retrieves their assigned store ids.
        let new_keys: Vec<String> = new_rows.iter().map(|(_, _, key)| key.clone()).collect();
        for (key, store_id) in tx.ids_by_natural_key(kind, &new_keys)? {
            if let Some(&archive_id) = key_to_archive_id.get(&key) {
                resolver.record_store_id(kind, key, store_id);
                report.outcome_mut(kind).new.push((archive_id, store_id));
            }
        }

        self.observer.phase_finished(phase);
        Ok(())
    }

    /// Creates one new node: payload relocation, attributes, extras,
    /// row insertion — in that order, so a corrupt archive is detected
    /// before the row lands.
    fn create_node(
        &self,
        tx: &StoreTransaction<'_>,
        repository: &Repository,
        archive: &Archive,
        archive_id: ArchiveId,
        row: &Map<String, Value>,
        resolver: &IdentityResolver,
    ) -> ImportResult<()> {
        let mut node = rows::build_node(row, archive_id, resolver)?;

        let payload = archive.payload_dir(&node.uuid);
        if !payload.is_dir() {
            return Err(ImportError::CorruptArchive(format!(
                "missing payload directory for node {}",
                node.uuid
            )));
        }
        repository.ingest(&payload, &node.uuid)?;

        let archive_key = archive_id.to_string();
        node.attributes = archive
            .data()
            .node_attributes
            .get(&archive_key)
            .cloned()
            .ok_or_else(|| {
                ImportError::CorruptArchive(format!("missing attributes for node {}", node.uuid))
            })?;

        node.extras = match self.options.extras_new {
            NewExtrasPolicy::Import => {
                let raw = archive.data().node_extras.get(&archive_key).ok_or_else(|| {
                    ImportError::CorruptArchive(format!("missing extras for node {}", node.uuid))
                })?;
                sanitize_extras(raw, &node.node_type)
            }
            NewExtrasPolicy::Skip => Map::new(),
        };

        tx.insert_node(&node)?;
        Ok(())
    }

    /// Merges archived extras into an existing node, writing back only
    /// on actual change.
    fn merge_existing_node_extras(
        &self,
        tx: &StoreTransaction<'_>,
        archive: &Archive,
        archive_id: ArchiveId,
        node_uuid: &str,
        store_id: StoreId,
        report: &mut ImportReport,
    ) -> ImportResult<()> {
        let raw = archive
            .data()
            .node_extras
            .get(&archive_id.to_string())
            .ok_or_else(|| {
                ImportError::CorruptArchive(format!("missing extras for node {node_uuid}"))
            })?;
        let node_type = tx.node_type(store_id)?;
        let incoming = sanitize_extras(raw, &node_type);
        let current = tx.node_extras(store_id)?;

        let outcome = merge_extras(&current, &incoming, self.options.extras_existing);
        for key in &outcome.deferred {
            warn!("extras conflict on node {node_uuid}, key '{key}' left for manual resolution");
            report.deferred_extras.push(DeferredExtra {
                node_uuid: node_uuid.to_string(),
                key: key.clone(),
            });
        }
        if outcome.merged != current {
            tx.update_node_extras(store_id, &outcome.merged)?;
        }
        Ok(())
    }
}

/// The store ids of every node this import touched, existing first.
fn touched_node_ids(report: &ImportReport) -> Vec<StoreId> {
    report
        .outcome(EntityKind::Node)
        .map(|outcome| {
            outcome
                .existing
                .iter()
                .chain(outcome.new.iter())
                .map(|&(_, store_id)| store_id)
                .collect()
        })
        .unwrap_or_default()
}
