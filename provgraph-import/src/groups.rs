//! Group-membership replay and destination-group assignment.
//!
//! Both run after every entity is persisted, since memberships reference
//! store ids.

use crate::dedup::resolve_unique;
use crate::error::{ImportError, ImportResult};
use crate::identity::IdentityResolver;
use chrono::Utc;
use provgraph_model::{EntityKind, Group, IMPORT_GROUP_TYPE};
use provgraph_store::StoreTransaction;
use provgraph_types::{EntityUuid, StoreId};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info};

/// Replays archive-declared group memberships: for each archived group,
/// attaches the members that resolved to store ids. Unresolved members
/// are silently skipped (the unknown-node policy already ruled on them
/// upstream).
pub fn replay_memberships(
    tx: &StoreTransaction<'_>,
    resolver: &IdentityResolver,
    group_members: &BTreeMap<String, Vec<String>>,
) -> ImportResult<()> {
    for (raw_group_uuid, member_uuids) in group_members {
        let group_uuid = EntityUuid::parse(raw_group_uuid).map_err(|_| {
            ImportError::CorruptArchive(format!("invalid group UUID '{raw_group_uuid}'"))
        })?;
        let group_id = tx
            .group_id_by_uuid(&group_uuid.canonical())?
            .ok_or_else(|| {
                ImportError::DanglingReference(format!(
                    "group membership references group {group_uuid} not present in the store"
                ))
            })?;

        let mut member_ids = Vec::with_capacity(member_uuids.len());
        for raw in member_uuids {
            let resolved = EntityUuid::parse(raw)
                .ok()
                .and_then(|u| resolver.store_id_by_key(EntityKind::Node, &u.canonical()));
            match resolved {
                Some(id) => member_ids.push(id),
                None => debug!("skipping unresolved member {raw} of group {group_uuid}"),
            }
        }
        tx.add_nodes_to_group(group_id, &member_ids)?;
    }
    Ok(())
}

/// Attaches every node touched by the import to the destination group.
///
/// With no caller-supplied label, a group labeled from the current
/// timestamp is synthesized, with collisions resolved through the same
/// bounded renaming as imported labels. An empty touched set creates
/// and attaches nothing.
///
/// Returns the label used, if any.
pub fn assign_destination_group(
    tx: &StoreTransaction<'_>,
    destination: Option<&str>,
    touched: &[StoreId],
    label_claims: &mut HashSet<String>,
) -> ImportResult<Option<String>> {
    if touched.is_empty() {
        debug!("no nodes touched, destination group not created");
        return Ok(None);
    }

    let (group_id, label) = match destination {
        Some(label) => {
            let id = match tx.group_id_by_label(label)? {
                Some(id) => id,
                None => create_group(tx, label, touched[0])?,
            };
            (id, label.to_string())
        }
        None => {
            let base = Utc::now().format("%Y%m%d-%H%M%S").to_string();
            let label = resolve_unique(&base, label_claims, |candidate| {
                tx.group_label_exists(candidate)
            })?;
            let id = create_group(tx, &label, touched[0])?;
            (id, label)
        }
    };

    tx.add_nodes_to_group(group_id, touched)?;
    info!("attached {} nodes to group '{label}'", touched.len());
    Ok(Some(label))
}

fn create_group(
    tx: &StoreTransaction<'_>,
    label: &str,
    any_touched_node: StoreId,
) -> ImportResult<StoreId> {
    // The group needs an owner; the owner of a touched node is the
    // natural candidate.
    let user_id = tx.node_user(any_touched_node)?;
    let group = Group {
        uuid: EntityUuid::new(),
        label: label.to_string(),
        group_type: IMPORT_GROUP_TYPE.to_string(),
        description: String::new(),
        time: Utc::now(),
        user_id,
    };
    Ok(tx.insert_group(&group)?)
}
