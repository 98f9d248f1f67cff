//! Link resolution, deduplication, and semantic validation.

use crate::error::{ImportError, ImportResult};
use crate::identity::IdentityResolver;
use crate::options::UnknownNodePolicy;
use crate::progress::{ImportObserver, ImportPhase};
use provgraph_archive::LinkRecord;
use provgraph_model::{EntityKind, LinkType, NodeCategory};
use provgraph_store::StoreTransaction;
use provgraph_types::{EntityUuid, StoreId};
use tracing::debug;

/// Resolves a raw endpoint UUID to a store id, if the node was touched
/// by this import. Invalid UUID strings count as unresolved.
fn resolve_endpoint(resolver: &IdentityResolver, raw: &str) -> Option<StoreId> {
    let uuid = EntityUuid::parse(raw).ok()?;
    resolver.store_id_by_key(EntityKind::Node, &uuid.canonical())
}

fn endpoint_category(tx: &StoreTransaction<'_>, id: StoreId) -> ImportResult<NodeCategory> {
    let node_type = tx.node_type(id)?;
    NodeCategory::of_node_type(&node_type).ok_or_else(|| ImportError::LinkValidation {
        rule: format!("node {id} of type '{node_type}' cannot participate in links"),
    })
}

/// Imports the archive's link list. Runs strictly after all entities
/// are persisted, since both endpoints resolve to store ids.
///
/// Returns the `(source_id, target_id)` pairs of newly created links.
/// An already-present quadruple is skipped silently: link import is
/// idempotent.
pub fn import_links(
    tx: &StoreTransaction<'_>,
    resolver: &IdentityResolver,
    policy: UnknownNodePolicy,
    links: &[LinkRecord],
    observer: &dyn ImportObserver,
) -> ImportResult<Vec<(StoreId, StoreId)>> {
    observer.phase_started(ImportPhase::Links, links.len());
    let mut created = Vec::new();

    for link in links {
        observer.record_processed(ImportPhase::Links);

        let source = resolve_endpoint(resolver, &link.source);
        let target = resolve_endpoint(resolver, &link.target);
        let (source, target) = match (source, target) {
            (Some(s), Some(t)) => (s, t),
            _ => {
                if policy == UnknownNodePolicy::Ignore {
                    debug!(
                        "skipping link '{}' with unresolved endpoint (source={}, target={})",
                        link.label, link.source, link.target
                    );
                    continue;
                }
                return Err(ImportError::DanglingReference(format!(
                    "link with unresolved endpoint (source={}, target={}, label={}, type={})",
                    link.source, link.target, link.label, link.link_type
                )));
            }
        };

        let link_type = LinkType::parse(&link.link_type).ok_or_else(|| {
            ImportError::LinkValidation {
                rule: format!("unknown link type '{}'", link.link_type),
            }
        })?;

        // Idempotence: an identical quadruple is a no-op, not an error.
        if tx.link_exists(source, target, link_type, &link.label)? {
            continue;
        }

        let source_category = endpoint_category(tx, source)?;
        let target_category = endpoint_category(tx, target)?;
        if !link_type.connects(source_category, target_category) {
            return Err(ImportError::LinkValidation {
                rule: format!(
                    "link type '{link_type}' may not connect a {source_category} node \
                     to a {target_category} node (label={})",
                    link.label
                ),
            });
        }

        let other_types = tx.link_types_for_labeled_pair(source, target, &link.label)?;
        if let Some(existing) = other_types.iter().find(|t| t.as_str() != link_type.as_str()) {
            return Err(ImportError::LinkValidation {
                rule: format!(
                    "label '{}' already connects nodes {source} and {target} \
                     under type '{existing}'",
                    link.label
                ),
            });
        }

        tx.insert_link(source, target, link_type, &link.label)?;
        created.push((source, target));
    }

    observer.phase_finished(ImportPhase::Links);
    debug!("{} new links", created.len());
    Ok(created)
}
