//! Validation of the entity-kind processing order.
//!
//! The canonical order is fixed by the store's foreign-key layout; the
//! archive's declared field dependencies are checked against it before
//! any write happens. This is purely informational: no store access.

use crate::error::{ImportError, ImportResult};
use provgraph_archive::ArchiveMetadata;
use provgraph_model::EntityKind;

/// Checks the archive schema against the canonical processing order and
/// returns that order.
///
/// Fails with [`ImportError::UnknownEntityType`] for a schema kind
/// outside the canonical list, and [`ImportError::SchemaOrderViolation`]
/// for a field dependency on a kind that is not processed strictly
/// earlier.
pub fn validated_entity_order(metadata: &ArchiveMetadata) -> ImportResult<Vec<EntityKind>> {
    let order = EntityKind::canonical_order();

    for name in metadata.field_info.keys() {
        if EntityKind::parse(name).is_none() {
            return Err(ImportError::UnknownEntityType(name.clone()));
        }
    }

    for (idx, kind) in order.iter().enumerate() {
        let Some(fields) = metadata.field_info.get(kind.as_str()) else {
            continue;
        };
        for info in fields.values() {
            let Some(required) = &info.requires else {
                continue;
            };
            if EntityKind::parse(required).is_none() {
                return Err(ImportError::UnknownEntityType(required.clone()));
            }
            let processed_earlier = order[..idx].iter().any(|k| k.as_str() == required);
            if !processed_earlier {
                return Err(ImportError::SchemaOrderViolation {
                    entity: kind.as_str().to_string(),
                    requires: required.clone(),
                });
            }
        }
    }

    Ok(order.to_vec())
}
