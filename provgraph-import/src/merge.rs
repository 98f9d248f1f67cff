//! Merge rules for mutable metadata on entities that already exist in
//! the store: node extras and comments.

use crate::options::{CommentMergePolicy, ConflictResolution, ExistingExtras, ExtrasMergePolicy, IncomingExtras};
use chrono::{DateTime, Utc};
use provgraph_model::{node_type_is_code, HIDDEN_EXTRA_KEY, RESERVED_EXTRA_PREFIX};
use provgraph_types::EntityUuid;
use serde_json::{Map, Value};

/// The result of merging extras: the map to store and the keys whose
/// conflicts were deferred for manual resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtrasMergeOutcome {
    pub merged: Map<String, Value>,
    pub deferred: Vec<String>,
}

/// Strips extras keys an import must never write: everything under the
/// reserved prefix, plus the `hidden` key on code nodes (local
/// visibility state).
#[must_use]
pub fn sanitize_extras(extras: &Map<String, Value>, node_type: &str) -> Map<String, Value> {
    let is_code = node_type_is_code(node_type);
    extras
        .iter()
        .filter(|(key, _)| !key.starts_with(RESERVED_EXTRA_PREFIX))
        .filter(|(key, _)| !(is_code && key.as_str() == HIDDEN_EXTRA_KEY))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// Computes the extras map resulting from merging `incoming` (already
/// sanitized) into `current` under `policy`.
#[must_use]
pub fn merge_extras(
    current: &Map<String, Value>,
    incoming: &Map<String, Value>,
    policy: ExtrasMergePolicy,
) -> ExtrasMergeOutcome {
    let mut merged = Map::new();
    let mut deferred = Vec::new();

    for (key, current_value) in current {
        match incoming.get(key) {
            None => {
                if policy.existing == ExistingExtras::Keep {
                    merged.insert(key.clone(), current_value.clone());
                }
            }
            Some(incoming_value) if incoming_value == current_value => {
                merged.insert(key.clone(), current_value.clone());
            }
            Some(incoming_value) => match policy.conflict {
                ConflictResolution::KeepExisting => {
                    merged.insert(key.clone(), current_value.clone());
                }
                ConflictResolution::TakeIncoming => {
                    merged.insert(key.clone(), incoming_value.clone());
                }
                ConflictResolution::Delete => {}
                ConflictResolution::Defer => {
                    merged.insert(key.clone(), current_value.clone());
                    deferred.push(key.clone());
                }
            },
        }
    }

    if policy.incoming == IncomingExtras::Create {
        for (key, incoming_value) in incoming {
            if !current.contains_key(key) {
                merged.insert(key.clone(), incoming_value.clone());
            }
        }
    }

    ExtrasMergeOutcome { merged, deferred }
}

/// What to do with an archived comment whose UUID already exists in the
/// store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommentDecision {
    /// The stored comment stands; the archived one is dropped.
    LeaveExisting,
    /// Replace the stored comment's content and modification time.
    OverwriteExisting,
    /// The two must coexist: create the archived comment under this
    /// freshly generated UUID instead of merging.
    CreateRekeyed(EntityUuid),
}

/// Decides the fate of an archived comment against its stored twin.
#[must_use]
pub fn merge_comment(
    existing_mtime: DateTime<Utc>,
    existing_content: &str,
    incoming_mtime: DateTime<Utc>,
    incoming_content: &str,
    policy: CommentMergePolicy,
) -> CommentDecision {
    match policy {
        CommentMergePolicy::Overwrite => {
            if incoming_mtime == existing_mtime && incoming_content == existing_content {
                CommentDecision::LeaveExisting
            } else {
                CommentDecision::OverwriteExisting
            }
        }
        CommentMergePolicy::KeepNewest => {
            if incoming_mtime <= existing_mtime || incoming_content == existing_content {
                CommentDecision::LeaveExisting
            } else {
                CommentDecision::CreateRekeyed(EntityUuid::new())
            }
        }
    }
}
