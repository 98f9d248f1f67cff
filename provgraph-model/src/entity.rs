use chrono::{DateTime, Utc};
use provgraph_types::{EntityUuid, StoreId};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Extras keys starting with this prefix belong to the local store and
/// are never imported from an archive.
pub const RESERVED_EXTRA_PREFIX: &str = "_provgraph_";

/// The one extras key outside the reserved prefix that is still dropped
/// on import, for code nodes only: it records local visibility state.
pub const HIDDEN_EXTRA_KEY: &str = "hidden";

/// Node type suffix marking an executable definition ("code node").
pub const CODE_TYPE_SUFFIX: &str = "code.Code.";

/// Group type tag for groups synthesized by an import.
pub const IMPORT_GROUP_TYPE: &str = "auto.import";

/// A person who owns nodes, groups, and comments.
///
/// Identified across stores by email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub institution: String,
}

/// A compute resource that calculation nodes ran on.
///
/// Carries a UUID but is deduplicated store-wide by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Computer {
    pub uuid: EntityUuid,
    pub name: String,
    pub hostname: String,
    pub description: String,
    pub scheduler_type: String,
    pub transport_type: String,
    pub metadata: Value,
}

/// A vertex of the provenance graph: a datum, a calculation, or a
/// workflow, with immutable attributes and mutable extras.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub uuid: EntityUuid,
    /// Dotted type tag, e.g. `data.core.Int.` or
    /// `process.calculation.calcjob.CalcJobNode.`.
    pub node_type: String,
    pub process_type: Option<String>,
    pub label: String,
    pub description: String,
    pub ctime: DateTime<Utc>,
    pub mtime: DateTime<Utc>,
    pub user_id: StoreId,
    pub computer_id: Option<StoreId>,
    /// Immutable content captured at creation.
    pub attributes: Map<String, Value>,
    /// Mutable user/system metadata, merged on re-import.
    pub extras: Map<String, Value>,
}

impl Node {
    /// Whether this node is an executable definition (code node).
    #[must_use]
    pub fn is_code(&self) -> bool {
        node_type_is_code(&self.node_type)
    }
}

/// Whether a dotted node type tag names a code node.
#[must_use]
pub fn node_type_is_code(node_type: &str) -> bool {
    node_type.ends_with(CODE_TYPE_SUFFIX)
}

/// A named, unordered collection of nodes with a store-wide-unique label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub uuid: EntityUuid,
    pub label: String,
    pub group_type: String,
    pub description: String,
    pub time: DateTime<Utc>,
    pub user_id: StoreId,
}

/// A log record attached to a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Log {
    pub uuid: EntityUuid,
    pub time: DateTime<Utc>,
    pub logger_name: String,
    pub level_name: String,
    pub node_id: StoreId,
    pub message: String,
    pub metadata: Value,
}

/// A user comment attached to a node, merged by modification time on
/// re-import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub uuid: EntityUuid,
    pub ctime: DateTime<Utc>,
    pub mtime: DateTime<Utc>,
    pub node_id: StoreId,
    pub user_id: StoreId,
    pub content: String,
}
