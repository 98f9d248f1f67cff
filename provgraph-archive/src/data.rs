use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// The `data.json` side of an archive: every exported record, keyed the
/// way the exporting store keyed them.
///
/// Archive ids (the object keys) are store-local ids of the *exporting*
/// store, serialized as strings; they carry no meaning here beyond
/// joining the sections together.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveData {
    /// Entity kind name → archive id → field map.
    pub export_data: BTreeMap<String, BTreeMap<String, Map<String, Value>>>,
    /// Node archive id → immutable attributes.
    pub node_attributes: BTreeMap<String, Map<String, Value>>,
    /// Node archive id → mutable extras.
    pub node_extras: BTreeMap<String, Map<String, Value>>,
    /// Directed typed links between nodes, by UUID.
    pub links: Vec<LinkRecord>,
    /// Group UUID → member node UUIDs.
    pub group_members: BTreeMap<String, Vec<String>>,
}

/// One archived link: endpoints by UUID, type and label as written by
/// the exporter (validated at import time, not here).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRecord {
    pub source: String,
    pub target: String,
    #[serde(rename = "type")]
    pub link_type: String,
    pub label: String,
}
