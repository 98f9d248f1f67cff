use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The `metadata.json` side of an archive: format version plus the
/// schema the records were exported under.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveMetadata {
    /// Exact-match format version.
    pub format_version: String,
    /// Entity kind name → the field holding its natural unique key.
    pub unique_identifiers: BTreeMap<String, String>,
    /// Entity kind name → field name → dependency declaration.
    pub field_info: BTreeMap<String, BTreeMap<String, FieldInfo>>,
}

/// Per-field schema info. A field with `requires` set is a foreign key
/// carrying the archive id of a record of that kind.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FieldInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requires: Option<String>,
}
