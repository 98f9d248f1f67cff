//! Shared fixtures: an on-disk archive builder and store/repository
//! setup.

#![allow(dead_code)]

use provgraph_archive::Archive;
use provgraph_repository::{shard_path, Repository};
use provgraph_store::ProvStore;
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use tempfile::TempDir;

pub const T0: &str = "2024-05-01T12:00:00+00:00";
pub const T1: &str = "2024-05-02T12:00:00+00:00";

/// Builds an extracted archive directory for tests.
pub struct ArchiveBuilder {
    version: String,
    export_data: BTreeMap<&'static str, BTreeMap<String, Value>>,
    node_attributes: BTreeMap<String, Value>,
    node_extras: BTreeMap<String, Value>,
    links: Vec<Value>,
    group_members: BTreeMap<String, Vec<String>>,
    field_info: Option<Value>,
    missing_payloads: HashSet<String>,
}

impl ArchiveBuilder {
    pub fn new() -> Self {
        Self {
            version: "1.0".to_string(),
            export_data: BTreeMap::new(),
            node_attributes: BTreeMap::new(),
            node_extras: BTreeMap::new(),
            links: Vec::new(),
            group_members: BTreeMap::new(),
            field_info: None,
            missing_payloads: HashSet::new(),
        }
    }

    pub fn version(mut self, version: &str) -> Self {
        self.version = version.to_string();
        self
    }

    /// Replaces the default schema metadata entirely.
    pub fn field_info(mut self, field_info: Value) -> Self {
        self.field_info = Some(field_info);
        self
    }

    pub fn user(mut self, id: i64, email: &str) -> Self {
        self.export_data.entry("User").or_default().insert(
            id.to_string(),
            json!({
                "email": email,
                "first_name": "Ada",
                "last_name": "Lovelace",
                "institution": "Analytical Engines Ltd",
            }),
        );
        self
    }

    pub fn computer(mut self, id: i64, uuid: &str, name: &str) -> Self {
        self.export_data.entry("Computer").or_default().insert(
            id.to_string(),
            json!({
                "uuid": uuid,
                "name": name,
                "hostname": format!("{name}.example.org"),
                "description": "",
                "scheduler_type": "slurm",
                "transport_type": "ssh",
                "metadata": {"cores_per_node": 16},
            }),
        );
        self
    }

    /// Adds a node with empty attributes and extras (override with
    /// [`Self::attributes`] / [`Self::extras`]).
    pub fn node(self, id: i64, uuid: &str, node_type: &str, user: i64) -> Self {
        self.node_on(id, uuid, node_type, user, None)
    }

    pub fn node_on(
        mut self,
        id: i64,
        uuid: &str,
        node_type: &str,
        user: i64,
        computer: Option<i64>,
    ) -> Self {
        self.export_data.entry("Node").or_default().insert(
            id.to_string(),
            json!({
                "uuid": uuid,
                "node_type": node_type,
                "process_type": null,
                "label": "",
                "description": "",
                "ctime": T0,
                "mtime": T0,
                "user": user,
                "computer": computer,
            }),
        );
        self.node_attributes.insert(id.to_string(), json!({}));
        self.node_extras.insert(id.to_string(), json!({}));
        self
    }

    pub fn attributes(mut self, node_id: i64, attributes: Value) -> Self {
        self.node_attributes.insert(node_id.to_string(), attributes);
        self
    }

    pub fn extras(mut self, node_id: i64, extras: Value) -> Self {
        self.node_extras.insert(node_id.to_string(), extras);
        self
    }

    pub fn drop_attributes(mut self, node_id: i64) -> Self {
        self.node_attributes.remove(&node_id.to_string());
        self
    }

    pub fn group(mut self, id: i64, uuid: &str, label: &str, user: i64) -> Self {
        self.export_data.entry("Group").or_default().insert(
            id.to_string(),
            json!({
                "uuid": uuid,
                "label": label,
                "group_type": "core",
                "description": "",
                "time": T0,
                "user": user,
            }),
        );
        self
    }

    pub fn log(mut self, id: i64, uuid: &str, node: i64) -> Self {
        self.export_data.entry("Log").or_default().insert(
            id.to_string(),
            json!({
                "uuid": uuid,
                "time": T0,
                "logger_name": "scheduler",
                "level_name": "INFO",
                "node": node,
                "message": "job finished",
                "metadata": {},
            }),
        );
        self
    }

    pub fn comment(
        mut self,
        id: i64,
        uuid: &str,
        node: i64,
        user: i64,
        mtime: &str,
        content: &str,
    ) -> Self {
        self.export_data.entry("Comment").or_default().insert(
            id.to_string(),
            json!({
                "uuid": uuid,
                "ctime": T0,
                "mtime": mtime,
                "node": node,
                "user": user,
                "content": content,
            }),
        );
        self
    }

    pub fn link(mut self, source: &str, target: &str, link_type: &str, label: &str) -> Self {
        self.links.push(json!({
            "source": source,
            "target": target,
            "type": link_type,
            "label": label,
        }));
        self
    }

    pub fn member(mut self, group_uuid: &str, node_uuid: &str) -> Self {
        self.group_members
            .entry(group_uuid.to_string())
            .or_default()
            .push(node_uuid.to_string());
        self
    }

    /// Omits the payload directory of one node, corrupting the archive.
    pub fn missing_payload(mut self, node_uuid: &str) -> Self {
        self.missing_payloads.insert(node_uuid.to_string());
        self
    }

    /// Writes the archive to a temp directory and returns it.
    pub fn write(self) -> TempDir {
        let dir = tempfile::tempdir().unwrap();

        let field_info = self.field_info.unwrap_or_else(default_field_info);
        let metadata = json!({
            "format_version": self.version,
            "unique_identifiers": {
                "User": "email",
                "Computer": "uuid",
                "Node": "uuid",
                "Group": "uuid",
                "Log": "uuid",
                "Comment": "uuid",
            },
            "field_info": field_info,
        });
        fs::write(dir.path().join("metadata.json"), metadata.to_string()).unwrap();

        let data = json!({
            "export_data": self.export_data,
            "node_attributes": self.node_attributes,
            "node_extras": self.node_extras,
            "links": self.links,
            "group_members": self.group_members,
        });
        fs::write(dir.path().join("data.json"), data.to_string()).unwrap();

        if let Some(nodes) = self.export_data.get("Node") {
            for row in nodes.values() {
                let uuid = row["uuid"].as_str().unwrap();
                if self.missing_payloads.contains(uuid) {
                    continue;
                }
                let parsed = provgraph_types::EntityUuid::parse(uuid).unwrap();
                let payload = dir.path().join("payloads").join(shard_path(&parsed));
                fs::create_dir_all(&payload).unwrap();
                fs::write(payload.join("content.txt"), uuid.as_bytes()).unwrap();
            }
        }

        dir
    }
}

pub fn default_field_info() -> Value {
    json!({
        "User": {"email": {}},
        "Computer": {"uuid": {}},
        "Node": {
            "uuid": {},
            "user": {"requires": "User"},
            "computer": {"requires": "Computer"},
        },
        "Group": {"uuid": {}, "user": {"requires": "User"}},
        "Log": {"uuid": {}, "node": {"requires": "Node"}},
        "Comment": {
            "uuid": {},
            "node": {"requires": "Node"},
            "user": {"requires": "User"},
        },
    })
}

/// An in-memory store plus an on-disk repository.
pub struct Fixture {
    pub store: ProvStore,
    pub repository: Repository,
    pub repo_dir: TempDir,
}

pub fn fixture() -> Fixture {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
    let repo_dir = tempfile::tempdir().unwrap();
    Fixture {
        store: ProvStore::open_in_memory().unwrap(),
        repository: Repository::open(repo_dir.path()).unwrap(),
        repo_dir,
    }
}

pub fn open_archive(dir: &TempDir) -> Archive {
    Archive::open(dir.path()).unwrap()
}

/// A two-node archive (one data node feeding one calculation) that most
/// end-to-end tests start from.
pub const DATA_UUID: &str = "11111111-1111-4111-8111-111111111111";
pub const CALC_UUID: &str = "22222222-2222-4222-8222-222222222222";
pub const GROUP_UUID: &str = "33333333-3333-4333-8333-333333333333";
pub const COMPUTER_UUID: &str = "44444444-4444-4444-8444-444444444444";
pub const COMMENT_UUID: &str = "55555555-5555-4555-8555-555555555555";
pub const LOG_UUID: &str = "66666666-6666-4666-8666-666666666666";

pub fn basic_archive() -> ArchiveBuilder {
    ArchiveBuilder::new()
        .user(1, "ada@example.com")
        .computer(1, COMPUTER_UUID, "lumi")
        .node(1, DATA_UUID, "data.core.Int.", 1)
        .node_on(2, CALC_UUID, "process.calculation.calcjob.CalcJobNode.", 1, Some(1))
        .attributes(1, json!({"value": 41}))
        .link(DATA_UUID, CALC_UUID, "input_calc", "x")
}

/// Extras maps in tests are plain JSON objects.
pub fn as_map(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected JSON object, got {other}"),
    }
}
