use chrono::{TimeZone, Utc};
use provgraph_model::{Comment, Computer, EntityKind, Group, LinkType, Node, User};
use provgraph_store::ProvStore;
use provgraph_types::{EntityUuid, StoreId};
use serde_json::{json, Map, Value};

fn sample_user(email: &str) -> User {
    User {
        email: email.to_string(),
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
        institution: "Analytical Engines Ltd".to_string(),
    }
}

fn sample_computer(name: &str) -> Computer {
    Computer {
        uuid: EntityUuid::new(),
        name: name.to_string(),
        hostname: "cluster.local".to_string(),
        description: String::new(),
        scheduler_type: "slurm".to_string(),
        transport_type: "ssh".to_string(),
        metadata: json!({"cores_per_node": 32}),
    }
}

fn sample_node(user_id: StoreId, node_type: &str) -> Node {
    Node {
        uuid: EntityUuid::new(),
        node_type: node_type.to_string(),
        process_type: None,
        label: String::new(),
        description: String::new(),
        ctime: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        mtime: Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap(),
        user_id,
        computer_id: None,
        attributes: Map::new(),
        extras: Map::new(),
    }
}

// ── Open & schema ───────────────────────────────────────────────

#[test]
fn open_on_disk_creates_schema() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = ProvStore::open(&dir.path().join("graph.db")).unwrap();
    let tx = store.transaction().unwrap();
    assert_eq!(tx.entity_count(EntityKind::User).unwrap(), 0);
    assert_eq!(tx.link_count().unwrap(), 0);
}

// ── Inserts & bulk lookup ───────────────────────────────────────

#[test]
fn ids_by_natural_key_returns_only_present_keys() {
    let mut store = ProvStore::open_in_memory().unwrap();
    let tx = store.transaction().unwrap();
    tx.insert_user(&sample_user("ada@example.com")).unwrap();
    tx.insert_user(&sample_user("grace@example.com")).unwrap();

    let keys = vec![
        "ada@example.com".to_string(),
        "nobody@example.com".to_string(),
        "grace@example.com".to_string(),
    ];
    let mut found = tx.ids_by_natural_key(EntityKind::User, &keys).unwrap();
    found.sort();
    assert_eq!(found.len(), 2);
    assert_eq!(found[0].0, "ada@example.com");
    assert_eq!(found[1].0, "grace@example.com");
}

#[test]
fn ids_by_natural_key_handles_large_sets() {
    let mut store = ProvStore::open_in_memory().unwrap();
    let tx = store.transaction().unwrap();
    let mut keys = Vec::new();
    for i in 0..1200 {
        let email = format!("user{i}@example.com");
        tx.insert_user(&sample_user(&email)).unwrap();
        keys.push(email);
    }
    let found = tx.ids_by_natural_key(EntityKind::User, &keys).unwrap();
    assert_eq!(found.len(), 1200);
}

#[test]
fn inserts_are_queryable_before_commit() {
    let mut store = ProvStore::open_in_memory().unwrap();
    let tx = store.transaction().unwrap();
    let user_id = tx.insert_user(&sample_user("ada@example.com")).unwrap();
    let node = sample_node(user_id, "data.core.Int.");
    let node_id = tx.insert_node(&node).unwrap();

    let found = tx
        .ids_by_natural_key(EntityKind::Node, &[node.uuid.canonical()])
        .unwrap();
    assert_eq!(found, vec![(node.uuid.canonical(), node_id)]);
}

// ── Transaction semantics ───────────────────────────────────────

#[test]
fn drop_without_commit_rolls_back() {
    let mut store = ProvStore::open_in_memory().unwrap();
    {
        let tx = store.transaction().unwrap();
        tx.insert_user(&sample_user("ada@example.com")).unwrap();
        // dropped here
    }
    let tx = store.transaction().unwrap();
    assert_eq!(tx.entity_count(EntityKind::User).unwrap(), 0);
}

#[test]
fn commit_persists_across_transactions() {
    let mut store = ProvStore::open_in_memory().unwrap();
    {
        let tx = store.transaction().unwrap();
        tx.insert_user(&sample_user("ada@example.com")).unwrap();
        tx.commit().unwrap();
    }
    let tx = store.transaction().unwrap();
    assert_eq!(tx.entity_count(EntityKind::User).unwrap(), 1);
}

// ── Uniqueness probes ───────────────────────────────────────────

#[test]
fn computer_name_probe() {
    let mut store = ProvStore::open_in_memory().unwrap();
    let tx = store.transaction().unwrap();
    tx.insert_computer(&sample_computer("lumi")).unwrap();
    assert!(tx.computer_name_exists("lumi").unwrap());
    assert!(!tx.computer_name_exists("fugaku").unwrap());
}

#[test]
fn group_label_probe() {
    let mut store = ProvStore::open_in_memory().unwrap();
    let tx = store.transaction().unwrap();
    let user_id = tx.insert_user(&sample_user("ada@example.com")).unwrap();
    tx.insert_group(&Group {
        uuid: EntityUuid::new(),
        label: "batch".to_string(),
        group_type: "core".to_string(),
        description: String::new(),
        time: Utc::now(),
        user_id,
    })
    .unwrap();
    assert!(tx.group_label_exists("batch").unwrap());
    assert!(!tx.group_label_exists("batch_1").unwrap());
}

// ── Extras ──────────────────────────────────────────────────────

#[test]
fn extras_roundtrip_and_update() {
    let mut store = ProvStore::open_in_memory().unwrap();
    let tx = store.transaction().unwrap();
    let user_id = tx.insert_user(&sample_user("ada@example.com")).unwrap();
    let mut node = sample_node(user_id, "data.core.Int.");
    node.extras.insert("tag".to_string(), json!("v1"));
    let node_id = tx.insert_node(&node).unwrap();

    assert_eq!(tx.node_extras(node_id).unwrap(), node.extras);

    let mut updated = node.extras.clone();
    updated.insert("tag".to_string(), json!("v2"));
    tx.update_node_extras(node_id, &updated).unwrap();
    assert_eq!(tx.node_extras(node_id).unwrap()["tag"], json!("v2"));
}

#[test]
fn extras_of_missing_node_is_not_found() {
    let mut store = ProvStore::open_in_memory().unwrap();
    let tx = store.transaction().unwrap();
    assert!(tx.node_extras(StoreId::new(999)).is_err());
}

// ── Comments ────────────────────────────────────────────────────

#[test]
fn comment_lookup_and_overwrite() {
    let mut store = ProvStore::open_in_memory().unwrap();
    let tx = store.transaction().unwrap();
    let user_id = tx.insert_user(&sample_user("ada@example.com")).unwrap();
    let node_id = tx.insert_node(&sample_node(user_id, "data.core.Int.")).unwrap();

    let uuid = EntityUuid::new();
    let t0 = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
    let comment_id = tx
        .insert_comment(&Comment {
            uuid,
            ctime: t0,
            mtime: t0,
            node_id,
            user_id,
            content: "first".to_string(),
        })
        .unwrap();

    let (found_id, mtime, content) = tx.comment_by_uuid(&uuid.canonical()).unwrap().unwrap();
    assert_eq!(found_id, comment_id);
    assert_eq!(mtime, t0);
    assert_eq!(content, "first");

    let t1 = Utc.with_ymd_and_hms(2024, 5, 2, 9, 0, 0).unwrap();
    tx.update_comment(comment_id, "second", t1).unwrap();
    let (_, mtime, content) = tx.comment_by_uuid(&uuid.canonical()).unwrap().unwrap();
    assert_eq!((mtime, content.as_str()), (t1, "second"));

    assert!(tx
        .comment_by_uuid(&EntityUuid::new().canonical())
        .unwrap()
        .is_none());
}

// ── Links ───────────────────────────────────────────────────────

#[test]
fn link_quadruple_roundtrip() {
    let mut store = ProvStore::open_in_memory().unwrap();
    let tx = store.transaction().unwrap();
    let user_id = tx.insert_user(&sample_user("ada@example.com")).unwrap();
    let data = tx.insert_node(&sample_node(user_id, "data.core.Int.")).unwrap();
    let calc = tx
        .insert_node(&sample_node(user_id, "process.calculation.calcjob.CalcJobNode."))
        .unwrap();

    assert!(!tx.link_exists(data, calc, LinkType::InputCalc, "x").unwrap());
    tx.insert_link(data, calc, LinkType::InputCalc, "x").unwrap();
    assert!(tx.link_exists(data, calc, LinkType::InputCalc, "x").unwrap());
    // Different label or type is a different quadruple
    assert!(!tx.link_exists(data, calc, LinkType::InputCalc, "y").unwrap());
    assert_eq!(
        tx.link_types_for_labeled_pair(data, calc, "x").unwrap(),
        vec!["input_calc".to_string()]
    );
    assert_eq!(tx.link_count().unwrap(), 1);
}

// ── Groups ──────────────────────────────────────────────────────

#[test]
fn group_membership_is_idempotent() {
    let mut store = ProvStore::open_in_memory().unwrap();
    let tx = store.transaction().unwrap();
    let user_id = tx.insert_user(&sample_user("ada@example.com")).unwrap();
    let n1 = tx.insert_node(&sample_node(user_id, "data.core.Int.")).unwrap();
    let n2 = tx.insert_node(&sample_node(user_id, "data.core.Int.")).unwrap();

    let group = Group {
        uuid: EntityUuid::new(),
        label: "results".to_string(),
        group_type: "core".to_string(),
        description: String::new(),
        time: Utc::now(),
        user_id,
    };
    let gid = tx.insert_group(&group).unwrap();
    assert_eq!(tx.group_id_by_uuid(&group.uuid.canonical()).unwrap(), Some(gid));
    assert_eq!(tx.group_id_by_label("results").unwrap(), Some(gid));

    tx.add_nodes_to_group(gid, &[n1, n2]).unwrap();
    tx.add_nodes_to_group(gid, &[n1]).unwrap();
    assert_eq!(tx.nodes_in_group(gid).unwrap(), vec![n1, n2]);
    assert_eq!(tx.membership_count().unwrap(), 2);
}

// ── JSON columns ────────────────────────────────────────────────

#[test]
fn computer_metadata_accepts_any_json() {
    let mut store = ProvStore::open_in_memory().unwrap();
    let tx = store.transaction().unwrap();
    let mut computer = sample_computer("lumi");
    computer.metadata = Value::Null;
    tx.insert_computer(&computer).unwrap();
    assert!(tx.computer_name_exists("lumi").unwrap());
}
