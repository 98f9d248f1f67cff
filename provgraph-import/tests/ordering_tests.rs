mod common;

use common::{basic_archive, fixture, open_archive};
use provgraph_import::{
    validated_entity_order, ArchiveImporter, ImportError, ImportOptions,
};
use provgraph_model::EntityKind;
use serde_json::json;

// ── Schema validation ────────────────────────────────────────────

#[test]
fn default_schema_validates_to_canonical_order() {
    let dir = basic_archive().write();
    let archive = open_archive(&dir);
    let order = validated_entity_order(archive.metadata()).unwrap();
    assert_eq!(order, EntityKind::canonical_order().to_vec());
}

#[test]
fn unknown_entity_type_in_schema_fails() {
    let dir = basic_archive()
        .field_info(json!({"Widget": {"uuid": {}}}))
        .write();
    let archive = open_archive(&dir);
    let err = validated_entity_order(archive.metadata()).unwrap_err();
    match err {
        ImportError::UnknownEntityType(name) => assert_eq!(name, "Widget"),
        other => panic!("expected UnknownEntityType, got {other:?}"),
    }
}

#[test]
fn unknown_entity_type_in_dependency_fails() {
    let dir = basic_archive()
        .field_info(json!({
            "Node": {"uuid": {}, "user": {"requires": "Widget"}},
        }))
        .write();
    let archive = open_archive(&dir);
    let err = validated_entity_order(archive.metadata()).unwrap_err();
    match err {
        ImportError::UnknownEntityType(name) => assert_eq!(name, "Widget"),
        other => panic!("expected UnknownEntityType, got {other:?}"),
    }
}

#[test]
fn forward_dependency_fails() {
    // User is processed first; a User field cannot require Node.
    let dir = basic_archive()
        .field_info(json!({
            "User": {"email": {}, "favourite": {"requires": "Node"}},
            "Node": {"uuid": {}, "user": {"requires": "User"}},
        }))
        .write();
    let archive = open_archive(&dir);
    let err = validated_entity_order(archive.metadata()).unwrap_err();
    match err {
        ImportError::SchemaOrderViolation { entity, requires } => {
            assert_eq!(entity, "User");
            assert_eq!(requires, "Node");
        }
        other => panic!("expected SchemaOrderViolation, got {other:?}"),
    }
}

#[test]
fn dependency_cycle_fails_before_any_store_write() {
    let dir = basic_archive()
        .field_info(json!({
            "Node": {"uuid": {}, "user": {"requires": "User"},
                     "annotation": {"requires": "Comment"}},
            "Comment": {"uuid": {}, "node": {"requires": "Node"}},
            "User": {"email": {}},
        }))
        .write();
    let archive = open_archive(&dir);

    let mut fx = fixture();
    let err = ArchiveImporter::new(ImportOptions::default())
        .run(&mut fx.store, &fx.repository, &archive)
        .unwrap_err();
    assert!(matches!(err, ImportError::SchemaOrderViolation { .. }));

    // Nothing was written.
    let tx = fx.store.transaction().unwrap();
    for kind in EntityKind::canonical_order() {
        assert_eq!(tx.entity_count(kind).unwrap(), 0);
    }
}
