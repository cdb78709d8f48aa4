//! Saving a populated store and loading it back.

use procflow_core::id::UserId;
use procflow_core::utils::LayoutConfig;
use procflow_core::AccessGuard;
use procflow_engine::inherit::list_children;
use procflow_engine::model::{ElementDraft, ElementType, PrintFormDraft, SchemaDraft};
use procflow_engine::{FileSnapshot, InMemoryGraphStore, ProcessService};
use tempfile::TempDir;

#[test]
fn test_store_survives_restart() {
    let dir = TempDir::new().unwrap();
    let snapshot = FileSnapshot::new(dir.path().join("state").join("procflow.json"));

    let service = ProcessService::new(
        InMemoryGraphStore::new(),
        AccessGuard::single_admin(UserId::new()),
        LayoutConfig::default(),
    );
    let schema = service.create_schema(SchemaDraft::named("Leave")).unwrap();
    let parent = service
        .create_element(&schema.id, ElementDraft::new(ElementType::Process, "Review"))
        .unwrap();
    service
        .add_print_form(&parent.id, PrintFormDraft::named("Order"))
        .unwrap();
    let child = service.inherit_element(&parent.id).unwrap();

    let before = service.store().snapshot();
    snapshot.save(&before).unwrap();
    assert!(snapshot.exists());

    let loaded = snapshot.load().unwrap();
    assert_eq!(loaded.list_schemas(), before.list_schemas());
    assert_eq!(
        loaded.list_elements(&schema.id).unwrap(),
        before.list_elements(&schema.id).unwrap()
    );

    // the parent index is rebuilt on load
    let children = list_children(&loaded, &parent.id).unwrap();
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].id, child.id);

    let restored = InMemoryGraphStore::from_tables(loaded);
    let service = ProcessService::new(
        restored,
        AccessGuard::single_admin(UserId::new()),
        LayoutConfig::default(),
    );
    let forms = service.list_print_forms(&child.id).unwrap();
    assert_eq!(forms.len(), 1);
    assert!(forms[0].meta.is_inherited_from(&parent.id));
}

#[test]
fn test_missing_snapshot_starts_empty() {
    let dir = TempDir::new().unwrap();
    let snapshot = FileSnapshot::new(dir.path().join("absent.json"));
    assert!(snapshot.load().is_err());
    assert!(snapshot.load_or_default().unwrap().list_schemas().is_empty());
}
