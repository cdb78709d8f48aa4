//! Integration tests for procflow_engine, driven through the service.

use std::sync::Arc;

use procflow_core::auth::{AccessGuard, AccessRoles, StaticIdentity, StaticRoles};
use procflow_core::error::Error;
use procflow_core::id::{ElementId, SchemaId, UserId};
use procflow_core::utils::LayoutConfig;
use procflow_engine::model::{
    ConnectionDraft, ElementDraft, ElementType, Requisite, RequisiteDraft, RequisitePatch,
    SchemaDraft, TransitionDraft,
};
use procflow_engine::{InMemoryGraphStore, ProcessService, APPROVED_LABEL, REJECTED_LABEL};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

// Initialize tracing for tests
fn init_tracing() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::DEBUG)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

type Service = ProcessService<InMemoryGraphStore>;

fn service_with(identity: StaticIdentity, roles: StaticRoles, reads_need_auth: bool) -> Service {
    ProcessService::new(
        InMemoryGraphStore::new(),
        AccessGuard::new(Arc::new(identity), Arc::new(roles), reads_need_auth),
        LayoutConfig::default(),
    )
}

fn admin() -> Service {
    init_tracing();
    ProcessService::new(
        InMemoryGraphStore::new(),
        AccessGuard::single_admin(UserId::new()),
        LayoutConfig::default(),
    )
}

fn add(service: &Service, schema: &SchemaId, kind: ElementType, name: &str) -> ElementId {
    service
        .create_element(schema, ElementDraft::new(kind, name))
        .unwrap()
        .id
}

/// The decision the engine placed after a process.
fn decision_after(service: &Service, schema: &SchemaId, process: &ElementId) -> ElementId {
    let elements = service.list_elements(schema).unwrap();
    service
        .list_connections(schema)
        .unwrap()
        .into_iter()
        .filter(|c| &c.source_id == process)
        .map(|c| c.target_id)
        .find(|t| {
            elements
                .iter()
                .any(|e| &e.id == t && e.element_type.is_decision())
        })
        .unwrap()
}

/// START -> END, so the schema is valid on its own.
fn skeleton(service: &Service, name: &str) -> (SchemaId, ElementId) {
    let schema = service.create_schema(SchemaDraft::named(name)).unwrap().id;
    let start = add(service, &schema, ElementType::Start, "Start");
    let end = add(service, &schema, ElementType::End, "End");
    service
        .create_connection(&schema, ConnectionDraft::new(start, end))
        .unwrap();
    (schema, start)
}

#[test]
fn test_edge_rules() {
    let service = admin();
    let schema = service.create_schema(SchemaDraft::named("Edges")).unwrap().id;
    let process = add(&service, &schema, ElementType::Process, "Review");
    let other = add(&service, &schema, ElementType::Process, "Archive");
    let end = add(&service, &schema, ElementType::End, "End");
    let decision = decision_after(&service, &schema, &process);

    for (source, target) in [(process, end), (process, other), (decision, end)] {
        let err = service
            .create_connection(&schema, ConnectionDraft::new(source, target))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidTopology(_)), "{:?}", err);
    }

    let missing = service
        .create_connection(&schema, ConnectionDraft::new(process, ElementId::new()))
        .unwrap_err();
    assert!(missing.is_not_found());

    let (elsewhere, foreign_start) = skeleton(&service, "Elsewhere");
    assert!(service.get_schema(&elsewhere).is_ok());
    let cross = service
        .create_connection(&schema, ConnectionDraft::new(foreign_start, process))
        .unwrap_err();
    assert!(cross.is_not_found());

    service
        .create_connection(&schema, ConnectionDraft::new(decision, other))
        .unwrap();
}

#[test]
fn test_strict_decision_labels() {
    let service = admin();
    let schema = service.create_schema(SchemaDraft::named("Labels")).unwrap().id;
    let process = add(&service, &schema, ElementType::Process, "Review");
    let next = add(&service, &schema, ElementType::Process, "Sign");
    service
        .create_transition(
            &process,
            TransitionDraft::new("Decide", "approved_or_rejected", "approve_or_reject"),
        )
        .unwrap();
    let decision = decision_after(&service, &schema, &process);

    let err = service
        .create_connection(&schema, ConnectionDraft::new(decision, next).labeled("Maybe"))
        .unwrap_err();
    assert!(matches!(err, Error::InvalidLabel(_)));

    let edge = service
        .create_connection(
            &schema,
            ConnectionDraft::new(decision, next).labeled(&format!("  {} ", APPROVED_LABEL)),
        )
        .unwrap();
    assert_eq!(edge.trimmed_label(), APPROVED_LABEL);
}

#[test]
fn test_branch_completeness() {
    let service = admin();
    let (schema, start) = skeleton(&service, "Branches");
    let process = add(&service, &schema, ElementType::Process, "Review");
    service
        .create_connection(&schema, ConnectionDraft::new(start, process))
        .unwrap();
    service
        .create_transition(
            &process,
            TransitionDraft::new("Decide", "approved_or_rejected", "approve_or_reject"),
        )
        .unwrap();
    let decision = decision_after(&service, &schema, &process);
    let approved = add(&service, &schema, ElementType::Process, "Sign");
    service
        .create_connection(&schema, ConnectionDraft::new(decision, approved).labeled(APPROVED_LABEL))
        .unwrap();

    let report = service.validate(&schema).unwrap();
    info!(?report, "after approve branch only");
    assert!(!report.is_valid);
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].contains(REJECTED_LABEL));

    // a second edge to the same decision does not duplicate the error
    service
        .create_connection(&schema, ConnectionDraft::new(process, decision))
        .unwrap();
    let report = service.validate(&schema).unwrap();
    assert_eq!(report.errors.len(), 1);

    let rejected = add(&service, &schema, ElementType::Process, "Rework");
    service
        .create_connection(&schema, ConnectionDraft::new(decision, rejected).labeled(REJECTED_LABEL))
        .unwrap();
    assert!(service.validate(&schema).unwrap().is_valid);
}

#[test]
fn test_end_unreachable_from_start() {
    let service = admin();
    let schema = service.create_schema(SchemaDraft::named("Dead end")).unwrap().id;
    let start = add(&service, &schema, ElementType::Start, "Start");
    add(&service, &schema, ElementType::End, "End");
    let first = add(&service, &schema, ElementType::Process, "Submit");
    service
        .create_connection(&schema, ConnectionDraft::new(start, first))
        .unwrap();
    let decision = decision_after(&service, &schema, &first);
    for name in ["Approve", "Reject"] {
        let branch = add(&service, &schema, ElementType::Process, name);
        service
            .create_connection(&schema, ConnectionDraft::new(decision, branch))
            .unwrap();
    }

    let report = service.validate(&schema).unwrap();
    assert!(!report.is_valid);
    assert_eq!(report.errors, vec!["There is no path from START to END"]);
    assert!(report
        .warnings
        .contains(&"END element 'End' is unreachable from START".to_string()));
    assert!(service.publish(&schema, false).is_err());
}

#[test]
fn test_cycles_are_tolerated() {
    let service = admin();
    let (schema, start) = skeleton(&service, "Loop");
    let process = add(&service, &schema, ElementType::Process, "Fix");
    service
        .create_connection(&schema, ConnectionDraft::new(start, process))
        .unwrap();
    let decision = decision_after(&service, &schema, &process);
    service
        .create_connection(&schema, ConnectionDraft::new(decision, process))
        .unwrap();

    let report = service.validate(&schema).unwrap();
    assert!(report.is_valid);
    assert!(report.warnings.iter().any(|w| w.contains("cyclic")));

    let outcome = service.publish(&schema, false).unwrap();
    assert!(outcome.schema.is_published);
    assert_eq!(outcome.warnings, report.warnings);
}

#[test]
fn test_publish_gating() {
    let service = admin();
    let schema = service.create_schema(SchemaDraft::named("Half")).unwrap().id;
    add(&service, &schema, ElementType::Start, "Start");

    let err = service.publish(&schema, false).unwrap_err();
    match err {
        Error::ValidationFailed(errors) => assert!(!errors.is_empty()),
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(!service.get_schema(&schema).unwrap().is_published);
}

#[test]
fn test_new_version_publishing() {
    let service = admin();
    let (v1, _) = skeleton(&service, "Leave");
    service.publish(&v1, false).unwrap();

    let v2 = service.create_new_version(&v1, Some("2026")).unwrap();
    assert_eq!(v2.version, 2);
    assert_eq!(service.list_connections(&v2.id).unwrap().len(), 1);

    service.publish(&v2.id, true).unwrap();
    let published: Vec<u32> = service
        .list_versions(&v1)
        .unwrap()
        .into_iter()
        .filter(|s| s.is_published)
        .map(|s| s.version)
        .collect();
    assert_eq!(published, vec![2]);
}

#[test]
fn test_inheritance_idempotence() {
    let service = admin();
    let schema = service.create_schema(SchemaDraft::named("Family")).unwrap().id;
    let parent = add(&service, &schema, ElementType::Process, "Parent");
    let requisite = service
        .create_requisite(&parent, RequisiteDraft::new("N", "text"))
        .unwrap();

    let child = service.inherit_element(&parent).unwrap();
    let independent = service
        .create_requisite(&child.id, RequisiteDraft::new("N", "text"))
        .unwrap();

    let patch = RequisitePatch {
        label: Some(Some("Number".into())),
        ..Default::default()
    };
    let outcome = service
        .update_requisite_cascade(&parent, &requisite.id, patch)
        .unwrap();
    assert_eq!(outcome.propagated, 1);

    let rows = service.list_owned::<Requisite>(&child.id).unwrap();
    assert_eq!(rows.len(), 2);
    for row in &rows {
        if row.id == independent.id {
            assert_eq!(row.label, None);
        } else {
            assert_eq!(row.label.as_deref(), Some("Number"));
        }
    }

    // already inherited under the same name, so nothing is added
    let again = service.inherit_requisites_from(&parent, &child.id).unwrap();
    assert!(again.is_empty());
    assert_eq!(service.list_children(&parent).unwrap().len(), 1);
}

#[test]
fn test_resolution_uniqueness() {
    let service = admin();
    let (schema, start) = skeleton(&service, "Close");
    let process = add(&service, &schema, ElementType::Process, "Close");
    service
        .create_connection(&schema, ConnectionDraft::new(start, process))
        .unwrap();
    service
        .create_transition(&process, TransitionDraft::new("Close", "filled", "resolution"))
        .unwrap();

    let second = service
        .create_transition(&process, TransitionDraft::new("Again", "approved", "resolution"))
        .unwrap_err();
    assert!(matches!(second, Error::Conflict(_)));

    let report = service.validate(&schema).unwrap();
    assert!(report.errors.iter().any(|e| e.contains("resolution")));

    service
        .create_transition(&process, TransitionDraft::new("Next", "filled", "next"))
        .unwrap();
    assert!(service.validate(&schema).unwrap().is_valid);
}

#[test]
fn test_illegal_condition_pair() {
    let service = admin();
    let schema = service.create_schema(SchemaDraft::named("Pairs")).unwrap().id;
    let process = add(&service, &schema, ElementType::Process, "Assign");
    let err = service
        .create_transition(&process, TransitionDraft::new("Bad", "assigned", "resolution"))
        .unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));

    service
        .create_transition(&process, TransitionDraft::new("Custom", "escalated", "resolution"))
        .unwrap();
}

#[test]
fn test_authorization() {
    init_tracing();
    let anonymous = service_with(StaticIdentity::anonymous(), StaticRoles::new(), false);
    assert!(matches!(
        anonymous.create_schema(SchemaDraft::named("X")).unwrap_err(),
        Error::Unauthenticated
    ));
    assert!(anonymous.list_schemas().unwrap().is_empty());

    let strict = service_with(StaticIdentity::anonymous(), StaticRoles::new(), true);
    assert!(matches!(strict.list_schemas().unwrap_err(), Error::Unauthenticated));

    let user = UserId::new();
    let plain = service_with(
        StaticIdentity::signed_in(user),
        StaticRoles::new().with(user, AccessRoles::default()),
        false,
    );
    assert!(matches!(
        plain.create_schema(SchemaDraft::named("X")).unwrap_err(),
        Error::Forbidden(_)
    ));

    let service_admin = service_with(
        StaticIdentity::signed_in(user),
        StaticRoles::new().with(
            user,
            AccessRoles {
                is_admin: false,
                is_service_admin: true,
            },
        ),
        true,
    );
    let schema = service_admin.create_schema(SchemaDraft::named("X")).unwrap();
    assert_eq!(service_admin.list_schemas().unwrap()[0].id, schema.id);
}
