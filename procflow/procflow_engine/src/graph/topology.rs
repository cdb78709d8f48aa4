//! The edge-creation gate.
//!
//! A connection is stored only if it keeps PROCESS and DECISION elements
//! alternating:
//!
//! - PROCESS may only lead to DECISION or DECISION2
//! - DECISION and DECISION2 may only lead to PROCESS
//! - a decision following a process that carries an approve/reject
//!   transition may only leave through the approve or reject label
//!
//! START and END are not restricted as sources.

use procflow_core::error::{EntityKind, Error, Result};
use procflow_core::id::{ConnectionId, ElementId, SchemaId};
use tracing::debug;

use crate::graph::{APPROVED_LABEL, REJECTED_LABEL};
use crate::model::{Connection, ConnectionDraft, ConnectionPatch, Element, ElementType};
use crate::store::GraphTables;

impl GraphTables {
    /// Create a connection after checking it against the edge rules.
    pub fn create_connection(
        &mut self,
        schema_id: &SchemaId,
        draft: ConnectionDraft,
    ) -> Result<Connection> {
        self.schema(schema_id)?;
        let (source, target) = self.endpoints(schema_id, &draft)?;
        check_edge(self, source, target, draft.label.as_deref())?;

        let mut connection = Connection::sequence(*schema_id, draft.source_id, draft.target_id);
        if let Some(kind) = draft.connection_type {
            connection.connection_type = kind;
        }
        connection.label = draft.label;
        connection.condition = draft.condition;
        connection.points = draft.points;

        debug!(
            connection = %connection.id,
            source = %connection.source_id,
            target = %connection.target_id,
            "connection created"
        );
        self.connections.insert(connection.id, connection.clone());
        Ok(connection)
    }

    /// Patch presentation fields of a connection.
    ///
    /// The edge rules are not re-checked here; only creation is gated.
    pub fn update_connection(
        &mut self,
        id: &ConnectionId,
        patch: ConnectionPatch,
    ) -> Result<Connection> {
        let connection = self
            .connections
            .get_mut(id)
            .ok_or_else(|| Error::not_found(EntityKind::Connection, id))?;

        if let Some(label) = patch.label {
            connection.label = label;
        }
        if let Some(condition) = patch.condition {
            connection.condition = condition;
        }
        if let Some(kind) = patch.connection_type {
            connection.connection_type = kind;
        }
        if let Some(points) = patch.points {
            connection.points = points;
        }
        Ok(connection.clone())
    }

    pub fn delete_connection(&mut self, id: &ConnectionId) -> Result<Connection> {
        self.connections
            .remove(id)
            .ok_or_else(|| Error::not_found(EntityKind::Connection, id))
    }

    pub fn list_connections(&self, schema_id: &SchemaId) -> Result<Vec<Connection>> {
        self.schema(schema_id)?;
        Ok(self.connections_of(schema_id).into_iter().cloned().collect())
    }

    fn endpoints(
        &self,
        schema_id: &SchemaId,
        draft: &ConnectionDraft,
    ) -> Result<(&Element, &Element)> {
        Ok((
            self.element_of_schema(schema_id, &draft.source_id)?,
            self.element_of_schema(schema_id, &draft.target_id)?,
        ))
    }

    fn element_of_schema(&self, schema_id: &SchemaId, id: &ElementId) -> Result<&Element> {
        match self.elements.get(id) {
            Some(element) if &element.schema_id == schema_id => Ok(element),
            _ => Err(Error::not_found(EntityKind::Element, id)),
        }
    }

    /// Whether a decision's outgoing edges are restricted to the
    /// approve/reject labels.
    pub fn decision_is_strict(&self, decision: &Element) -> bool {
        self.incoming(&decision.id).any(|c| {
            self.elements
                .get(&c.source_id)
                .is_some_and(|p| p.element_type == ElementType::Process)
                && self.has_approval_transition(&c.source_id)
        })
    }
}

/// Check a prospective edge between two elements.
pub fn check_edge(
    tables: &GraphTables,
    source: &Element,
    target: &Element,
    label: Option<&str>,
) -> Result<()> {
    match source.element_type {
        ElementType::Process if !target.element_type.is_decision() => {
            if tables.has_approval_transition(&source.id) {
                Err(Error::InvalidTopology(format!(
                    "Process '{}' has an approve/reject transition and must be followed by a Decision block, not {}",
                    source.name, target.element_type
                )))
            } else {
                Err(Error::InvalidTopology(format!(
                    "Process '{}' can only connect to a Decision block, not {}",
                    source.name, target.element_type
                )))
            }
        }
        ElementType::Decision | ElementType::Decision2 => {
            if target.element_type != ElementType::Process {
                return Err(Error::InvalidTopology(format!(
                    "Decision '{}' can only connect to a Process element, not {}",
                    source.name, target.element_type
                )));
            }
            if tables.decision_is_strict(source) {
                let label = label.map(str::trim).unwrap_or_default();
                if label != APPROVED_LABEL && label != REJECTED_LABEL {
                    return Err(Error::InvalidLabel(format!(
                        "Branches of decision '{}' must be labelled '{}' or '{}', got '{}'",
                        source.name, APPROVED_LABEL, REJECTED_LABEL, label
                    )));
                }
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ElementDraft, SchemaDraft, TransitionDraft};

    struct Fixture {
        tables: GraphTables,
        schema: SchemaId,
    }

    impl Fixture {
        fn new() -> Self {
            let mut tables = GraphTables::new();
            let schema = tables.create_schema(SchemaDraft::named("Gate")).unwrap().id;
            Self { tables, schema }
        }

        fn add(&mut self, kind: ElementType, name: &str) -> ElementId {
            self.tables
                .create_element(&self.schema, ElementDraft::new(kind, name))
                .unwrap()
                .id
        }

        fn connect(&mut self, from: ElementId, to: ElementId, label: Option<&str>) -> Result<Connection> {
            let mut draft = ConnectionDraft::new(from, to);
            draft.label = label.map(str::to_string);
            self.tables.create_connection(&self.schema, draft)
        }
    }

    #[test]
    fn test_process_must_lead_to_decision() {
        let mut f = Fixture::new();
        let p = f.add(ElementType::Process, "P");
        let p2 = f.add(ElementType::Process, "P2");
        let end = f.add(ElementType::End, "End");
        let d2 = f.add(ElementType::Decision2, "D2");

        assert!(matches!(f.connect(p, p2, None), Err(Error::InvalidTopology(_))));
        assert!(matches!(f.connect(p, end, None), Err(Error::InvalidTopology(_))));
        assert!(f.connect(p, d2, None).is_ok());
    }

    #[test]
    fn test_decision_must_lead_to_process() {
        let mut f = Fixture::new();
        let d = f.add(ElementType::Decision, "D");
        let end = f.add(ElementType::End, "End");
        let d2 = f.add(ElementType::Decision, "D2");
        let p = f.add(ElementType::Process, "P");

        assert!(matches!(f.connect(d, end, None), Err(Error::InvalidTopology(_))));
        assert!(matches!(f.connect(d, d2, None), Err(Error::InvalidTopology(_))));
        assert!(f.connect(d, p, Some("anything")).is_ok());
    }

    #[test]
    fn test_approval_message_is_sharper() {
        let mut f = Fixture::new();
        let p = f.add(ElementType::Process, "Review");
        let end = f.add(ElementType::End, "End");
        f.tables
            .create_transition(
                &p,
                TransitionDraft::new("Decide", "approved_or_rejected", "approve_or_reject"),
            )
            .unwrap();

        match f.connect(p, end, None) {
            Err(Error::InvalidTopology(msg)) => assert!(msg.contains("approve/reject")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_strict_labels_after_approval_process() {
        let mut f = Fixture::new();
        let p = f.add(ElementType::Process, "Review");
        let d = f.add(ElementType::Decision, "Decide");
        let yes = f.add(ElementType::Process, "Do");
        let no = f.add(ElementType::Process, "Redo");
        f.tables
            .create_transition(&p, TransitionDraft::new("Decide", "approved", "next"))
            .unwrap();
        f.connect(p, d, None).unwrap();

        assert!(matches!(
            f.connect(d, yes, Some("Maybe")),
            Err(Error::InvalidLabel(_))
        ));
        assert!(matches!(f.connect(d, yes, None), Err(Error::InvalidLabel(_))));
        assert!(f.connect(d, yes, Some(" Согласовано ")).is_ok());
        assert!(f.connect(d, no, Some("Отклонено")).is_ok());
    }

    #[test]
    fn test_endpoints_must_exist_in_schema() {
        let mut f = Fixture::new();
        let start = f.add(ElementType::Start, "Start");
        assert!(f.connect(start, ElementId::new(), None).unwrap_err().is_not_found());

        let other = f.tables.create_schema(SchemaDraft::named("Other")).unwrap().id;
        let foreign = f
            .tables
            .create_element(&other, ElementDraft::new(ElementType::End, "End"))
            .unwrap()
            .id;
        assert!(f.connect(start, foreign, None).unwrap_err().is_not_found());
        assert!(f.tables.connections_of(&f.schema).is_empty());
    }

    #[test]
    fn test_update_is_not_regated() {
        let mut f = Fixture::new();
        let p = f.add(ElementType::Process, "Review");
        let d = f.add(ElementType::Decision, "Decide");
        let next = f.add(ElementType::Process, "Next");
        f.tables
            .create_transition(&p, TransitionDraft::new("Decide", "rejected", "next"))
            .unwrap();
        f.connect(p, d, None).unwrap();
        let edge = f.connect(d, next, Some("Согласовано")).unwrap();

        let updated = f
            .tables
            .update_connection(
                &edge.id,
                ConnectionPatch {
                    label: Some(Some("whatever".into())),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.label.as_deref(), Some("whatever"));
    }
}
