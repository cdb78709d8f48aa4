//! Automatic graph extension.
//!
//! Some edits imply that a decision must follow an element: creating a
//! process, adding an approval requisite, or giving an element an
//! approve-or-reject transition. The triggers here insert that decision when
//! none follows yet.
//!
//! Triggers are side effects of a primary edit. Each one runs against a
//! scratch copy of the tables and is committed only if it completes; a
//! failing trigger is logged and dropped, and the primary edit stands.

use procflow_core::error::Result;
use procflow_core::id::{ElementId, TransitionId};
use procflow_core::utils::LayoutConfig;
use tracing::{debug, warn};

use crate::model::{
    ConnectionDraft, Element, ElementDraft, ElementType, Requisite, Transition,
    TransitionCondition, TransitionPatch,
};
use crate::store::GraphTables;

/// Name given to decisions inserted by the engine.
pub const DECISION_NAME: &str = "Решение";

/// Run `f` against a savepoint of `tables`, keeping its changes only if it
/// succeeds. Returns whether the changes were kept.
///
/// The savepoint is a full clone of the tables.
pub(crate) fn best_effort<F>(tables: &mut GraphTables, trigger: &str, f: F) -> bool
where
    F: FnOnce(&mut GraphTables) -> Result<()>,
{
    let mut scratch = tables.clone();
    match f(&mut scratch) {
        Ok(()) => {
            *tables = scratch;
            true
        }
        Err(err) => {
            warn!(trigger, error = %err, "graph augmentation skipped");
            false
        }
    }
}

/// Whether any outgoing connection of the element ends at a decision.
pub fn has_decision_successor(tables: &GraphTables, element_id: &ElementId) -> bool {
    tables.outgoing(element_id).any(|c| {
        tables
            .elements
            .get(&c.target_id)
            .is_some_and(|e| e.element_type.is_decision())
    })
}

/// Make sure a decision follows the element, inserting one to its right if
/// needed. Returns the inserted decision.
pub fn ensure_decision_after(
    tables: &mut GraphTables,
    element_id: &ElementId,
    layout: &LayoutConfig,
) -> Result<Option<Element>> {
    if has_decision_successor(tables, element_id) {
        return Ok(None);
    }

    let element = tables.element(element_id)?.clone();
    let mut draft = ElementDraft::new(ElementType::Decision, DECISION_NAME);
    draft.geometry = element.geometry.shifted(layout.decision_offset_x, 0.0);
    draft.properties.needs_configuration = true;

    let decision = tables.create_element(&element.schema_id, draft)?;
    tables.create_connection(
        &element.schema_id,
        ConnectionDraft::new(element.id, decision.id),
    )?;

    debug!(element = %element.id, decision = %decision.id, "decision inserted");
    Ok(Some(decision))
}

/// Trigger for a newly created element.
pub fn on_element_created(tables: &mut GraphTables, element: &Element, layout: &LayoutConfig) {
    if element.element_type != ElementType::Process {
        return;
    }
    best_effort(tables, "process_created", |t| {
        ensure_decision_after(t, &element.id, layout).map(|_| ())
    });
}

/// Trigger for a newly added requisite.
pub fn on_requisite_added(
    tables: &mut GraphTables,
    requisite: &Requisite,
    layout: &LayoutConfig,
) {
    if !requisite.is_approval() {
        return;
    }
    best_effort(tables, "approval_requisite_added", |t| {
        let element = t.element_mut(&requisite.element_id)?;
        element.properties.has_approval_requisite = true;
        element.touch();
        ensure_decision_after(t, &requisite.element_id, layout).map(|_| ())
    });
}

/// Trigger for a transition that was created or changed.
pub fn on_transition_saved(
    tables: &mut GraphTables,
    transition: &Transition,
    layout: &LayoutConfig,
) {
    if transition.condition != TransitionCondition::ApprovedOrRejected {
        return;
    }
    best_effort(tables, "approval_transition_saved", |t| {
        ensure_decision_after(t, &transition.element_id, layout).map(|_| ())
    });
}

/// Remove the decisions' links around a process: every connection from the
/// process to a decision, and every connection leaving those decisions.
/// Returns the number of removed connections.
pub fn prune_decision_links(tables: &mut GraphTables, process_id: &ElementId) -> Result<usize> {
    tables.element(process_id)?;

    let decisions: Vec<ElementId> = tables
        .outgoing(process_id)
        .filter(|c| {
            tables
                .elements
                .get(&c.target_id)
                .is_some_and(|e| e.element_type.is_decision())
        })
        .map(|c| c.target_id)
        .collect();

    let before = tables.connections.len();
    tables.connections.retain(|_, c| {
        let into_decision = &c.source_id == process_id && decisions.contains(&c.target_id);
        let out_of_decision = decisions.contains(&c.source_id);
        !(into_decision || out_of_decision)
    });
    let removed = before - tables.connections.len();

    debug!(process = %process_id, removed, "decision links pruned");
    Ok(removed)
}

/// Update a transition and keep the graph in line with its condition.
///
/// Moving into `approved_or_rejected` ensures a decision follows. Moving
/// away from it prunes the decision links when `adjust_decision_links` is
/// set.
pub fn update_transition_with_graph_adjust(
    tables: &mut GraphTables,
    transition_id: &TransitionId,
    patch: TransitionPatch,
    adjust_decision_links: bool,
    layout: &LayoutConfig,
) -> Result<Transition> {
    let before = tables.owned::<Transition>(transition_id)?.condition.clone();
    let updated = tables.update_transition(transition_id, patch)?;

    if updated.condition == TransitionCondition::ApprovedOrRejected {
        on_transition_saved(tables, &updated, layout);
    } else if before == TransitionCondition::ApprovedOrRejected && adjust_decision_links {
        best_effort(tables, "approval_transition_removed", |t| {
            prune_decision_links(t, &updated.element_id).map(|_| ())
        });
    }
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{RequisiteDraft, SchemaDraft, TransitionDraft};
    use procflow_core::id::SchemaId;

    fn setup() -> (GraphTables, SchemaId) {
        let mut tables = GraphTables::new();
        let schema = tables.create_schema(SchemaDraft::named("Aug")).unwrap().id;
        (tables, schema)
    }

    fn decisions(tables: &GraphTables, schema: &SchemaId) -> usize {
        tables
            .elements_of(schema)
            .iter()
            .filter(|e| e.element_type.is_decision())
            .count()
    }

    #[test]
    fn test_process_gets_decision_once() {
        let (mut tables, schema) = setup();
        let layout = LayoutConfig::default();
        let process = tables
            .create_element(&schema, ElementDraft::new(ElementType::Process, "Review").at(100.0, 50.0))
            .unwrap();

        on_element_created(&mut tables, &process, &layout);
        on_element_created(&mut tables, &process, &layout);
        assert_eq!(decisions(&tables, &schema), 1);

        let decision = tables
            .elements_of(&schema)
            .into_iter()
            .find(|e| e.element_type.is_decision())
            .unwrap()
            .clone();
        assert!(decision.properties.needs_configuration);
        assert_eq!(decision.geometry.position_x, 300.0);
        assert_eq!(decision.geometry.position_y, 50.0);
        assert!(has_decision_successor(&tables, &process.id));
    }

    #[test]
    fn test_start_element_is_not_augmented() {
        let (mut tables, schema) = setup();
        let start = tables
            .create_element(&schema, ElementDraft::new(ElementType::Start, "Start"))
            .unwrap();
        on_element_created(&mut tables, &start, &LayoutConfig::default());
        assert_eq!(decisions(&tables, &schema), 0);
    }

    #[test]
    fn test_failed_trigger_leaves_no_trace() {
        let (mut tables, schema) = setup();
        let decision = tables
            .create_element(&schema, ElementDraft::new(ElementType::Decision, "D"))
            .unwrap();
        let requisite = tables
            .create_requisite(&decision.id, RequisiteDraft::new("Approve", "approval"))
            .unwrap();

        // a decision cannot lead to another decision, so the trigger fails
        on_requisite_added(&mut tables, &requisite, &LayoutConfig::default());
        assert_eq!(decisions(&tables, &schema), 1);
        assert!(!tables.element(&decision.id).unwrap().properties.has_approval_requisite);
    }

    #[test]
    fn test_approval_requisite_marks_element() {
        let (mut tables, schema) = setup();
        let process = tables
            .create_element(&schema, ElementDraft::new(ElementType::Process, "Review"))
            .unwrap();
        let requisite = tables
            .create_requisite(&process.id, RequisiteDraft::new("Approve", "approval"))
            .unwrap();
        on_requisite_added(&mut tables, &requisite, &LayoutConfig::default());

        assert!(tables.element(&process.id).unwrap().properties.has_approval_requisite);
        assert_eq!(decisions(&tables, &schema), 1);
    }

    #[test]
    fn test_moving_away_prunes_when_asked() {
        let (mut tables, schema) = setup();
        let layout = LayoutConfig::default();
        let process = tables
            .create_element(&schema, ElementDraft::new(ElementType::Process, "Review"))
            .unwrap();
        let next = tables
            .create_element(&schema, ElementDraft::new(ElementType::Process, "Next"))
            .unwrap();
        let transition = tables
            .create_transition(
                &process.id,
                TransitionDraft::new("Decide", "approved_or_rejected", "approve_or_reject"),
            )
            .unwrap();
        on_transition_saved(&mut tables, &transition, &layout);
        let decision = tables
            .outgoing(&process.id)
            .map(|c| c.target_id)
            .next()
            .unwrap();
        tables
            .create_connection(&schema, ConnectionDraft::new(decision, next.id).labeled("Согласовано"))
            .unwrap();
        assert_eq!(tables.connections_of(&schema).len(), 2);

        let patch = TransitionPatch {
            condition: Some(TransitionCondition::Filled),
            transition_type: Some("next".into()),
            ..Default::default()
        };
        update_transition_with_graph_adjust(&mut tables, &transition.id, patch, true, &layout)
            .unwrap();

        assert!(tables.connections_of(&schema).is_empty());
        assert!(tables.element(&decision).is_ok());
    }

    #[test]
    fn test_moving_away_keeps_links_by_default() {
        let (mut tables, schema) = setup();
        let layout = LayoutConfig::default();
        let process = tables
            .create_element(&schema, ElementDraft::new(ElementType::Process, "Review"))
            .unwrap();
        let transition = tables
            .create_transition(
                &process.id,
                TransitionDraft::new("Decide", "approved_or_rejected", "resolution"),
            )
            .unwrap();
        on_transition_saved(&mut tables, &transition, &layout);

        let patch = TransitionPatch {
            condition: Some(TransitionCondition::Approved),
            ..Default::default()
        };
        update_transition_with_graph_adjust(&mut tables, &transition.id, patch, false, &layout)
            .unwrap();
        assert_eq!(tables.connections_of(&schema).len(), 1);
    }
}
