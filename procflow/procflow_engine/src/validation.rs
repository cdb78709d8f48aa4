//! Structural validation of a process graph.
//!
//! Validation never changes anything. It walks the graph and reports
//! blocking errors and non-blocking warnings:
//!
//! 1. START/END presence
//! 2. isolated elements
//! 3. reachability of END from START
//! 4. cycles (tolerated, reported as a warning)
//! 5. approve/reject branch completeness
//! 6. resolution transitions having a companion transition

use std::collections::BTreeMap;

use procflow_core::error::Result;
use procflow_core::id::{ElementId, SchemaId};
use serde::{Deserialize, Serialize};

use crate::graph::{SchemaGraph, APPROVED_LABEL, REJECTED_LABEL};
use crate::model::{ElementType, Transition, TransitionType};
use crate::store::GraphTables;

/// The outcome of validating one schema.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub elements_count: usize,
    pub connections_count: usize,
}

/// Transitions of the elements of one graph, keyed by element.
#[derive(Debug, Clone, Default)]
pub struct TransitionIndex<'a> {
    by_element: BTreeMap<ElementId, Vec<&'a Transition>>,
}

impl<'a> TransitionIndex<'a> {
    pub fn collect(tables: &'a GraphTables, graph: &SchemaGraph<'_>) -> Self {
        let by_element = graph
            .elements()
            .map(|e| (e.id, tables.owned_by::<Transition>(&e.id)))
            .collect();
        Self { by_element }
    }

    pub fn from_rows(rows: impl IntoIterator<Item = &'a Transition>) -> Self {
        let mut by_element: BTreeMap<ElementId, Vec<&'a Transition>> = BTreeMap::new();
        for row in rows {
            by_element.entry(row.element_id).or_default().push(row);
        }
        Self { by_element }
    }

    pub fn of(&self, element_id: &ElementId) -> &[&'a Transition] {
        self.by_element
            .get(element_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

/// Validate a stored schema.
pub fn validate(tables: &GraphTables, schema_id: &SchemaId) -> Result<ValidationReport> {
    let graph = SchemaGraph::build(tables, schema_id)?;
    let transitions = TransitionIndex::collect(tables, &graph);
    Ok(validate_graph(&graph, Ok(transitions)))
}

/// Validate a graph view.
///
/// When transition data could not be loaded the transition-based checks are
/// skipped with a warning instead of failing the whole validation.
pub fn validate_graph(
    graph: &SchemaGraph<'_>,
    transitions: Result<TransitionIndex<'_>>,
) -> ValidationReport {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    // 1. START / END presence
    let starts = graph.of_type(ElementType::Start);
    let ends = graph.of_type(ElementType::End);
    match starts.len() {
        0 => errors.push("The schema has no START element".to_string()),
        1 => {}
        n => warnings.push(format!("The schema has {} START elements", n)),
    }
    if ends.is_empty() {
        errors.push("The schema has no END element".to_string());
    }

    // 2. isolated elements
    let touched = graph.touched();
    for element in graph.elements() {
        if !element.element_type.is_terminal() && !touched.contains(&element.id) {
            warnings.push(format!(
                "Element '{}' is not connected to anything",
                element.name
            ));
        }
    }

    // 3. reachability
    if !starts.is_empty() && !ends.is_empty() {
        let start_ids: Vec<ElementId> = starts.iter().map(|e| e.id).collect();
        let reached = graph.reachable_from(&start_ids);
        if !ends.iter().any(|end| reached.contains(&end.id)) {
            errors.push("There is no path from START to END".to_string());
        }
        for end in ends.iter().filter(|end| !reached.contains(&end.id)) {
            warnings.push(format!("END element '{}' is unreachable from START", end.name));
        }
    }

    // 4. cycles
    if graph.has_cycle() {
        warnings.push("The schema contains cyclic dependencies".to_string());
    }

    // 5 and 6 need transitions
    match transitions {
        Ok(transitions) => {
            check_approval_branches(graph, &transitions, &mut errors);
            check_resolution_companions(graph, &transitions, &mut errors);
        }
        Err(err) => {
            tracing::warn!(error = %err, "transition data unavailable during validation");
            warnings.push("Could not verify transition conditions".to_string());
        }
    }

    ValidationReport {
        is_valid: errors.is_empty(),
        errors,
        warnings,
        elements_count: graph.element_count(),
        connections_count: graph.connection_count(),
    }
}

fn check_approval_branches(
    graph: &SchemaGraph<'_>,
    transitions: &TransitionIndex<'_>,
    errors: &mut Vec<String>,
) {
    for process in graph.of_type(ElementType::Process) {
        if !transitions
            .of(&process.id)
            .iter()
            .any(|t| t.condition.is_approval())
        {
            continue;
        }

        let decisions: Vec<_> = graph
            .successors(&process.id)
            .into_iter()
            .filter(|e| e.element_type.is_decision())
            .collect();
        if decisions.is_empty() {
            errors.push(format!(
                "Process '{}' has an approve/reject transition but no Decision block after it",
                process.name
            ));
            continue;
        }

        for decision in decisions {
            let labels: Vec<&str> = graph
                .outgoing(&decision.id)
                .iter()
                .map(|c| c.trimmed_label())
                .collect();
            for required in [APPROVED_LABEL, REJECTED_LABEL] {
                if !labels.contains(&required) {
                    errors.push(format!(
                        "Decision '{}' after process '{}' is missing the '{}' branch",
                        decision.name, process.name, required
                    ));
                }
            }
        }
    }
}

fn check_resolution_companions(
    graph: &SchemaGraph<'_>,
    transitions: &TransitionIndex<'_>,
    errors: &mut Vec<String>,
) {
    for process in graph.of_type(ElementType::Process) {
        let rows = transitions.of(&process.id);
        let has_resolution = rows
            .iter()
            .any(|t| t.transition_type == TransitionType::Resolution);
        let has_other = rows
            .iter()
            .any(|t| t.transition_type != TransitionType::Resolution);
        if has_resolution && !has_other {
            errors.push(format!(
                "Process '{}' has a resolution transition but no other transition",
                process.name
            ));
        }
    }
}
