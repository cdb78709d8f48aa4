//! Inheriting from any upstream process, not only from a parent.

use procflow_core::error::{Error, Result};
use procflow_core::id::ElementId;
use tracing::debug;

use crate::graph::SchemaGraph;
use crate::inherit::cascade::Inheritable;
use crate::model::{Checklist, Element, ElementType, Requisite};
use crate::store::GraphTables;

/// Every PROCESS element upstream of `element_id`, nearest first.
pub fn list_previous_processes(tables: &GraphTables, element_id: &ElementId) -> Result<Vec<Element>> {
    let element = tables.element(element_id)?;
    let graph = SchemaGraph::build(tables, &element.schema_id)?;
    Ok(graph
        .ancestors(element_id)
        .into_iter()
        .filter(|e| e.element_type == ElementType::Process)
        .cloned()
        .collect())
}

/// Fails with `Conflict` unless `source` is upstream of `target` or is its
/// parent.
pub fn ensure_upstream(tables: &GraphTables, source: &ElementId, target: &ElementId) -> Result<()> {
    tables.element(source)?;
    if tables.element(target)?.parent_id().as_ref() == Some(source) {
        return Ok(());
    }
    if list_previous_processes(tables, target)?
        .iter()
        .any(|e| &e.id == source)
    {
        return Ok(());
    }
    Err(Error::Conflict(format!(
        "Element {} is not a previous process of {}",
        source, target
    )))
}

/// Copy rows of `source` onto `target` with markers, skipping names the
/// target already inherited from the same source.
fn inherit_from<E: Inheritable>(
    tables: &mut GraphTables,
    source: &ElementId,
    target: &ElementId,
) -> Result<Vec<E>> {
    ensure_upstream(tables, source, target)?;
    let source_name = tables.element(source)?.name.clone();

    let taken: Vec<String> = tables
        .owned_by::<E>(target)
        .into_iter()
        .filter(|row| row.markers().is_inherited_from(source))
        .map(|row| row.name().to_string())
        .collect();
    let rows: Vec<E> = tables
        .owned_by::<E>(source)
        .into_iter()
        .filter(|row| !taken.iter().any(|name| name == row.name()))
        .cloned()
        .collect();

    let mut added = Vec::with_capacity(rows.len());
    for row in rows {
        let mut copy = row.fresh_copy(*target);
        copy.markers_mut().stamp(*source, &source_name);
        copy.set_order(tables.next_order::<E>(target));
        tables.insert_owned(copy.clone());
        added.push(copy);
    }

    debug!(kind = %E::KIND, source = %source, target = %target, added = added.len(), "inherited from upstream");
    Ok(added)
}

pub fn inherit_requisites_from(
    tables: &mut GraphTables,
    source: &ElementId,
    target: &ElementId,
) -> Result<Vec<Requisite>> {
    inherit_from(tables, source, target)
}

pub fn inherit_checklists_from(
    tables: &mut GraphTables,
    source: &ElementId,
    target: &ElementId,
) -> Result<Vec<Checklist>> {
    inherit_from(tables, source, target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ChecklistDraft, ConnectionDraft, ElementDraft, RequisiteDraft, SchemaDraft};
    use crate::store::OwnedEntity;

    struct Chain {
        tables: GraphTables,
        first: ElementId,
        second: ElementId,
        third: ElementId,
    }

    /// first -> decision -> second -> decision -> third
    fn chain() -> Chain {
        let mut tables = GraphTables::new();
        let schema = tables.create_schema(SchemaDraft::named("Lineage")).unwrap().id;
        let mut add = |kind, name: &str| tables.create_element(&schema, ElementDraft::new(kind, name)).unwrap().id;
        let first = add(ElementType::Process, "First");
        let d1 = add(ElementType::Decision, "D1");
        let second = add(ElementType::Process, "Second");
        let d2 = add(ElementType::Decision, "D2");
        let third = add(ElementType::Process, "Third");
        for (s, t) in [(first, d1), (d1, second), (second, d2), (d2, third)] {
            tables.create_connection(&schema, ConnectionDraft::new(s, t)).unwrap();
        }
        Chain {
            tables,
            first,
            second,
            third,
        }
    }

    #[test]
    fn test_previous_processes_nearest_first() {
        let c = chain();
        let names: Vec<String> = list_previous_processes(&c.tables, &c.third)
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["Second", "First"]);
        assert!(list_previous_processes(&c.tables, &c.first).unwrap().is_empty());
    }

    #[test]
    fn test_inherit_from_upstream_once() {
        let mut c = chain();
        c.tables
            .create_requisite(&c.first, RequisiteDraft::new("Amount", "number"))
            .unwrap();
        c.tables
            .create_requisite(&c.third, RequisiteDraft::new("Local", "text"))
            .unwrap();

        let added = inherit_requisites_from(&mut c.tables, &c.first, &c.third).unwrap();
        assert_eq!(added.len(), 1);
        assert!(added[0].validation.is_inherited_from(&c.first));
        assert_eq!(added[0].order, 1);

        let again = inherit_requisites_from(&mut c.tables, &c.first, &c.third).unwrap();
        assert!(again.is_empty());
        assert_eq!(c.tables.owned_by::<Requisite>(&c.third).len(), 2);
    }

    #[test]
    fn test_downstream_source_is_refused() {
        let mut c = chain();
        c.tables
            .create_checklist(&c.third, ChecklistDraft::named("Passport"))
            .unwrap();
        let err = inherit_checklists_from(&mut c.tables, &c.third, &c.second).unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));

        let added = inherit_checklists_from(&mut c.tables, &c.second, &c.third).unwrap();
        assert!(added.is_empty());
        assert_eq!(c.tables.owned_by::<Checklist>(&c.third)[0].name(), "Passport");
    }
}
