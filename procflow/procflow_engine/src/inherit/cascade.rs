//! Propagating edits of a parent's requisites and checklists to the copies
//! inherited from it.
//!
//! A copy is bound to its source by its markers (`inherited`,
//! `inheritedFromElementId`) together with its name. Copies whose
//! inheritance has been broken, or which were created independently under
//! the same name, are never touched.

use procflow_core::error::{Error, Result};
use procflow_core::id::{ChecklistId, ElementId, RequisiteId};
use tracing::debug;

use crate::model::{Checklist, ChecklistPatch, InheritanceMeta, Requisite, RequisitePatch};
use crate::store::{GraphTables, OwnedEntity};

/// An element-owned entity that carries inheritance markers.
pub trait Inheritable: OwnedEntity {
    fn markers(&self) -> &InheritanceMeta;
    fn markers_mut(&mut self) -> &mut InheritanceMeta;

    /// A copy under fresh ids, attached to `element_id`.
    fn fresh_copy(&self, element_id: ElementId) -> Self;
}

impl Inheritable for Requisite {
    fn markers(&self) -> &InheritanceMeta {
        &self.validation
    }
    fn markers_mut(&mut self) -> &mut InheritanceMeta {
        &mut self.validation
    }
    fn fresh_copy(&self, element_id: ElementId) -> Self {
        self.clone().with_fresh_ids(element_id)
    }
}

impl Inheritable for Checklist {
    fn markers(&self) -> &InheritanceMeta {
        &self.meta
    }
    fn markers_mut(&mut self) -> &mut InheritanceMeta {
        &mut self.meta
    }
    fn fresh_copy(&self, element_id: ElementId) -> Self {
        let mut copy = self.clone();
        copy.id = ChecklistId::new();
        copy.element_id = element_id;
        copy
    }
}

/// The result of a cascading edit.
#[derive(Debug, Clone, PartialEq)]
pub struct Cascade<E> {
    /// The parent's entity after the edit
    pub parent: E,
    /// How many inherited copies were changed along with it
    pub propagated: usize,
}

fn parent_row<E: Inheritable>(tables: &GraphTables, parent_id: &ElementId, id: &E::Id) -> Result<E> {
    tables.element(parent_id)?;
    let row = tables.owned::<E>(id)?;
    if &row.element_id() != parent_id {
        return Err(Error::not_found(E::KIND, id));
    }
    Ok(row.clone())
}

/// Ids of the copies bound to (`parent_id`, `name`) inside the parent's
/// schema.
fn bound_copies<E: Inheritable>(
    tables: &GraphTables,
    parent_id: &ElementId,
    name: &str,
) -> Result<Vec<E::Id>> {
    let schema_id = tables.element(parent_id)?.schema_id;
    Ok(E::table(tables)
        .values()
        .filter(|row| {
            &row.element_id() != parent_id
                && row.markers().is_inherited_from(parent_id)
                && row.name() == name
                && tables
                    .element(&row.element_id())
                    .is_ok_and(|e| e.schema_id == schema_id)
        })
        .map(|row| row.id())
        .collect())
}

fn cascade_update<E, F>(
    tables: &mut GraphTables,
    parent_id: &ElementId,
    id: &E::Id,
    apply: F,
) -> Result<Cascade<E>>
where
    E: Inheritable,
    F: Fn(&mut E),
{
    let original = parent_row::<E>(tables, parent_id, id)?;
    let copies = bound_copies::<E>(tables, parent_id, original.name())?;

    let parent = tables.owned_mut::<E>(id)?;
    apply(parent);
    let parent = parent.clone();

    for copy_id in &copies {
        apply(tables.owned_mut::<E>(copy_id)?);
    }

    debug!(kind = %E::KIND, parent = %parent_id, propagated = copies.len(), "cascade update");
    Ok(Cascade {
        parent,
        propagated: copies.len(),
    })
}

fn cascade_delete<E: Inheritable>(
    tables: &mut GraphTables,
    parent_id: &ElementId,
    id: &E::Id,
) -> Result<Cascade<E>> {
    let original = parent_row::<E>(tables, parent_id, id)?;
    let copies = bound_copies::<E>(tables, parent_id, original.name())?;

    let parent = tables.remove_owned::<E>(id)?;
    for copy_id in &copies {
        tables.remove_owned::<E>(copy_id)?;
    }

    debug!(kind = %E::KIND, parent = %parent_id, propagated = copies.len(), "cascade delete");
    Ok(Cascade {
        parent,
        propagated: copies.len(),
    })
}

fn break_inheritance<E: Inheritable>(tables: &mut GraphTables, id: &E::Id) -> Result<E> {
    let row = tables.owned_mut::<E>(id)?;
    row.markers_mut().clear();
    Ok(row.clone())
}

pub fn update_requisite_cascade(
    tables: &mut GraphTables,
    parent_id: &ElementId,
    requisite_id: &RequisiteId,
    patch: &RequisitePatch,
) -> Result<Cascade<Requisite>> {
    cascade_update(tables, parent_id, requisite_id, |r: &mut Requisite| patch.apply(r))
}

pub fn delete_requisite_cascade(
    tables: &mut GraphTables,
    parent_id: &ElementId,
    requisite_id: &RequisiteId,
) -> Result<Cascade<Requisite>> {
    cascade_delete(tables, parent_id, requisite_id)
}

pub fn update_checklist_cascade(
    tables: &mut GraphTables,
    parent_id: &ElementId,
    checklist_id: &ChecklistId,
    patch: &ChecklistPatch,
) -> Result<Cascade<Checklist>> {
    cascade_update(tables, parent_id, checklist_id, |c: &mut Checklist| patch.apply(c))
}

pub fn delete_checklist_cascade(
    tables: &mut GraphTables,
    parent_id: &ElementId,
    checklist_id: &ChecklistId,
) -> Result<Cascade<Checklist>> {
    cascade_delete(tables, parent_id, checklist_id)
}

/// Detach a requisite from its source so later cascades skip it.
pub fn break_requisite_inheritance(
    tables: &mut GraphTables,
    requisite_id: &RequisiteId,
) -> Result<Requisite> {
    break_inheritance(tables, requisite_id)
}

/// Detach a checklist item from its source so later cascades skip it.
pub fn break_checklist_inheritance(
    tables: &mut GraphTables,
    checklist_id: &ChecklistId,
) -> Result<Checklist> {
    break_inheritance(tables, checklist_id)
}
