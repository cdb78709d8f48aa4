//! Reordering of element-owned rows.

use std::collections::BTreeSet;

use procflow_core::error::{Error, Result};
use procflow_core::id::{
    ChecklistId, ElementId, NotificationId, PrintFormId, RequisiteId, RoleId, TransitionId,
};
use tracing::debug;

use crate::model::{Checklist, Notification, PrintForm, Requisite, Role, Transition};
use crate::store::{GraphTables, OwnedEntity};

/// Checks that `ids` is exactly `current`, each id once.
fn ensure_same_set<I: Ord + Copy>(current: BTreeSet<I>, ids: &[I]) -> Result<()> {
    let given: BTreeSet<I> = ids.iter().copied().collect();
    if given.len() != ids.len() {
        return Err(Error::Conflict("Reorder list contains duplicates".into()));
    }
    if given != current {
        return Err(Error::Conflict(
            "Reorder list does not match the element's current items".into(),
        ));
    }
    Ok(())
}

/// Rewrite the order of an element's rows to follow `ids`.
pub fn reorder<E: OwnedEntity>(
    tables: &mut GraphTables,
    element_id: &ElementId,
    ids: &[E::Id],
) -> Result<Vec<E>> {
    tables.element(element_id)?;
    let current: BTreeSet<E::Id> = tables.owned_by::<E>(element_id).iter().map(|r| r.id()).collect();
    ensure_same_set(current, ids)?;

    for (order, id) in ids.iter().enumerate() {
        tables.owned_mut::<E>(id)?.set_order(order as u32);
    }
    debug!(kind = %E::KIND, element = %element_id, count = ids.len(), "reordered");
    Ok(tables.owned_by::<E>(element_id).into_iter().cloned().collect())
}

pub fn reorder_requisites(
    tables: &mut GraphTables,
    element_id: &ElementId,
    ids: &[RequisiteId],
) -> Result<Vec<Requisite>> {
    reorder(tables, element_id, ids)
}

pub fn reorder_checklists(
    tables: &mut GraphTables,
    element_id: &ElementId,
    ids: &[ChecklistId],
) -> Result<Vec<Checklist>> {
    reorder(tables, element_id, ids)
}

pub fn reorder_transitions(
    tables: &mut GraphTables,
    element_id: &ElementId,
    ids: &[TransitionId],
) -> Result<Vec<Transition>> {
    reorder(tables, element_id, ids)
}

pub fn reorder_roles(
    tables: &mut GraphTables,
    element_id: &ElementId,
    ids: &[RoleId],
) -> Result<Vec<Role>> {
    reorder(tables, element_id, ids)
}

pub fn reorder_notifications(
    tables: &mut GraphTables,
    element_id: &ElementId,
    ids: &[NotificationId],
) -> Result<Vec<Notification>> {
    reorder(tables, element_id, ids)
}

/// Print forms live inside the element, so they are reordered in place and
/// the list is stored sorted.
pub fn reorder_print_forms(
    tables: &mut GraphTables,
    element_id: &ElementId,
    ids: &[PrintFormId],
) -> Result<Vec<PrintForm>> {
    let element = tables.element_mut(element_id)?;
    let forms = &mut element.properties.print_forms;
    ensure_same_set(forms.iter().map(|f| f.id).collect(), ids)?;

    for form in forms.iter_mut() {
        if let Some(order) = ids.iter().position(|id| id == &form.id) {
            form.order = order as u32;
        }
    }
    forms.sort_by_key(|f| f.order);
    let forms = forms.clone();
    element.touch();
    Ok(forms)
}
