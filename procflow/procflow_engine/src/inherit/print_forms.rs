//! Print forms attached to elements.
//!
//! Print forms are stored in the element's `properties.printForms` list.
//! Every change also rewrites the legacy `properties.printForm` field with
//! the form that was touched last.

use procflow_core::error::{EntityKind, Error, Result};
use procflow_core::id::{ElementId, PrintFormId};
use tracing::debug;

use crate::model::{Element, PrintForm, PrintFormDraft, PrintFormPatch};
use crate::store::GraphTables;

fn position(element: &Element, form_id: &PrintFormId) -> Result<usize> {
    element
        .properties
        .print_forms
        .iter()
        .position(|f| &f.id == form_id)
        .ok_or_else(|| Error::not_found(EntityKind::PrintForm, form_id))
}

fn next_form_order(element: &Element) -> u32 {
    element
        .properties
        .print_forms
        .iter()
        .map(|f| f.order + 1)
        .max()
        .unwrap_or(0)
}

/// Append a form and point the legacy mirror at it.
fn push_form(element: &mut Element, mut form: PrintForm) -> PrintForm {
    form.order = next_form_order(element);
    element.properties.print_forms.push(form.clone());
    element.properties.print_form = Some(form.clone());
    element.touch();
    form
}

/// Print forms of an element in display order.
pub fn list_print_forms(tables: &GraphTables, element_id: &ElementId) -> Result<Vec<PrintForm>> {
    let mut forms = tables.element(element_id)?.properties.print_forms.clone();
    forms.sort_by_key(|f| f.order);
    Ok(forms)
}

pub fn add_print_form(
    tables: &mut GraphTables,
    element_id: &ElementId,
    draft: PrintFormDraft,
) -> Result<PrintForm> {
    let element = tables.element_mut(element_id)?;
    let form = push_form(element, draft.into_print_form(0));
    debug!(element = %element_id, form = %form.id, "print form added");
    Ok(form)
}

pub fn update_print_form(
    tables: &mut GraphTables,
    element_id: &ElementId,
    form_id: &PrintFormId,
    patch: &PrintFormPatch,
) -> Result<PrintForm> {
    let element = tables.element_mut(element_id)?;
    let index = position(element, form_id)?;
    let form = &mut element.properties.print_forms[index];
    patch.apply(form);
    let form = form.clone();
    element.properties.print_form = Some(form.clone());
    element.touch();
    Ok(form)
}

pub fn remove_print_form(
    tables: &mut GraphTables,
    element_id: &ElementId,
    form_id: &PrintFormId,
) -> Result<PrintForm> {
    let element = tables.element_mut(element_id)?;
    let index = position(element, form_id)?;
    let removed = element.properties.print_forms.remove(index);
    element.properties.print_form = element.properties.print_forms.last().cloned();
    element.touch();
    debug!(element = %element_id, form = %form_id, "print form removed");
    Ok(removed)
}

/// Copy every print form of `from` onto `to`, marked as inherited.
///
/// Forms whose name already matches a form `to` inherited from `from` are
/// skipped. Returns the forms that were added.
pub fn inherit_print_forms(
    tables: &mut GraphTables,
    from: &ElementId,
    to: &ElementId,
) -> Result<Vec<PrintForm>> {
    let source = tables.element(from)?.clone();
    let target = tables.element_mut(to)?;

    let mut added = Vec::new();
    for form in &source.properties.print_forms {
        let taken = target
            .properties
            .print_forms
            .iter()
            .any(|f| f.meta.is_inherited_from(from) && f.match_name() == form.match_name());
        if taken {
            continue;
        }
        added.push(push_form(target, form.inherited_copy(source.id, &source.name)));
    }

    debug!(from = %from, to = %to, added = added.len(), "print forms inherited");
    Ok(added)
}

/// Copy a single print form from one element to another, marked as inherited.
pub fn copy_print_form(
    tables: &mut GraphTables,
    from: &ElementId,
    form_id: &PrintFormId,
    to: &ElementId,
) -> Result<PrintForm> {
    let source = tables.element(from)?;
    let form = source.properties.print_forms[position(source, form_id)?]
        .inherited_copy(source.id, &source.name);
    let target = tables.element_mut(to)?;
    Ok(push_form(target, form))
}

pub fn break_print_form_inheritance(
    tables: &mut GraphTables,
    element_id: &ElementId,
    form_id: &PrintFormId,
) -> Result<PrintForm> {
    let element = tables.element_mut(element_id)?;
    let index = position(element, form_id)?;
    let form = &mut element.properties.print_forms[index];
    form.meta.clear();
    let form = form.clone();
    element.properties.print_form = Some(form.clone());
    element.touch();
    Ok(form)
}
