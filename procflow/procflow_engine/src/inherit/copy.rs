//! Element copies and parent/child inheritance.

use procflow_core::error::Result;
use procflow_core::id::{ElementId, NotificationId, PrintFormId, RoleId, SchemaId, TransitionId};
use procflow_core::utils::LayoutConfig;
use tracing::{debug, info};

use crate::augment::best_effort;
use crate::inherit::cascade::Inheritable;
use crate::model::{
    Checklist, ConnectionDraft, Element, Geometry, Notification, Requisite, Role, Transition,
};
use crate::store::GraphTables;

/// Appended to the name of copied elements and schemas.
pub const COPY_SUFFIX: &str = " (копия)";

/// How a single element is copied.
pub(crate) struct ElementCopy<'a> {
    pub schema_id: SchemaId,
    pub name: String,
    pub geometry: Geometry,
    /// Source to stamp on copied requisites, checklists and print forms
    pub marker: Option<(ElementId, &'a str)>,
    pub keep_parent_link: bool,
}

/// Copy an element with all of its sub-entities under fresh ids.
pub(crate) fn clone_element(
    tables: &mut GraphTables,
    source_id: &ElementId,
    spec: ElementCopy<'_>,
) -> Result<Element> {
    let source = tables.element(source_id)?.clone();

    let mut copy = Element::new(spec.schema_id, source.element_type, spec.name);
    copy.description = source.description.clone();
    copy.geometry = spec.geometry;
    copy.properties = source.properties.clone();
    if !spec.keep_parent_link {
        copy.properties.parent_element_id = None;
        copy.properties.parent_element_name = None;
        copy.properties.fully_inherited = false;
    }
    for form in &mut copy.properties.print_forms {
        form.id = PrintFormId::new();
        if let Some((from, from_name)) = spec.marker {
            form.meta.stamp(from, from_name);
        }
    }
    copy.properties.print_form = copy.properties.print_forms.last().cloned();

    tables.put_element(copy.clone());
    copy_sub_entities(tables, source_id, &copy.id, spec.marker);
    Ok(copy)
}

/// Copy requisites (with their stages), checklists, roles, transitions and
/// notifications from one element to another.
pub(crate) fn copy_sub_entities(
    tables: &mut GraphTables,
    from: &ElementId,
    to: &ElementId,
    marker: Option<(ElementId, &str)>,
) {
    copy_marked::<Requisite>(tables, from, to, marker);
    copy_marked::<Checklist>(tables, from, to, marker);

    let roles: Vec<Role> = tables.owned_by::<Role>(from).into_iter().cloned().collect();
    for mut role in roles {
        role.id = RoleId::new();
        role.element_id = *to;
        tables.insert_owned(role);
    }

    let transitions: Vec<Transition> = tables.owned_by::<Transition>(from).into_iter().cloned().collect();
    for mut transition in transitions {
        transition.id = TransitionId::new();
        transition.element_id = *to;
        tables.insert_owned(transition);
    }

    let notifications: Vec<Notification> =
        tables.owned_by::<Notification>(from).into_iter().cloned().collect();
    for mut notification in notifications {
        notification.id = NotificationId::new();
        notification.element_id = *to;
        tables.insert_owned(notification);
    }
}

fn copy_marked<E: Inheritable>(
    tables: &mut GraphTables,
    from: &ElementId,
    to: &ElementId,
    marker: Option<(ElementId, &str)>,
) {
    let rows: Vec<E> = tables.owned_by::<E>(from).into_iter().cloned().collect();
    for row in rows {
        let mut copy = row.fresh_copy(*to);
        if let Some((source, name)) = marker {
            copy.markers_mut().stamp(source, name);
        }
        tables.insert_owned(copy);
    }
}

/// Copy an element next to itself in the same schema.
///
/// Copied requisites, checklists and print forms are marked as inherited
/// from the source element.
pub fn copy_element(
    tables: &mut GraphTables,
    element_id: &ElementId,
    layout: &LayoutConfig,
) -> Result<Element> {
    let source = tables.element(element_id)?.clone();
    let copy = clone_element(
        tables,
        element_id,
        ElementCopy {
            schema_id: source.schema_id,
            name: format!("{}{}", source.name, COPY_SUFFIX),
            geometry: source.geometry.shifted(layout.copy_offset, layout.copy_offset),
            marker: Some((source.id, &source.name)),
            keep_parent_link: false,
        },
    )?;
    debug!(source = %element_id, copy = %copy.id, "element copied");
    Ok(copy)
}

/// Create a child element inheriting from `parent_id`.
///
/// The child is placed to the right of the parent and linked back to it.
/// A parent-to-child connection is added when the edge rules allow one;
/// otherwise it is skipped and logged, and the child is still created.
pub fn inherit_element(
    tables: &mut GraphTables,
    parent_id: &ElementId,
    layout: &LayoutConfig,
) -> Result<Element> {
    let parent = tables.element(parent_id)?.clone();
    let mut child = copy_element(tables, parent_id, layout)?;

    child.geometry = parent.geometry.shifted(layout.child_offset_x, 0.0);
    child.properties.parent_element_id = Some(parent.id);
    child.properties.parent_element_name = Some(parent.name.clone());
    child.properties.fully_inherited = true;
    tables.put_element(child.clone());

    let schema_id = parent.schema_id;
    let child_id = child.id;
    let linked = best_effort(tables, "inherit_link", |t| {
        t.create_connection(&schema_id, ConnectionDraft::new(parent.id, child_id))
            .map(|_| ())
    });
    if !linked {
        info!(parent = %parent_id, child = %child_id, "no parent link drawn for inherited element");
    }

    info!(parent = %parent_id, child = %child.id, linked, "element inherited");
    Ok(child)
}

/// Elements inheriting from `parent_id`.
pub fn list_children(tables: &GraphTables, parent_id: &ElementId) -> Result<Vec<Element>> {
    tables.element(parent_id)?;
    Ok(tables.children_of(parent_id).into_iter().cloned().collect())
}

/// Rebuild every child of `parent_id` from the parent's current state.
///
/// Each child's name and description are overwritten. Its requisites,
/// checklists, roles, transitions, notifications and the print forms it
/// inherited from this parent are replaced with fresh copies of the parent's.
pub fn sync_children_from_parent(
    tables: &mut GraphTables,
    parent_id: &ElementId,
) -> Result<Vec<Element>> {
    let parent = tables.element(parent_id)?.clone();
    let child_ids: Vec<ElementId> = tables.children_of(parent_id).iter().map(|c| c.id).collect();

    let mut synced = Vec::with_capacity(child_ids.len());
    for child_id in child_ids {
        tables.clear_owned::<Requisite>(&child_id);
        tables.clear_owned::<Checklist>(&child_id);
        tables.clear_owned::<Role>(&child_id);
        tables.clear_owned::<Transition>(&child_id);
        tables.clear_owned::<Notification>(&child_id);
        copy_sub_entities(tables, parent_id, &child_id, Some((parent.id, &parent.name)));

        let child = tables.element_mut(&child_id)?;
        child.name = parent.name.clone();
        child.description = parent.description.clone();
        child.properties.parent_element_name = Some(parent.name.clone());

        let forms = &mut child.properties.print_forms;
        forms.retain(|f| !f.meta.is_inherited_from(&parent.id));
        let mut order = forms.iter().map(|f| f.order + 1).max().unwrap_or(0);
        for form in &parent.properties.print_forms {
            let mut copy = form.inherited_copy(parent.id, &parent.name);
            copy.order = order;
            order += 1;
            forms.push(copy);
        }
        child.properties.print_form = child.properties.print_forms.last().cloned();
        child.touch();
        synced.push(child.clone());
    }

    info!(parent = %parent_id, children = synced.len(), "children synchronized");
    Ok(synced)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        ChecklistDraft, ElementDraft, ElementType, PrintFormDraft, RequisiteDraft, RoleDraft,
        SchemaDraft, TransitionDraft,
    };
    use crate::store::OwnedEntity;

    fn setup() -> (GraphTables, SchemaId, ElementId) {
        let mut tables = GraphTables::new();
        let schema = tables.create_schema(SchemaDraft::named("Inherit")).unwrap().id;
        let mut draft = ElementDraft::new(ElementType::Process, "Review").at(10.0, 20.0);
        draft
            .properties
            .print_forms
            .push(PrintFormDraft::named("Act").into_print_form(0));
        let parent = tables.create_element(&schema, draft).unwrap().id;
        tables
            .create_requisite(&parent, RequisiteDraft::new("Amount", "number"))
            .unwrap();
        tables
            .create_checklist(&parent, ChecklistDraft::named("Passport"))
            .unwrap();
        tables
            .create_role(&parent, RoleDraft::new("Clerk", "clerk"))
            .unwrap();
        tables
            .create_transition(&parent, TransitionDraft::new("Next", "filled", "next"))
            .unwrap();
        (tables, schema, parent)
    }

    #[test]
    fn test_copy_element_stamps_markers() {
        let (mut tables, _, parent) = setup();
        let copy = copy_element(&mut tables, &parent, &LayoutConfig::default()).unwrap();

        assert_eq!(copy.name, "Review (копия)");
        assert_eq!(copy.geometry.position_x, 50.0);
        assert_eq!(copy.geometry.position_y, 60.0);
        assert!(copy.parent_id().is_none());

        let requisites = tables.owned_by::<Requisite>(&copy.id);
        assert_eq!(requisites.len(), 1);
        assert!(requisites[0].validation.is_inherited_from(&parent));
        assert!(tables.owned_by::<Checklist>(&copy.id)[0]
            .meta
            .is_inherited_from(&parent));
        assert_eq!(tables.owned_by::<Role>(&copy.id).len(), 1);
        assert_eq!(tables.owned_by::<Transition>(&copy.id).len(), 1);

        let form = &copy.properties.print_forms[0];
        assert!(form.meta.is_inherited_from(&parent));
        assert_eq!(copy.properties.print_form.as_ref(), Some(form));
    }

    #[test]
    fn test_inherit_element_links_child() {
        let (mut tables, schema, parent) = setup();
        let child = inherit_element(&mut tables, &parent, &LayoutConfig::default()).unwrap();

        assert_eq!(child.parent_id(), Some(parent));
        assert!(child.properties.fully_inherited);
        assert_eq!(child.geometry.position_x, 260.0);
        assert_eq!(child.geometry.position_y, 20.0);

        let children = list_children(&tables, &parent).unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].id, child.id);

        // process to process is not a legal edge, so no link is drawn
        assert!(tables.connections_of(&schema).is_empty());
    }

    #[test]
    fn test_inherit_element_draws_legal_link() {
        let (mut tables, schema, _) = setup();
        let start = tables
            .create_element(&schema, ElementDraft::new(ElementType::Start, "Start"))
            .unwrap()
            .id;
        let child = inherit_element(&mut tables, &start, &LayoutConfig::default()).unwrap();

        let links = tables.connections_of(&schema);
        assert_eq!(links.len(), 1);
        assert_eq!((links[0].source_id, links[0].target_id), (start, child.id));
    }

    #[test]
    fn test_sync_replaces_child_state() {
        let (mut tables, _, parent) = setup();
        let layout = LayoutConfig::default();
        let child = inherit_element(&mut tables, &parent, &layout).unwrap();
        tables
            .create_requisite(&child.id, RequisiteDraft::new("Local", "text"))
            .unwrap();
        tables
            .create_requisite(&parent, RequisiteDraft::new("Deadline", "date"))
            .unwrap();
        tables.element_mut(&parent).unwrap().description = Some("updated".into());

        let synced = sync_children_from_parent(&mut tables, &parent).unwrap();
        assert_eq!(synced.len(), 1);
        assert_eq!(synced[0].name, "Review");
        assert_eq!(synced[0].description.as_deref(), Some("updated"));
        assert_eq!(synced[0].properties.print_forms.len(), 1);

        let names: Vec<&str> = tables
            .owned_by::<Requisite>(&child.id)
            .iter()
            .map(|r| r.name())
            .collect();
        assert_eq!(names, vec!["Amount", "Deadline"]);
        assert!(tables
            .owned_by::<Requisite>(&child.id)
            .iter()
            .all(|r| r.validation.is_inherited_from(&parent)));
    }
}
