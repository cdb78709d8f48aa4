//! The in-memory representation of every stored graph.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Display;

use procflow_core::error::{EntityKind, Error, Result};
use procflow_core::id::{
    ChecklistId, ConnectionId, ElementId, NotificationId, RequisiteId, RoleId, SchemaId,
    TemplateId, TransitionId,
};
use serde::{Deserialize, Serialize};

use crate::model::{
    Checklist, ChecklistDraft, Connection, Element, Notification, Requisite, RequisiteDraft, Role,
    Schema, Template, Transition, TransitionDraft,
};

/// All tables of the graph store.
///
/// Fields are only reachable from inside the crate so that every mutation
/// goes through an operation that upholds the graph invariants. The parent
/// index is derived data and is rebuilt by [`GraphTables::reindex`] after
/// loading.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphTables {
    #[serde(default)]
    pub(crate) schemas: BTreeMap<SchemaId, Schema>,
    #[serde(default)]
    pub(crate) elements: BTreeMap<ElementId, Element>,
    #[serde(default)]
    pub(crate) connections: BTreeMap<ConnectionId, Connection>,
    #[serde(default)]
    pub(crate) transitions: BTreeMap<TransitionId, Transition>,
    #[serde(default)]
    pub(crate) requisites: BTreeMap<RequisiteId, Requisite>,
    #[serde(default)]
    pub(crate) checklists: BTreeMap<ChecklistId, Checklist>,
    #[serde(default)]
    pub(crate) roles: BTreeMap<RoleId, Role>,
    #[serde(default)]
    pub(crate) notifications: BTreeMap<NotificationId, Notification>,
    #[serde(default)]
    pub(crate) checklist_templates: BTreeMap<TemplateId, Template<ChecklistDraft>>,
    #[serde(default)]
    pub(crate) requisite_templates: BTreeMap<TemplateId, Template<RequisiteDraft>>,
    #[serde(default)]
    pub(crate) transition_templates: BTreeMap<TemplateId, Template<TransitionDraft>>,

    /// parent element -> elements inheriting from it
    #[serde(skip)]
    pub(crate) children: BTreeMap<ElementId, BTreeSet<ElementId>>,
}

impl GraphTables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild derived indexes from the stored rows.
    pub fn reindex(&mut self) {
        self.children.clear();
        for element in self.elements.values() {
            if let Some(parent) = element.parent_id() {
                self.children.entry(parent).or_default().insert(element.id);
            }
        }
    }

    pub fn schema(&self, id: &SchemaId) -> Result<&Schema> {
        self.schemas
            .get(id)
            .ok_or_else(|| Error::not_found(EntityKind::Schema, id))
    }

    pub(crate) fn schema_mut(&mut self, id: &SchemaId) -> Result<&mut Schema> {
        self.schemas
            .get_mut(id)
            .ok_or_else(|| Error::not_found(EntityKind::Schema, id))
    }

    pub fn element(&self, id: &ElementId) -> Result<&Element> {
        self.elements
            .get(id)
            .ok_or_else(|| Error::not_found(EntityKind::Element, id))
    }

    pub(crate) fn element_mut(&mut self, id: &ElementId) -> Result<&mut Element> {
        self.elements
            .get_mut(id)
            .ok_or_else(|| Error::not_found(EntityKind::Element, id))
    }

    pub fn connection(&self, id: &ConnectionId) -> Result<&Connection> {
        self.connections
            .get(id)
            .ok_or_else(|| Error::not_found(EntityKind::Connection, id))
    }

    pub fn schemas(&self) -> impl Iterator<Item = &Schema> {
        self.schemas.values()
    }

    /// Elements of a schema, oldest first.
    pub fn elements_of(&self, schema_id: &SchemaId) -> Vec<&Element> {
        let mut elements: Vec<&Element> = self
            .elements
            .values()
            .filter(|e| &e.schema_id == schema_id)
            .collect();
        elements.sort_by_key(|e| (e.created_at, e.id));
        elements
    }

    /// Connections of a schema, oldest first.
    pub fn connections_of(&self, schema_id: &SchemaId) -> Vec<&Connection> {
        let mut connections: Vec<&Connection> = self
            .connections
            .values()
            .filter(|c| &c.schema_id == schema_id)
            .collect();
        connections.sort_by_key(|c| (c.created_at, c.id));
        connections
    }

    pub fn outgoing(&self, element_id: &ElementId) -> impl Iterator<Item = &Connection> + '_ {
        let element_id = *element_id;
        self.connections
            .values()
            .filter(move |c| c.source_id == element_id)
    }

    pub fn incoming(&self, element_id: &ElementId) -> impl Iterator<Item = &Connection> + '_ {
        let element_id = *element_id;
        self.connections
            .values()
            .filter(move |c| c.target_id == element_id)
    }

    /// Elements whose parent link points at `parent`.
    pub fn children_of(&self, parent: &ElementId) -> Vec<&Element> {
        self.children
            .get(parent)
            .into_iter()
            .flatten()
            .filter_map(|id| self.elements.get(id))
            .collect()
    }

    /// Insert or replace an element, keeping the parent index current.
    pub(crate) fn put_element(&mut self, element: Element) {
        if let Some(previous) = self.elements.get(&element.id) {
            if let Some(old_parent) = previous.parent_id() {
                if let Some(set) = self.children.get_mut(&old_parent) {
                    set.remove(&element.id);
                }
            }
        }
        if let Some(parent) = element.parent_id() {
            self.children.entry(parent).or_default().insert(element.id);
        }
        self.elements.insert(element.id, element);
    }

    pub(crate) fn take_element(&mut self, id: &ElementId) -> Result<Element> {
        let element = self
            .elements
            .remove(id)
            .ok_or_else(|| Error::not_found(EntityKind::Element, id))?;
        if let Some(parent) = element.parent_id() {
            if let Some(set) = self.children.get_mut(&parent) {
                set.remove(id);
            }
        }
        Ok(element)
    }

    /// Whether the element carries a transition that needs an approve/reject
    /// decision after it.
    pub fn has_approval_transition(&self, element_id: &ElementId) -> bool {
        self.owned_by::<Transition>(element_id)
            .iter()
            .any(|t| t.condition.is_approval())
    }

    /// All rows of an element-owned table belonging to one element, in
    /// display order.
    pub fn owned_by<E: OwnedEntity>(&self, element_id: &ElementId) -> Vec<&E> {
        let mut rows: Vec<&E> = E::table(self)
            .values()
            .filter(|row| &row.element_id() == element_id)
            .collect();
        rows.sort_by_key(|row| (row.order(), row.id()));
        rows
    }

    pub fn owned<E: OwnedEntity>(&self, id: &E::Id) -> Result<&E> {
        E::table(self)
            .get(id)
            .ok_or_else(|| Error::not_found(E::KIND, id))
    }

    pub(crate) fn owned_mut<E: OwnedEntity>(&mut self, id: &E::Id) -> Result<&mut E> {
        E::table_mut(self)
            .get_mut(id)
            .ok_or_else(|| Error::not_found(E::KIND, id))
    }

    pub(crate) fn insert_owned<E: OwnedEntity>(&mut self, row: E) {
        E::table_mut(self).insert(row.id(), row);
    }

    pub(crate) fn remove_owned<E: OwnedEntity>(&mut self, id: &E::Id) -> Result<E> {
        E::table_mut(self)
            .remove(id)
            .ok_or_else(|| Error::not_found(E::KIND, id))
    }

    /// Remove every row of one table that belongs to the element.
    pub(crate) fn clear_owned<E: OwnedEntity>(&mut self, element_id: &ElementId) -> usize {
        let table = E::table_mut(self);
        let before = table.len();
        table.retain(|_, row| &row.element_id() != element_id);
        before - table.len()
    }

    /// The order value for a row appended to an element's table.
    pub(crate) fn next_order<E: OwnedEntity>(&self, element_id: &ElementId) -> u32 {
        E::table(self)
            .values()
            .filter(|row| &row.element_id() == element_id)
            .map(|row| row.order() + 1)
            .max()
            .unwrap_or(0)
    }

    pub fn templates<T: TemplateItem>(&self) -> Vec<&Template<T>> {
        let mut templates: Vec<&Template<T>> = T::table(self).values().collect();
        templates.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        templates
    }

    pub fn template<T: TemplateItem>(&self, id: &TemplateId) -> Result<&Template<T>> {
        T::table(self)
            .get(id)
            .ok_or_else(|| Error::not_found(EntityKind::Template, id))
    }
}

/// A table whose rows hang off an element and carry a display order.
pub trait OwnedEntity: Clone + Sized {
    type Id: Ord + Copy + Display;

    const KIND: EntityKind;

    fn id(&self) -> Self::Id;
    fn element_id(&self) -> ElementId;
    fn set_element_id(&mut self, element_id: ElementId);
    fn order(&self) -> u32;
    fn set_order(&mut self, order: u32);
    fn name(&self) -> &str;

    fn table(tables: &GraphTables) -> &BTreeMap<Self::Id, Self>;
    fn table_mut(tables: &mut GraphTables) -> &mut BTreeMap<Self::Id, Self>;
}

macro_rules! owned_entity {
    ($ty:ty, $id:ty, $kind:expr, $field:ident) => {
        impl OwnedEntity for $ty {
            type Id = $id;

            const KIND: EntityKind = $kind;

            fn id(&self) -> $id {
                self.id
            }
            fn element_id(&self) -> ElementId {
                self.element_id
            }
            fn set_element_id(&mut self, element_id: ElementId) {
                self.element_id = element_id;
            }
            fn order(&self) -> u32 {
                self.order
            }
            fn set_order(&mut self, order: u32) {
                self.order = order;
            }
            fn name(&self) -> &str {
                &self.name
            }
            fn table(tables: &GraphTables) -> &BTreeMap<$id, Self> {
                &tables.$field
            }
            fn table_mut(tables: &mut GraphTables) -> &mut BTreeMap<$id, Self> {
                &mut tables.$field
            }
        }
    };
}

owned_entity!(Transition, TransitionId, EntityKind::Transition, transitions);
owned_entity!(Requisite, RequisiteId, EntityKind::Requisite, requisites);
owned_entity!(Checklist, ChecklistId, EntityKind::Checklist, checklists);
owned_entity!(Role, RoleId, EntityKind::Role, roles);
owned_entity!(Notification, NotificationId, EntityKind::Notification, notifications);

/// The draft type stored inside one kind of template.
pub trait TemplateItem: Clone + Sized {
    fn table(tables: &GraphTables) -> &BTreeMap<TemplateId, Template<Self>>;
    fn table_mut(tables: &mut GraphTables) -> &mut BTreeMap<TemplateId, Template<Self>>;
}

impl TemplateItem for ChecklistDraft {
    fn table(tables: &GraphTables) -> &BTreeMap<TemplateId, Template<Self>> {
        &tables.checklist_templates
    }
    fn table_mut(tables: &mut GraphTables) -> &mut BTreeMap<TemplateId, Template<Self>> {
        &mut tables.checklist_templates
    }
}

impl TemplateItem for RequisiteDraft {
    fn table(tables: &GraphTables) -> &BTreeMap<TemplateId, Template<Self>> {
        &tables.requisite_templates
    }
    fn table_mut(tables: &mut GraphTables) -> &mut BTreeMap<TemplateId, Template<Self>> {
        &mut tables.requisite_templates
    }
}

impl TemplateItem for TransitionDraft {
    fn table(tables: &GraphTables) -> &BTreeMap<TemplateId, Template<Self>> {
        &tables.transition_templates
    }
    fn table_mut(tables: &mut GraphTables) -> &mut BTreeMap<TemplateId, Template<Self>> {
        &mut tables.transition_templates
    }
}
