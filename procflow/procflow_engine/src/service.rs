//! Authorized access to the engine.
//!
//! [`ProcessService`] is the one entry point for callers. Every mutating
//! call passes the access guard once and then runs as a single write on the
//! store, so the primary edit, its automatic graph extensions and any
//! cascade commit together or not at all. Reads go through the guard's read
//! check and take the shared lock.

use procflow_core::auth::AccessGuard;
use procflow_core::error::Result;
use procflow_core::id::{
    ApprovalStageId, ChecklistId, ConnectionId, ElementId, NotificationId, PrintFormId,
    RequisiteId, RoleId, SchemaId, TemplateId, TransitionId,
};
use procflow_core::utils::LayoutConfig;
use tracing::debug;

use crate::augment::{self, update_transition_with_graph_adjust};
use crate::inherit::{self, Cascade};
use crate::lifecycle::{self, PublishOutcome};
use crate::model::{
    ApprovalStage, ApprovalStageDraft, ApprovalStagePatch, Checklist, ChecklistDraft,
    ChecklistPatch, ChecklistTemplate, Connection, ConnectionDraft, ConnectionPatch, Element,
    ElementDraft, ElementPatch, Notification, NotificationDraft, NotificationPatch, PrintForm,
    PrintFormDraft, PrintFormPatch, Requisite, RequisiteDraft, RequisitePatch, Role, RoleDraft,
    RolePatch, Schema, SchemaDraft, SchemaPatch, Template, TemplatePatch, Transition,
    TransitionDraft, TransitionPatch,
};
use crate::ordering;
use crate::store::{GraphStore, GraphTables, OwnedEntity, TemplateItem};
use crate::validation::{self, ValidationReport};

/// The guarded façade over a [`GraphStore`].
pub struct ProcessService<S> {
    store: S,
    guard: AccessGuard,
    layout: LayoutConfig,
}

impl<S: GraphStore> ProcessService<S> {
    /// Create a new service.
    ///
    /// # Arguments
    ///
    /// * `store` - Where the graph lives.
    /// * `guard` - The access check applied to every call.
    /// * `layout` - Placement of elements the engine creates itself.
    pub fn new(store: S, guard: AccessGuard, layout: LayoutConfig) -> Self {
        Self {
            store,
            guard,
            layout,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn mutate<R, F>(&self, operation: &str, f: F) -> Result<R>
    where
        F: FnOnce(&mut GraphTables, &LayoutConfig) -> Result<R>,
    {
        let caller = self.guard.authorize_write(operation)?;
        debug!(user = %caller.user_id, operation, "write");
        let layout = &self.layout;
        self.store.write(|tables| f(tables, layout))
    }

    fn query<R, F>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&GraphTables) -> Result<R>,
    {
        self.guard.authorize_read()?;
        self.store.read(f)
    }

    // ----- schemas -----

    pub fn create_schema(&self, draft: SchemaDraft) -> Result<Schema> {
        self.mutate("create_schema", |t, _| t.create_schema(draft))
    }

    pub fn list_schemas(&self) -> Result<Vec<Schema>> {
        self.query(|t| Ok(t.list_schemas()))
    }

    pub fn get_schema(&self, id: &SchemaId) -> Result<Schema> {
        self.query(|t| t.schema(id).cloned())
    }

    pub fn update_schema(&self, id: &SchemaId, patch: SchemaPatch) -> Result<Schema> {
        self.mutate("update_schema", |t, _| t.update_schema(id, patch))
    }

    /// Deactivate a schema. Its rows stay in the store.
    pub fn delete_schema(&self, id: &SchemaId) -> Result<()> {
        self.mutate("delete_schema", |t, _| t.delete_schema(id))
    }

    // ----- elements -----

    /// Create an element. A new PROCESS gets a decision placed after it.
    pub fn create_element(&self, schema_id: &SchemaId, draft: ElementDraft) -> Result<Element> {
        self.mutate("create_element", |t, layout| {
            let element = t.create_element(schema_id, draft)?;
            augment::on_element_created(t, &element, layout);
            Ok(element)
        })
    }

    pub fn list_elements(&self, schema_id: &SchemaId) -> Result<Vec<Element>> {
        self.query(|t| t.list_elements(schema_id))
    }

    pub fn get_element(&self, id: &ElementId) -> Result<Element> {
        self.query(|t| t.element(id).cloned())
    }

    pub fn update_element(&self, id: &ElementId, patch: ElementPatch) -> Result<Element> {
        self.mutate("update_element", |t, _| t.update_element(id, patch))
    }

    pub fn delete_element(&self, id: &ElementId) -> Result<Element> {
        self.mutate("delete_element", |t, _| t.delete_element(id))
    }

    // ----- connections -----

    pub fn create_connection(
        &self,
        schema_id: &SchemaId,
        draft: ConnectionDraft,
    ) -> Result<Connection> {
        self.mutate("create_connection", |t, _| t.create_connection(schema_id, draft))
    }

    pub fn list_connections(&self, schema_id: &SchemaId) -> Result<Vec<Connection>> {
        self.query(|t| t.list_connections(schema_id))
    }

    pub fn update_connection(
        &self,
        id: &ConnectionId,
        patch: ConnectionPatch,
    ) -> Result<Connection> {
        self.mutate("update_connection", |t, _| t.update_connection(id, patch))
    }

    pub fn delete_connection(&self, id: &ConnectionId) -> Result<Connection> {
        self.mutate("delete_connection", |t, _| t.delete_connection(id))
    }

    // ----- element-owned rows -----

    pub fn list_owned<E: OwnedEntity>(&self, element_id: &ElementId) -> Result<Vec<E>> {
        self.query(|t| t.list_owned::<E>(element_id))
    }

    pub fn get_owned<E: OwnedEntity>(&self, id: &E::Id) -> Result<E> {
        self.query(|t| t.owned::<E>(id).cloned())
    }

    pub fn delete_owned<E: OwnedEntity>(&self, id: &E::Id) -> Result<E> {
        let operation = format!("delete {}", E::KIND);
        self.mutate(&operation, |t, _| t.delete_owned::<E>(id))
    }

    /// Create a transition. An `approved_or_rejected` transition gets a
    /// decision placed after its element.
    pub fn create_transition(
        &self,
        element_id: &ElementId,
        draft: TransitionDraft,
    ) -> Result<Transition> {
        self.mutate("create_transition", |t, layout| {
            let transition = t.create_transition(element_id, draft)?;
            augment::on_transition_saved(t, &transition, layout);
            Ok(transition)
        })
    }

    pub fn update_transition(
        &self,
        id: &TransitionId,
        patch: TransitionPatch,
    ) -> Result<Transition> {
        self.update_transition_with_graph_adjust(id, patch, false)
    }

    /// Update a transition, optionally removing the decision links around
    /// its element when it stops being an approve-or-reject transition.
    pub fn update_transition_with_graph_adjust(
        &self,
        id: &TransitionId,
        patch: TransitionPatch,
        adjust_decision_links: bool,
    ) -> Result<Transition> {
        self.mutate("update_transition", |t, layout| {
            update_transition_with_graph_adjust(t, id, patch, adjust_decision_links, layout)
        })
    }

    /// Create a requisite. An approval requisite marks its element and gets
    /// a decision placed after it.
    pub fn create_requisite(
        &self,
        element_id: &ElementId,
        draft: RequisiteDraft,
    ) -> Result<Requisite> {
        self.mutate("create_requisite", |t, layout| {
            let requisite = t.create_requisite(element_id, draft)?;
            augment::on_requisite_added(t, &requisite, layout);
            Ok(requisite)
        })
    }

    pub fn update_requisite(&self, id: &RequisiteId, patch: RequisitePatch) -> Result<Requisite> {
        self.mutate("update_requisite", |t, _| t.update_requisite(id, &patch))
    }

    pub fn add_approval_stage(
        &self,
        requisite_id: &RequisiteId,
        draft: ApprovalStageDraft,
    ) -> Result<ApprovalStage> {
        self.mutate("add_approval_stage", |t, _| t.add_approval_stage(requisite_id, draft))
    }

    pub fn list_approval_stages(&self, requisite_id: &RequisiteId) -> Result<Vec<ApprovalStage>> {
        self.query(|t| t.list_approval_stages(requisite_id))
    }

    pub fn update_approval_stage(
        &self,
        requisite_id: &RequisiteId,
        stage_id: &ApprovalStageId,
        patch: ApprovalStagePatch,
    ) -> Result<ApprovalStage> {
        self.mutate("update_approval_stage", |t, _| {
            t.update_approval_stage(requisite_id, stage_id, patch)
        })
    }

    pub fn delete_approval_stage(
        &self,
        requisite_id: &RequisiteId,
        stage_id: &ApprovalStageId,
    ) -> Result<()> {
        self.mutate("delete_approval_stage", |t, _| {
            t.delete_approval_stage(requisite_id, stage_id)
        })
    }

    pub fn create_checklist(
        &self,
        element_id: &ElementId,
        draft: ChecklistDraft,
    ) -> Result<Checklist> {
        self.mutate("create_checklist", |t, _| t.create_checklist(element_id, draft))
    }

    pub fn update_checklist(&self, id: &ChecklistId, patch: ChecklistPatch) -> Result<Checklist> {
        self.mutate("update_checklist", |t, _| t.update_checklist(id, &patch))
    }

    pub fn create_role(&self, element_id: &ElementId, draft: RoleDraft) -> Result<Role> {
        self.mutate("create_role", |t, _| t.create_role(element_id, draft))
    }

    pub fn update_role(&self, id: &RoleId, patch: RolePatch) -> Result<Role> {
        self.mutate("update_role", |t, _| t.update_role(id, patch))
    }

    pub fn create_notification(
        &self,
        element_id: &ElementId,
        draft: NotificationDraft,
    ) -> Result<Notification> {
        self.mutate("create_notification", |t, _| {
            t.create_notification(element_id, draft)
        })
    }

    pub fn update_notification(
        &self,
        id: &NotificationId,
        patch: NotificationPatch,
    ) -> Result<Notification> {
        self.mutate("update_notification", |t, _| t.update_notification(id, patch))
    }

    // ----- templates -----

    pub fn list_templates<T: TemplateItem>(&self) -> Result<Vec<Template<T>>> {
        self.query(|t| Ok(t.templates::<T>().into_iter().cloned().collect()))
    }

    pub fn get_template<T: TemplateItem>(&self, id: &TemplateId) -> Result<Template<T>> {
        self.query(|t| t.template::<T>(id).cloned())
    }

    pub fn create_template<T: TemplateItem>(&self, template: Template<T>) -> Result<Template<T>> {
        self.mutate("create_template", |t, _| t.create_template(template))
    }

    pub fn update_template<T: TemplateItem>(
        &self,
        id: &TemplateId,
        patch: TemplatePatch<T>,
    ) -> Result<Template<T>> {
        self.mutate("update_template", |t, _| t.update_template(id, &patch))
    }

    pub fn delete_template<T: TemplateItem>(&self, id: &TemplateId) -> Result<()> {
        self.mutate("delete_template", |t, _| t.delete_template::<T>(id))
    }

    pub fn create_checklist_template_from_element(
        &self,
        element_id: &ElementId,
        name: &str,
    ) -> Result<ChecklistTemplate> {
        self.mutate("create_checklist_template", |t, _| {
            inherit::create_checklist_template_from_element(t, element_id, name)
        })
    }

    pub fn apply_checklist_template(
        &self,
        template_id: &TemplateId,
        element_id: &ElementId,
    ) -> Result<Vec<Checklist>> {
        self.mutate("apply_checklist_template", |t, _| {
            inherit::apply_checklist_template(t, template_id, element_id)
        })
    }

    pub fn apply_requisite_template(
        &self,
        template_id: &TemplateId,
        element_id: &ElementId,
    ) -> Result<Vec<Requisite>> {
        self.mutate("apply_requisite_template", |t, layout| {
            let created = inherit::apply_requisite_template(t, template_id, element_id)?;
            for requisite in &created {
                augment::on_requisite_added(t, requisite, layout);
            }
            Ok(created)
        })
    }

    pub fn apply_transition_template(
        &self,
        template_id: &TemplateId,
        element_id: &ElementId,
    ) -> Result<Vec<Transition>> {
        self.mutate("apply_transition_template", |t, layout| {
            let created = inherit::apply_transition_template(t, template_id, element_id)?;
            for transition in &created {
                augment::on_transition_saved(t, transition, layout);
            }
            Ok(created)
        })
    }

    // ----- validation and lifecycle -----

    pub fn validate(&self, schema_id: &SchemaId) -> Result<ValidationReport> {
        self.query(|t| validation::validate(t, schema_id))
    }

    pub fn bump_version(&self, schema_id: &SchemaId) -> Result<Schema> {
        self.mutate("bump_version", |t, _| lifecycle::bump_version(t, schema_id))
    }

    /// Publish a schema.
    ///
    /// # Arguments
    ///
    /// * `schema_id` - The schema to publish.
    /// * `unpublish_others` - Unpublish every other published version of the
    ///   same family first.
    ///
    /// # Returns
    ///
    /// * `Ok(PublishOutcome)` - The published schema and validation warnings.
    /// * `Err(Error::ValidationFailed)` - The graph has blocking errors; the
    ///   schema stays unpublished.
    pub fn publish(&self, schema_id: &SchemaId, unpublish_others: bool) -> Result<PublishOutcome> {
        self.mutate("publish", |t, _| {
            lifecycle::publish(t, schema_id, unpublish_others)
        })
    }

    pub fn unpublish(&self, schema_id: &SchemaId) -> Result<Schema> {
        self.mutate("unpublish", |t, _| lifecycle::unpublish(t, schema_id))
    }

    pub fn list_versions(&self, schema_id: &SchemaId) -> Result<Vec<Schema>> {
        self.query(|t| lifecycle::list_versions(t, schema_id))
    }

    pub fn copy_schema(&self, schema_id: &SchemaId, new_name: Option<&str>) -> Result<Schema> {
        self.mutate("copy_schema", |t, _| {
            lifecycle::copy_schema(t, schema_id, new_name)
        })
    }

    pub fn create_new_version(
        &self,
        schema_id: &SchemaId,
        version_label: Option<&str>,
    ) -> Result<Schema> {
        self.mutate("create_new_version", |t, _| {
            lifecycle::create_new_version(t, schema_id, version_label)
        })
    }

    // ----- inheritance -----

    pub fn copy_element(&self, element_id: &ElementId) -> Result<Element> {
        self.mutate("copy_element", |t, layout| {
            inherit::copy_element(t, element_id, layout)
        })
    }

    pub fn inherit_element(&self, parent_id: &ElementId) -> Result<Element> {
        self.mutate("inherit_element", |t, layout| {
            inherit::inherit_element(t, parent_id, layout)
        })
    }

    pub fn list_children(&self, parent_id: &ElementId) -> Result<Vec<Element>> {
        self.query(|t| inherit::list_children(t, parent_id))
    }

    pub fn sync_children_from_parent(&self, parent_id: &ElementId) -> Result<Vec<Element>> {
        self.mutate("sync_children_from_parent", |t, _| {
            inherit::sync_children_from_parent(t, parent_id)
        })
    }

    pub fn update_requisite_cascade(
        &self,
        parent_id: &ElementId,
        requisite_id: &RequisiteId,
        patch: RequisitePatch,
    ) -> Result<Cascade<Requisite>> {
        self.mutate("update_requisite_cascade", |t, _| {
            inherit::update_requisite_cascade(t, parent_id, requisite_id, &patch)
        })
    }

    pub fn delete_requisite_cascade(
        &self,
        parent_id: &ElementId,
        requisite_id: &RequisiteId,
    ) -> Result<Cascade<Requisite>> {
        self.mutate("delete_requisite_cascade", |t, _| {
            inherit::delete_requisite_cascade(t, parent_id, requisite_id)
        })
    }

    pub fn update_checklist_cascade(
        &self,
        parent_id: &ElementId,
        checklist_id: &ChecklistId,
        patch: ChecklistPatch,
    ) -> Result<Cascade<Checklist>> {
        self.mutate("update_checklist_cascade", |t, _| {
            inherit::update_checklist_cascade(t, parent_id, checklist_id, &patch)
        })
    }

    pub fn delete_checklist_cascade(
        &self,
        parent_id: &ElementId,
        checklist_id: &ChecklistId,
    ) -> Result<Cascade<Checklist>> {
        self.mutate("delete_checklist_cascade", |t, _| {
            inherit::delete_checklist_cascade(t, parent_id, checklist_id)
        })
    }

    pub fn break_requisite_inheritance(&self, requisite_id: &RequisiteId) -> Result<Requisite> {
        self.mutate("break_requisite_inheritance", |t, _| {
            inherit::break_requisite_inheritance(t, requisite_id)
        })
    }

    pub fn break_checklist_inheritance(&self, checklist_id: &ChecklistId) -> Result<Checklist> {
        self.mutate("break_checklist_inheritance", |t, _| {
            inherit::break_checklist_inheritance(t, checklist_id)
        })
    }

    pub fn list_previous_processes(&self, element_id: &ElementId) -> Result<Vec<Element>> {
        self.query(|t| inherit::list_previous_processes(t, element_id))
    }

    pub fn inherit_requisites_from(
        &self,
        source: &ElementId,
        target: &ElementId,
    ) -> Result<Vec<Requisite>> {
        self.mutate("inherit_requisites_from", |t, _| {
            inherit::inherit_requisites_from(t, source, target)
        })
    }

    pub fn inherit_checklists_from(
        &self,
        source: &ElementId,
        target: &ElementId,
    ) -> Result<Vec<Checklist>> {
        self.mutate("inherit_checklists_from", |t, _| {
            inherit::inherit_checklists_from(t, source, target)
        })
    }

    // ----- print forms -----

    pub fn list_print_forms(&self, element_id: &ElementId) -> Result<Vec<PrintForm>> {
        self.query(|t| inherit::list_print_forms(t, element_id))
    }

    pub fn add_print_form(&self, element_id: &ElementId, draft: PrintFormDraft) -> Result<PrintForm> {
        self.mutate("add_print_form", |t, _| {
            inherit::add_print_form(t, element_id, draft)
        })
    }

    pub fn update_print_form(
        &self,
        element_id: &ElementId,
        form_id: &PrintFormId,
        patch: PrintFormPatch,
    ) -> Result<PrintForm> {
        self.mutate("update_print_form", |t, _| {
            inherit::update_print_form(t, element_id, form_id, &patch)
        })
    }

    pub fn remove_print_form(&self, element_id: &ElementId, form_id: &PrintFormId) -> Result<PrintForm> {
        self.mutate("remove_print_form", |t, _| {
            inherit::remove_print_form(t, element_id, form_id)
        })
    }

    pub fn inherit_print_forms(&self, from: &ElementId, to: &ElementId) -> Result<Vec<PrintForm>> {
        self.mutate("inherit_print_forms", |t, _| {
            inherit::inherit_print_forms(t, from, to)
        })
    }

    pub fn copy_print_form(
        &self,
        from: &ElementId,
        form_id: &PrintFormId,
        to: &ElementId,
    ) -> Result<PrintForm> {
        self.mutate("copy_print_form", |t, _| {
            inherit::copy_print_form(t, from, form_id, to)
        })
    }

    pub fn break_print_form_inheritance(
        &self,
        element_id: &ElementId,
        form_id: &PrintFormId,
    ) -> Result<PrintForm> {
        self.mutate("break_print_form_inheritance", |t, _| {
            inherit::break_print_form_inheritance(t, element_id, form_id)
        })
    }

    // ----- ordering -----

    /// Reorder an element's requisites, checklists, transitions, roles or
    /// notifications. `ids` must list every current row exactly once.
    pub fn reorder<E: OwnedEntity>(&self, element_id: &ElementId, ids: &[E::Id]) -> Result<Vec<E>> {
        let operation = format!("reorder {}", E::KIND);
        self.mutate(&operation, |t, _| ordering::reorder::<E>(t, element_id, ids))
    }

    pub fn reorder_print_forms(
        &self,
        element_id: &ElementId,
        ids: &[PrintFormId],
    ) -> Result<Vec<PrintForm>> {
        self.mutate("reorder_print_forms", |t, _| {
            ordering::reorder_print_forms(t, element_id, ids)
        })
    }
}
