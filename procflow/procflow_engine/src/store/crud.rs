//! Create / list / get / update / delete for every table.
//!
//! Connections are created through the topology gate in
//! [`crate::graph::topology`]; everything else lives here.

use procflow_core::error::{EntityKind, Error, Result};
use procflow_core::id::{
    ApprovalStageId, ChecklistId, ElementId, NotificationId, RequisiteId, RoleId, SchemaId,
    TemplateId, TransitionId,
};
use tracing::debug;

use crate::model::{
    ApprovalStage, ApprovalStageDraft, ApprovalStagePatch, Checklist, ChecklistDraft,
    ChecklistPatch, Element, ElementDraft, ElementPatch, Notification, NotificationDraft,
    NotificationPatch, Requisite, RequisiteDraft, RequisitePatch, Role, RoleDraft, RolePatch,
    Schema, SchemaDraft, SchemaPatch, Template, TemplatePatch, Transition, TransitionDraft,
    TransitionCondition, TransitionPatch, TransitionType,
};
use crate::store::tables::{GraphTables, OwnedEntity, TemplateItem};

impl GraphTables {
    // ----- schemas -----

    pub fn create_schema(&mut self, draft: SchemaDraft) -> Result<Schema> {
        let mut schema = Schema::new(draft.name);
        schema.description = draft.description;
        schema.service_id = draft.service_id;
        schema.is_template = draft.is_template;
        schema.version_label = draft.version_label;

        debug!(schema = %schema.id, name = %schema.name, "schema created");
        self.schemas.insert(schema.id, schema.clone());
        Ok(schema)
    }

    /// Active schemas sorted by name, newest version first.
    pub fn list_schemas(&self) -> Vec<Schema> {
        let mut schemas: Vec<Schema> = self
            .schemas
            .values()
            .filter(|s| s.is_active)
            .cloned()
            .collect();
        schemas.sort_by(|a, b| a.name.cmp(&b.name).then(b.version.cmp(&a.version)));
        schemas
    }

    pub fn update_schema(&mut self, id: &SchemaId, patch: SchemaPatch) -> Result<Schema> {
        let schema = self.schema_mut(id)?;
        if let Some(name) = patch.name {
            schema.name = name;
        }
        if let Some(description) = patch.description {
            schema.description = Some(description);
        }
        if let Some(service_id) = patch.service_id {
            schema.service_id = Some(service_id);
        }
        if let Some(is_template) = patch.is_template {
            schema.is_template = is_template;
        }
        if let Some(label) = patch.version_label {
            schema.version_label = Some(label);
        }
        schema.touch();
        Ok(schema.clone())
    }

    /// Soft delete: the schema stays stored but drops out of listings.
    pub fn delete_schema(&mut self, id: &SchemaId) -> Result<()> {
        let schema = self.schema_mut(id)?;
        schema.is_active = false;
        schema.touch();
        debug!(schema = %id, "schema deactivated");
        Ok(())
    }

    // ----- elements -----

    /// Insert an element without running any augmentation.
    pub fn create_element(&mut self, schema_id: &SchemaId, draft: ElementDraft) -> Result<Element> {
        self.schema(schema_id)?;
        if let Some(parent) = draft.properties.parent_element_id {
            self.element(&parent)?;
        }

        let mut element = Element::new(*schema_id, draft.element_type, draft.name);
        element.description = draft.description;
        element.geometry = draft.geometry;
        element.properties = draft.properties;

        debug!(element = %element.id, kind = %element.element_type, "element created");
        self.put_element(element.clone());
        Ok(element)
    }

    pub fn list_elements(&self, schema_id: &SchemaId) -> Result<Vec<Element>> {
        self.schema(schema_id)?;
        Ok(self.elements_of(schema_id).into_iter().cloned().collect())
    }

    pub fn update_element(&mut self, id: &ElementId, patch: ElementPatch) -> Result<Element> {
        let element = self.element_mut(id)?;
        if let Some(name) = patch.name {
            element.name = name;
        }
        if let Some(description) = patch.description {
            element.description = Some(description);
        }
        if let Some(geometry) = patch.geometry {
            element.geometry = geometry;
        }
        if let Some(extra) = patch.extra_properties {
            element.properties.extra = extra;
        }
        element.touch();
        Ok(element.clone())
    }

    /// Remove an element together with everything attached to it.
    ///
    /// Connections touching the element are left in place.
    pub fn delete_element(&mut self, id: &ElementId) -> Result<Element> {
        let element = self.take_element(id)?;
        self.clear_owned::<Transition>(id);
        self.clear_owned::<Requisite>(id);
        self.clear_owned::<Checklist>(id);
        self.clear_owned::<Role>(id);
        self.clear_owned::<Notification>(id);
        debug!(element = %id, "element deleted");
        Ok(element)
    }

    // ----- transitions -----

    pub fn create_transition(
        &mut self,
        element_id: &ElementId,
        draft: TransitionDraft,
    ) -> Result<Transition> {
        self.element(element_id)?;
        ensure_legal_pair(&draft.condition, &draft.transition_type)?;
        if draft.transition_type == TransitionType::Resolution {
            self.ensure_single_resolution(element_id, None)?;
        }

        let order = self.next_order::<Transition>(element_id);
        let transition = draft.into_transition(*element_id, order);
        self.insert_owned(transition.clone());
        Ok(transition)
    }

    pub fn update_transition(
        &mut self,
        id: &TransitionId,
        patch: TransitionPatch,
    ) -> Result<Transition> {
        let mut updated = self.owned::<Transition>(id)?.clone();
        if let Some(name) = patch.name {
            updated.name = name;
        }
        if let Some(condition) = patch.condition {
            updated.condition = condition;
        }
        if let Some(kind) = patch.transition_type {
            updated.transition_type = kind;
        }
        if let Some(target_state) = patch.target_state {
            updated.target_state = target_state;
        }
        if let Some(is_default) = patch.is_default {
            updated.is_default = is_default;
        }

        ensure_legal_pair(&updated.condition, &updated.transition_type)?;
        if updated.transition_type == TransitionType::Resolution {
            self.ensure_single_resolution(&updated.element_id, Some(id))?;
        }

        self.insert_owned(updated.clone());
        Ok(updated)
    }

    fn ensure_single_resolution(
        &self,
        element_id: &ElementId,
        except: Option<&TransitionId>,
    ) -> Result<()> {
        let taken = self
            .owned_by::<Transition>(element_id)
            .iter()
            .any(|t| t.transition_type == TransitionType::Resolution && Some(&t.id) != except);
        if taken {
            return Err(Error::Conflict(format!(
                "Element {} already has a resolution transition",
                element_id
            )));
        }
        Ok(())
    }

    // ----- requisites -----

    /// Insert a requisite without running any augmentation.
    pub fn create_requisite(
        &mut self,
        element_id: &ElementId,
        draft: RequisiteDraft,
    ) -> Result<Requisite> {
        self.element(element_id)?;
        let order = self.next_order::<Requisite>(element_id);
        let requisite = draft.into_requisite(*element_id, order);
        self.insert_owned(requisite.clone());
        Ok(requisite)
    }

    pub fn update_requisite(&mut self, id: &RequisiteId, patch: &RequisitePatch) -> Result<Requisite> {
        let requisite = self.owned_mut::<Requisite>(id)?;
        patch.apply(requisite);
        Ok(requisite.clone())
    }

    // ----- approval stages -----

    pub fn add_approval_stage(
        &mut self,
        requisite_id: &RequisiteId,
        draft: ApprovalStageDraft,
    ) -> Result<ApprovalStage> {
        let requisite = self.owned_mut::<Requisite>(requisite_id)?;
        let order = requisite
            .approval_stages
            .iter()
            .map(|s| s.order + 1)
            .max()
            .unwrap_or(0);
        let stage = draft.into_stage(*requisite_id, order);
        requisite.approval_stages.push(stage.clone());
        Ok(stage)
    }

    pub fn list_approval_stages(&self, requisite_id: &RequisiteId) -> Result<Vec<ApprovalStage>> {
        let mut stages = self.owned::<Requisite>(requisite_id)?.approval_stages.clone();
        stages.sort_by_key(|s| s.order);
        Ok(stages)
    }

    pub fn update_approval_stage(
        &mut self,
        requisite_id: &RequisiteId,
        stage_id: &ApprovalStageId,
        patch: ApprovalStagePatch,
    ) -> Result<ApprovalStage> {
        let stage = self.stage_mut(requisite_id, stage_id)?;
        if let Some(name) = patch.name {
            stage.name = name;
        }
        if let Some(is_required) = patch.is_required {
            stage.is_required = is_required;
        }
        if let Some(role) = patch.approver_role {
            stage.approver_role = role;
        }
        if let Some(department) = patch.department {
            stage.department = department;
        }
        if let Some(kind) = patch.execution_type {
            stage.execution_type = kind;
        }
        if let Some(days) = patch.deadline_days {
            stage.deadline_days = days;
        }
        Ok(stage.clone())
    }

    pub fn delete_approval_stage(
        &mut self,
        requisite_id: &RequisiteId,
        stage_id: &ApprovalStageId,
    ) -> Result<()> {
        let requisite = self.owned_mut::<Requisite>(requisite_id)?;
        let before = requisite.approval_stages.len();
        requisite.approval_stages.retain(|s| &s.id != stage_id);
        if requisite.approval_stages.len() == before {
            return Err(Error::not_found(EntityKind::ApprovalStage, stage_id));
        }
        Ok(())
    }

    fn stage_mut(
        &mut self,
        requisite_id: &RequisiteId,
        stage_id: &ApprovalStageId,
    ) -> Result<&mut ApprovalStage> {
        self.owned_mut::<Requisite>(requisite_id)?
            .approval_stages
            .iter_mut()
            .find(|s| &s.id == stage_id)
            .ok_or_else(|| Error::not_found(EntityKind::ApprovalStage, stage_id))
    }

    // ----- checklists -----

    pub fn create_checklist(
        &mut self,
        element_id: &ElementId,
        draft: ChecklistDraft,
    ) -> Result<Checklist> {
        self.element(element_id)?;
        let order = self.next_order::<Checklist>(element_id);
        let item = draft.into_checklist(*element_id, order);
        self.insert_owned(item.clone());
        Ok(item)
    }

    pub fn update_checklist(&mut self, id: &ChecklistId, patch: &ChecklistPatch) -> Result<Checklist> {
        let item = self.owned_mut::<Checklist>(id)?;
        patch.apply(item);
        Ok(item.clone())
    }

    // ----- roles -----

    pub fn create_role(&mut self, element_id: &ElementId, draft: RoleDraft) -> Result<Role> {
        self.element(element_id)?;
        self.ensure_unique_role_type(element_id, &draft.role_type, None)?;
        let order = self.next_order::<Role>(element_id);
        let role = draft.into_role(*element_id, order);
        self.insert_owned(role.clone());
        Ok(role)
    }

    pub fn update_role(&mut self, id: &RoleId, patch: RolePatch) -> Result<Role> {
        let mut updated = self.owned::<Role>(id)?.clone();
        patch.apply(&mut updated);
        self.ensure_unique_role_type(&updated.element_id, &updated.role_type, Some(id))?;
        self.insert_owned(updated.clone());
        Ok(updated)
    }

    fn ensure_unique_role_type(
        &self,
        element_id: &ElementId,
        role_type: &str,
        except: Option<&RoleId>,
    ) -> Result<()> {
        let taken = self
            .owned_by::<Role>(element_id)
            .iter()
            .any(|r| r.role_type == role_type && Some(&r.id) != except);
        if taken {
            return Err(Error::Conflict(format!(
                "Role type '{}' is already assigned on element {}",
                role_type, element_id
            )));
        }
        Ok(())
    }

    // ----- notifications -----

    pub fn create_notification(
        &mut self,
        element_id: &ElementId,
        draft: NotificationDraft,
    ) -> Result<Notification> {
        self.element(element_id)?;
        let order = self.next_order::<Notification>(element_id);
        let notification = draft.into_notification(*element_id, order);
        self.insert_owned(notification.clone());
        Ok(notification)
    }

    pub fn update_notification(
        &mut self,
        id: &NotificationId,
        patch: NotificationPatch,
    ) -> Result<Notification> {
        let notification = self.owned_mut::<Notification>(id)?;
        patch.apply(notification);
        Ok(notification.clone())
    }

    // ----- generic element-owned rows -----

    pub fn list_owned<E: OwnedEntity>(&self, element_id: &ElementId) -> Result<Vec<E>> {
        self.element(element_id)?;
        Ok(self.owned_by::<E>(element_id).into_iter().cloned().collect())
    }

    pub fn delete_owned<E: OwnedEntity>(&mut self, id: &E::Id) -> Result<E> {
        self.remove_owned::<E>(id)
    }

    // ----- templates -----

    pub fn create_template<T: TemplateItem>(&mut self, template: Template<T>) -> Result<Template<T>> {
        if T::table(self).contains_key(&template.id) {
            return Err(Error::Conflict(format!(
                "Template {} already exists",
                template.id
            )));
        }
        T::table_mut(self).insert(template.id, template.clone());
        Ok(template)
    }

    pub fn update_template<T: TemplateItem>(
        &mut self,
        id: &TemplateId,
        patch: &TemplatePatch<T>,
    ) -> Result<Template<T>> {
        let template = T::table_mut(self)
            .get_mut(id)
            .ok_or_else(|| Error::not_found(EntityKind::Template, id))?;
        patch.apply(template);
        Ok(template.clone())
    }

    pub fn delete_template<T: TemplateItem>(&mut self, id: &TemplateId) -> Result<()> {
        T::table_mut(self)
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| Error::not_found(EntityKind::Template, id))
    }
}

fn ensure_legal_pair(condition: &TransitionCondition, kind: &TransitionType) -> Result<()> {
    if condition.allows(kind) {
        Ok(())
    } else {
        Err(Error::Conflict(format!(
            "Transition type '{}' cannot be used with condition '{}'",
            kind, condition
        )))
    }
}
