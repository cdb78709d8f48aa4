//! Capturing and applying templates.

use procflow_core::error::Result;
use procflow_core::id::{ElementId, TemplateId};
use tracing::debug;

use crate::model::{
    Checklist, ChecklistDraft, ChecklistTemplate, Requisite, RequisiteDraft, Template, Transition,
    TransitionDraft,
};
use crate::store::GraphTables;

/// Save the element's current checklist as a new template.
pub fn create_checklist_template_from_element(
    tables: &mut GraphTables,
    element_id: &ElementId,
    name: &str,
) -> Result<ChecklistTemplate> {
    let items: Vec<ChecklistDraft> = tables
        .list_owned::<Checklist>(element_id)?
        .iter()
        .map(ChecklistDraft::from)
        .collect();
    tables.create_template(Template::new(name, items))
}

pub fn apply_checklist_template(
    tables: &mut GraphTables,
    template_id: &TemplateId,
    element_id: &ElementId,
) -> Result<Vec<Checklist>> {
    let items = tables.template::<ChecklistDraft>(template_id)?.items.clone();
    tables.element(element_id)?;
    let created = items
        .into_iter()
        .map(|draft| tables.create_checklist(element_id, draft))
        .collect::<Result<Vec<_>>>()?;
    debug!(template = %template_id, element = %element_id, items = created.len(), "checklist template applied");
    Ok(created)
}

pub fn apply_requisite_template(
    tables: &mut GraphTables,
    template_id: &TemplateId,
    element_id: &ElementId,
) -> Result<Vec<Requisite>> {
    let items = tables.template::<RequisiteDraft>(template_id)?.items.clone();
    tables.element(element_id)?;
    let created = items
        .into_iter()
        .map(|draft| tables.create_requisite(element_id, draft))
        .collect::<Result<Vec<_>>>()?;
    debug!(template = %template_id, element = %element_id, items = created.len(), "requisite template applied");
    Ok(created)
}

/// Apply a transition template. The usual transition rules hold, so a
/// template that would give the element a second resolution transition
/// fails as a whole.
pub fn apply_transition_template(
    tables: &mut GraphTables,
    template_id: &TemplateId,
    element_id: &ElementId,
) -> Result<Vec<Transition>> {
    let items = tables.template::<TransitionDraft>(template_id)?.items.clone();
    tables.element(element_id)?;
    let created = items
        .into_iter()
        .map(|draft| tables.create_transition(element_id, draft))
        .collect::<Result<Vec<_>>>()?;
    debug!(template = %template_id, element = %element_id, items = created.len(), "transition template applied");
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ElementDraft, ElementType, SchemaDraft, TransitionTemplate};
    use crate::store::OwnedEntity;
    use procflow_core::error::Error;

    fn process(tables: &mut GraphTables, name: &str) -> ElementId {
        let schema = tables.create_schema(SchemaDraft::named("Templates")).unwrap().id;
        tables
            .create_element(&schema, ElementDraft::new(ElementType::Process, name))
            .unwrap()
            .id
    }

    #[test]
    fn test_capture_and_apply_checklist() {
        let mut tables = GraphTables::new();
        let source = process(&mut tables, "Intake");
        let target = process(&mut tables, "Archive");
        tables.create_checklist(&source, ChecklistDraft::named("Passport")).unwrap();
        tables.create_checklist(&source, ChecklistDraft::named("Diploma")).unwrap();

        let template = create_checklist_template_from_element(&mut tables, &source, "Docs").unwrap();
        assert_eq!(template.items.len(), 2);

        let applied = apply_checklist_template(&mut tables, &template.id, &target).unwrap();
        let names: Vec<&str> = applied.iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["Passport", "Diploma"]);
        assert!(applied.iter().all(|c| !c.meta.inherited));
        assert_eq!(applied[1].order, 1);
    }

    #[test]
    fn test_apply_requisite_template_has_no_markers() {
        let mut tables = GraphTables::new();
        let element = process(&mut tables, "Intake");
        let mut draft = RequisiteDraft::new("Amount", "number");
        draft.validation.insert("inherited".into(), true.into());
        let template = tables
            .create_template(Template::new("Money", vec![draft]))
            .unwrap();

        let applied = apply_requisite_template(&mut tables, &template.id, &element).unwrap();
        assert_eq!(applied.len(), 1);
        assert!(!applied[0].validation.inherited);
    }

    #[test]
    fn test_transition_template_respects_resolution_rule() {
        let mut tables = GraphTables::new();
        let element = process(&mut tables, "Close");
        let template: TransitionTemplate = Template::new(
            "Close twice",
            vec![
                TransitionDraft::new("Close", "filled", "resolution"),
                TransitionDraft::new("Close again", "approved", "resolution"),
            ],
        );
        let template = tables.create_template(template).unwrap();

        let err = apply_transition_template(&mut tables, &template.id, &element).unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[test]
    fn test_unknown_template() {
        let mut tables = GraphTables::new();
        let element = process(&mut tables, "Intake");
        let err = apply_checklist_template(&mut tables, &TemplateId::new(), &element).unwrap_err();
        assert!(err.is_not_found());
    }
}
