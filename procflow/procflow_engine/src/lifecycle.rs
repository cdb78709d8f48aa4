//! Publishing and versioning of schemas.

use std::collections::BTreeMap;

use chrono::Utc;
use procflow_core::error::{Error, Result};
use procflow_core::id::{ConnectionId, ElementId, SchemaId};
use serde::Serialize;
use tracing::info;

use crate::inherit::cascade::Inheritable;
use crate::inherit::copy::{clone_element, ElementCopy, COPY_SUFFIX};
use crate::model::{Checklist, Connection, Geometry, Requisite, Schema};
use crate::store::{GraphTables, OwnedEntity};
use crate::validation::validate;

/// A published schema together with the non-blocking issues found while
/// validating it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishOutcome {
    pub schema: Schema,
    pub warnings: Vec<String>,
}

pub fn bump_version(tables: &mut GraphTables, schema_id: &SchemaId) -> Result<Schema> {
    let schema = tables.schema_mut(schema_id)?;
    schema.version += 1;
    schema.touch();
    info!(schema = %schema_id, version = schema.version, "version bumped");
    Ok(schema.clone())
}

/// Validate and publish a schema.
///
/// An invalid graph is refused with [`Error::ValidationFailed`] and the
/// schema is left untouched. With `unpublish_others`, every other published
/// member of the version family is unpublished first.
pub fn publish(
    tables: &mut GraphTables,
    schema_id: &SchemaId,
    unpublish_others: bool,
) -> Result<PublishOutcome> {
    let report = validate(tables, schema_id)?;
    if !report.is_valid {
        info!(schema = %schema_id, errors = report.errors.len(), "publish refused");
        return Err(Error::ValidationFailed(report.errors));
    }

    if unpublish_others {
        let family = tables.schema(schema_id)?.family();
        for other in tables.schemas.values_mut() {
            if &other.id != schema_id
                && other.is_active
                && other.is_published
                && other.in_family(&family)
            {
                other.is_published = false;
                other.touch();
                info!(schema = %other.id, version = other.version, "unpublished sibling version");
            }
        }
    }

    let schema = tables.schema_mut(schema_id)?;
    schema.is_published = true;
    schema.touch();
    info!(schema = %schema_id, version = schema.version, "schema published");

    Ok(PublishOutcome {
        schema: schema.clone(),
        warnings: report.warnings,
    })
}

pub fn unpublish(tables: &mut GraphTables, schema_id: &SchemaId) -> Result<Schema> {
    let schema = tables.schema_mut(schema_id)?;
    schema.is_published = false;
    schema.touch();
    info!(schema = %schema_id, "schema unpublished");
    Ok(schema.clone())
}

/// Active members of the schema's version family, newest first.
pub fn list_versions(tables: &GraphTables, schema_id: &SchemaId) -> Result<Vec<Schema>> {
    let family = tables.schema(schema_id)?.family();
    let mut versions: Vec<Schema> = tables
        .schemas()
        .filter(|s| s.is_active && s.in_family(&family))
        .cloned()
        .collect();
    versions.sort_by(|a, b| {
        b.version
            .cmp(&a.version)
            .then(b.created_at.cmp(&a.created_at))
    });
    Ok(versions)
}

/// Deep-copy a schema into a new, unpublished schema at version 1.
pub fn copy_schema(
    tables: &mut GraphTables,
    schema_id: &SchemaId,
    new_name: Option<&str>,
) -> Result<Schema> {
    let source = tables.schema(schema_id)?.clone();
    let mut copy = Schema::new(
        new_name
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}{}", source.name, COPY_SUFFIX)),
    );
    copy.description = source.description.clone();
    copy.service_id = source.service_id.clone();
    copy.is_template = source.is_template;

    let copy_id = copy.id;
    tables.schemas.insert(copy_id, copy);
    copy_graph(tables, schema_id, &copy_id)?;

    info!(source = %schema_id, copy = %copy_id, "schema copied");
    tables.schema(&copy_id).cloned()
}

/// Copy a schema into the same version family as the next version.
pub fn create_new_version(
    tables: &mut GraphTables,
    schema_id: &SchemaId,
    version_label: Option<&str>,
) -> Result<Schema> {
    let source = tables.schema(schema_id)?.clone();
    let family = source.family();
    let latest = tables
        .schemas()
        .filter(|s| s.in_family(&family))
        .map(|s| s.version)
        .max()
        .unwrap_or(source.version);

    let mut next = Schema::new(source.name.clone());
    next.description = source.description.clone();
    next.service_id = source.service_id.clone();
    next.is_template = source.is_template;
    next.version = latest + 1;
    next.version_label = version_label.map(str::to_string);

    let next_id = next.id;
    tables.schemas.insert(next_id, next);
    copy_graph(tables, schema_id, &next_id)?;

    info!(source = %schema_id, schema = %next_id, version = latest + 1, "new version created");
    tables.schema(&next_id).cloned()
}

/// Copy every element and connection of one schema into another, remapping
/// ids. Parent links and inheritance markers that point inside the source
/// schema are redirected to the copies.
fn copy_graph(tables: &mut GraphTables, from: &SchemaId, to: &SchemaId) -> Result<()> {
    let sources: Vec<(ElementId, String, Geometry)> = tables
        .elements_of(from)
        .iter()
        .map(|e| (e.id, e.name.clone(), e.geometry))
        .collect();

    let mut remap: BTreeMap<ElementId, ElementId> = BTreeMap::new();
    for (id, name, geometry) in sources {
        let copy = clone_element(
            tables,
            &id,
            ElementCopy {
                schema_id: *to,
                name,
                geometry,
                marker: None,
                keep_parent_link: true,
            },
        )?;
        remap.insert(id, copy.id);
    }

    for new_id in remap.values() {
        let mut element = tables.element(new_id)?.clone();
        if let Some(mapped) = element.parent_id().and_then(|p| remap.get(&p)) {
            element.properties.parent_element_id = Some(*mapped);
        }
        for form in &mut element.properties.print_forms {
            form.meta.redirect(&remap);
        }
        if let Some(mirror) = element.properties.print_form.as_mut() {
            mirror.meta.redirect(&remap);
        }
        tables.put_element(element);

        redirect_markers::<Requisite>(tables, new_id, &remap)?;
        redirect_markers::<Checklist>(tables, new_id, &remap)?;
    }

    let connections: Vec<Connection> = tables.connections_of(from).into_iter().cloned().collect();
    for connection in connections {
        let (Some(source), Some(target)) =
            (remap.get(&connection.source_id), remap.get(&connection.target_id))
        else {
            continue;
        };
        let mut copy = connection.clone();
        copy.id = ConnectionId::new();
        copy.schema_id = *to;
        copy.source_id = *source;
        copy.target_id = *target;
        copy.created_at = Utc::now();
        tables.connections.insert(copy.id, copy);
    }
    Ok(())
}

fn redirect_markers<E: Inheritable>(
    tables: &mut GraphTables,
    element_id: &ElementId,
    remap: &BTreeMap<ElementId, ElementId>,
) -> Result<()> {
    let ids: Vec<E::Id> = tables.owned_by::<E>(element_id).iter().map(|r| r.id()).collect();
    for id in ids {
        tables.owned_mut::<E>(&id)?.markers_mut().redirect(remap);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inherit::{inherit_element, update_requisite_cascade};
    use crate::model::{
        ConnectionDraft, ElementDraft, ElementType, RequisiteDraft, RequisitePatch, SchemaDraft,
    };
    use procflow_core::utils::LayoutConfig;

    fn valid_schema(tables: &mut GraphTables, name: &str) -> SchemaId {
        let schema = tables.create_schema(SchemaDraft::named(name)).unwrap().id;
        let start = tables
            .create_element(&schema, ElementDraft::new(ElementType::Start, "Start"))
            .unwrap();
        let end = tables
            .create_element(&schema, ElementDraft::new(ElementType::End, "End"))
            .unwrap();
        tables
            .create_connection(&schema, ConnectionDraft::new(start.id, end.id))
            .unwrap();
        schema
    }

    #[test]
    fn test_publish_invalid_is_refused() {
        let mut tables = GraphTables::new();
        let schema = tables.create_schema(SchemaDraft::named("Empty")).unwrap().id;

        let err = publish(&mut tables, &schema, false).unwrap_err();
        assert!(matches!(err, Error::ValidationFailed(ref errors) if errors.len() == 2));
        assert!(!tables.schema(&schema).unwrap().is_published);
    }

    #[test]
    fn test_publish_unpublishes_family() {
        let mut tables = GraphTables::new();
        let v1 = valid_schema(&mut tables, "Leave");
        publish(&mut tables, &v1, false).unwrap();

        let v2 = create_new_version(&mut tables, &v1, Some("spring")).unwrap();
        assert_eq!(v2.version, 2);
        assert!(!v2.is_published);

        let outcome = publish(&mut tables, &v2.id, true).unwrap();
        assert!(outcome.schema.is_published);
        assert!(outcome.warnings.is_empty());
        assert!(!tables.schema(&v1).unwrap().is_published);
    }

    #[test]
    fn test_publish_keeps_others_by_default() {
        let mut tables = GraphTables::new();
        let v1 = valid_schema(&mut tables, "Leave");
        publish(&mut tables, &v1, false).unwrap();
        let v2 = create_new_version(&mut tables, &v1, None).unwrap();
        publish(&mut tables, &v2.id, false).unwrap();
        assert!(tables.schema(&v1).unwrap().is_published);
    }

    #[test]
    fn test_list_versions_newest_first() {
        let mut tables = GraphTables::new();
        let v1 = valid_schema(&mut tables, "Leave");
        let v2 = create_new_version(&mut tables, &v1, None).unwrap();
        let v3 = create_new_version(&mut tables, &v1, None).unwrap();
        assert_eq!(v3.version, 3);
        valid_schema(&mut tables, "Other");

        tables.delete_schema(&v2.id).unwrap();
        let versions: Vec<u32> = list_versions(&tables, &v1)
            .unwrap()
            .iter()
            .map(|s| s.version)
            .collect();
        assert_eq!(versions, vec![3, 1]);
    }

    #[test]
    fn test_bump_and_unpublish() {
        let mut tables = GraphTables::new();
        let schema = valid_schema(&mut tables, "Leave");
        assert_eq!(bump_version(&mut tables, &schema).unwrap().version, 2);
        publish(&mut tables, &schema, false).unwrap();
        assert!(!unpublish(&mut tables, &schema).unwrap().is_published);
    }

    #[test]
    fn test_copy_schema_remaps_graph() {
        let mut tables = GraphTables::new();
        let schema = valid_schema(&mut tables, "Leave");
        let process = tables
            .create_element(&schema, ElementDraft::new(ElementType::Process, "Review"))
            .unwrap();
        tables
            .create_requisite(&process.id, RequisiteDraft::new("Reason", "text"))
            .unwrap();
        let mut child = ElementDraft::new(ElementType::Process, "Review child");
        child.properties.parent_element_id = Some(process.id);
        tables.create_element(&schema, child).unwrap();

        let copy = copy_schema(&mut tables, &schema, None).unwrap();
        assert_eq!(copy.name, "Leave (копия)");
        assert_eq!(copy.version, 1);

        let elements = tables.elements_of(&copy.id);
        assert_eq!(elements.len(), 4);
        assert_eq!(tables.connections_of(&copy.id).len(), 1);
        assert!(elements.iter().all(|e| e.id != process.id));

        let copied_process = elements.iter().find(|e| e.name == "Review").unwrap();
        let copied_child = elements.iter().find(|e| e.name == "Review child").unwrap();
        assert_eq!(copied_child.parent_id(), Some(copied_process.id));

        let requisites = tables.owned_by::<Requisite>(&copied_process.id);
        assert_eq!(requisites.len(), 1);
        assert_eq!(requisites[0].name(), "Reason");
        assert!(!requisites[0].validation.inherited);
    }

    #[test]
    fn test_new_version_rebinds_inherited_rows() {
        let mut tables = GraphTables::new();
        let v1 = valid_schema(&mut tables, "Leave");
        let parent = tables
            .create_element(&v1, ElementDraft::new(ElementType::Process, "Review"))
            .unwrap()
            .id;
        let requisite = tables
            .create_requisite(&parent, RequisiteDraft::new("Reason", "text"))
            .unwrap()
            .id;
        let child = inherit_element(&mut tables, &parent, &LayoutConfig::default())
            .unwrap()
            .id;

        let v2 = create_new_version(&mut tables, &v1, None).unwrap().id;
        let elements = tables.elements_of(&v2);
        let parent_v2 = elements.iter().find(|e| e.name == "Review").unwrap().id;
        let child_v2 = elements
            .iter()
            .find(|e| e.parent_id() == Some(parent_v2))
            .unwrap()
            .id;
        let requisite_v2 = tables.owned_by::<Requisite>(&parent_v2)[0].id;
        assert!(tables.owned_by::<Requisite>(&child_v2)[0]
            .validation
            .is_inherited_from(&parent_v2));

        let required = RequisitePatch {
            is_required: Some(true),
            ..Default::default()
        };
        let outcome = update_requisite_cascade(&mut tables, &parent, &requisite, &required).unwrap();
        assert_eq!(outcome.propagated, 1);
        assert!(tables.owned_by::<Requisite>(&child)[0].is_required);
        assert!(!tables.owned_by::<Requisite>(&child_v2)[0].is_required);

        let outcome =
            update_requisite_cascade(&mut tables, &parent_v2, &requisite_v2, &required).unwrap();
        assert_eq!(outcome.propagated, 1);
        assert!(tables.owned_by::<Requisite>(&child_v2)[0].is_required);
    }
}
