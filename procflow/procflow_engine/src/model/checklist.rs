use procflow_core::id::{ChecklistId, ElementId};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::model::inheritance::InheritanceMeta;

/// A required-document item attached to an element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checklist {
    pub id: ChecklistId,
    pub element_id: ElementId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_required: bool,
    #[serde(default)]
    pub file_types: Vec<String>,
    /// Upper bound in bytes
    #[serde(default)]
    pub max_file_size: Option<u64>,
    #[serde(default)]
    pub allow_documents: bool,
    #[serde(default)]
    pub allow_comments: bool,
    #[serde(default)]
    pub order: u32,
    #[serde(default)]
    pub meta: InheritanceMeta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistDraft {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_required: bool,
    #[serde(default)]
    pub file_types: Vec<String>,
    #[serde(default)]
    pub max_file_size: Option<u64>,
    #[serde(default)]
    pub allow_documents: bool,
    #[serde(default)]
    pub allow_comments: bool,
    #[serde(default)]
    pub meta: Map<String, Value>,
}

impl ChecklistDraft {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            description: None,
            is_required: false,
            file_types: Vec::new(),
            max_file_size: None,
            allow_documents: true,
            allow_comments: false,
            meta: Map::new(),
        }
    }

    pub(crate) fn into_checklist(self, element_id: ElementId, order: u32) -> Checklist {
        let mut meta = InheritanceMeta::default();
        meta.merge(&self.meta);
        Checklist {
            id: ChecklistId::new(),
            element_id,
            name: self.name,
            description: self.description,
            is_required: self.is_required,
            file_types: self.file_types,
            max_file_size: self.max_file_size,
            allow_documents: self.allow_documents,
            allow_comments: self.allow_comments,
            order,
            meta,
        }
    }
}

impl From<&Checklist> for ChecklistDraft {
    fn from(item: &Checklist) -> Self {
        Self {
            name: item.name.clone(),
            description: item.description.clone(),
            is_required: item.is_required,
            file_types: item.file_types.clone(),
            max_file_size: item.max_file_size,
            allow_documents: item.allow_documents,
            allow_comments: item.allow_comments,
            meta: item.meta.extra.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChecklistPatch {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub is_required: Option<bool>,
    pub file_types: Option<Vec<String>>,
    pub max_file_size: Option<Option<u64>>,
    pub allow_documents: Option<bool>,
    pub allow_comments: Option<bool>,
    pub meta: Option<Map<String, Value>>,
}

impl ChecklistPatch {
    pub(crate) fn apply(&self, item: &mut Checklist) {
        if let Some(name) = &self.name {
            item.name = name.clone();
        }
        if let Some(description) = &self.description {
            item.description = description.clone();
        }
        if let Some(is_required) = self.is_required {
            item.is_required = is_required;
        }
        if let Some(file_types) = &self.file_types {
            item.file_types = file_types.clone();
        }
        if let Some(max_file_size) = self.max_file_size {
            item.max_file_size = max_file_size;
        }
        if let Some(allow_documents) = self.allow_documents {
            item.allow_documents = allow_documents;
        }
        if let Some(allow_comments) = self.allow_comments {
            item.allow_comments = allow_comments;
        }
        if let Some(meta) = &self.meta {
            item.meta.merge(meta);
        }
    }
}
