//! Reusable presets of checklist items, requisites and transitions.
//!
//! A template is not tied to any element. Applying one copies its entries
//! into an element once; nothing links the copies back to the template.

use procflow_core::id::TemplateId;
use serde::{Deserialize, Serialize};

use crate::model::checklist::ChecklistDraft;
use crate::model::requisite::RequisiteDraft;
use crate::model::transition::TransitionDraft;

/// A named preset holding a list of entity drafts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template<T> {
    pub id: TemplateId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub items: Vec<T>,
}

impl<T> Template<T> {
    pub fn new(name: &str, items: Vec<T>) -> Self {
        Self {
            id: TemplateId::new(),
            name: name.to_string(),
            description: None,
            items,
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }
}

pub type ChecklistTemplate = Template<ChecklistDraft>;
pub type RequisiteTemplate = Template<RequisiteDraft>;
pub type TransitionTemplate = Template<TransitionDraft>;

#[derive(Debug, Clone, PartialEq)]
pub struct TemplatePatch<T> {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub items: Option<Vec<T>>,
}

impl<T> Default for TemplatePatch<T> {
    fn default() -> Self {
        Self {
            name: None,
            description: None,
            items: None,
        }
    }
}

impl<T: Clone> TemplatePatch<T> {
    pub(crate) fn apply(&self, template: &mut Template<T>) {
        if let Some(name) = &self.name {
            template.name = name.clone();
        }
        if let Some(description) = &self.description {
            template.description = description.clone();
        }
        if let Some(items) = &self.items {
            template.items = items.clone();
        }
    }
}
