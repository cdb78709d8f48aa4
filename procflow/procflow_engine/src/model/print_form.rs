use procflow_core::id::{ElementId, PrintFormId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::inheritance::InheritanceMeta;

/// A print-form template attached to an element.
///
/// Print forms live inside the owning element's `properties.printForms`
/// list rather than in a table of their own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintForm {
    pub id: PrintFormId,

    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(default)]
    pub template_url: Option<String>,

    #[serde(default)]
    pub template_name: Option<String>,

    #[serde(default)]
    pub label: Option<String>,

    /// Field mappings, opaque to the engine
    #[serde(default)]
    pub mappings: Vec<Value>,

    #[serde(default)]
    pub order: u32,

    /// Inheritance markers plus any other stored keys
    #[serde(flatten)]
    pub meta: InheritanceMeta,
}

fn default_enabled() -> bool {
    true
}

impl PrintForm {
    /// The name used to match inherited copies against their source.
    pub fn match_name(&self) -> &str {
        self.template_name
            .as_deref()
            .or(self.label.as_deref())
            .unwrap_or_default()
    }

    /// A copy with a new id, stamped as inherited from `source`.
    pub(crate) fn inherited_copy(&self, source: ElementId, source_name: &str) -> Self {
        let mut copy = self.clone();
        copy.id = PrintFormId::new();
        copy.meta.stamp(source, source_name);
        copy
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintFormDraft {
    #[serde(default)]
    pub template_url: Option<String>,
    #[serde(default)]
    pub template_name: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub mappings: Vec<Value>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl PrintFormDraft {
    pub fn named(template_name: &str) -> Self {
        Self {
            template_url: None,
            template_name: Some(template_name.to_string()),
            label: None,
            mappings: Vec::new(),
            enabled: true,
        }
    }

    pub(crate) fn into_print_form(self, order: u32) -> PrintForm {
        PrintForm {
            id: PrintFormId::new(),
            enabled: self.enabled,
            template_url: self.template_url,
            template_name: self.template_name,
            label: self.label,
            mappings: self.mappings,
            order,
            meta: InheritanceMeta::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PrintFormPatch {
    pub template_url: Option<Option<String>>,
    pub template_name: Option<Option<String>>,
    pub label: Option<Option<String>>,
    pub mappings: Option<Vec<Value>>,
    pub enabled: Option<bool>,
}

impl PrintFormPatch {
    pub(crate) fn apply(&self, form: &mut PrintForm) {
        if let Some(url) = &self.template_url {
            form.template_url = url.clone();
        }
        if let Some(name) = &self.template_name {
            form.template_name = name.clone();
        }
        if let Some(label) = &self.label {
            form.label = label.clone();
        }
        if let Some(mappings) = &self.mappings {
            form.mappings = mappings.clone();
        }
        if let Some(enabled) = self.enabled {
            form.enabled = enabled;
        }
    }
}
