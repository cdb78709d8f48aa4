//! Inheritance markers carried by copied sub-entities.
//!
//! Requisites keep their markers in the `validation` document, checklists in
//! `meta` and print forms inline. All three use the same keys, and all three
//! documents may carry arbitrary other keys that must survive a round trip.

use std::collections::BTreeMap;

use procflow_core::id::ElementId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Keys reserved for inheritance markers.
pub const MARKER_KEYS: [&str; 3] = [
    "inherited",
    "inheritedFromElementId",
    "inheritedFromElementName",
];

/// A free-form document with typed inheritance markers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InheritanceMeta {
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub inherited: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inherited_from_element_id: Option<ElementId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inherited_from_element_name: Option<String>,

    /// Every other key of the document, preserved verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl InheritanceMeta {
    /// Whether this entity is still bound to `source`.
    pub fn is_inherited_from(&self, source: &ElementId) -> bool {
        self.inherited && self.inherited_from_element_id.as_ref() == Some(source)
    }

    /// Stamp markers pointing at the given source element.
    pub fn stamp(&mut self, source: ElementId, source_name: &str) {
        self.inherited = true;
        self.inherited_from_element_id = Some(source);
        self.inherited_from_element_name = Some(source_name.to_string());
    }

    /// Point the markers at the copy of their source when the source was
    /// copied along with this entity.
    pub fn redirect(&mut self, remap: &BTreeMap<ElementId, ElementId>) -> bool {
        match self.inherited_from_element_id.and_then(|id| remap.get(&id)) {
            Some(mapped) => {
                self.inherited_from_element_id = Some(*mapped);
                true
            }
            None => false,
        }
    }

    /// Strip the markers, leaving the rest of the document untouched.
    pub fn clear(&mut self) {
        self.inherited = false;
        self.inherited_from_element_id = None;
        self.inherited_from_element_name = None;
    }

    /// Shallow-merge a patch document. Marker keys in the patch are ignored
    /// so the entity's own markers always win.
    pub fn merge(&mut self, patch: &Map<String, Value>) {
        for (key, value) in patch {
            if MARKER_KEYS.contains(&key.as_str()) {
                continue;
            }
            self.extra.insert(key.clone(), value.clone());
        }
    }
}
