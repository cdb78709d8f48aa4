use chrono::{DateTime, Utc};
use procflow_core::id::{ElementId, SchemaId};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::model::print_form::PrintForm;

/// The kind of a graph node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ElementType {
    Start,
    Process,
    Decision,
    Decision2,
    End,
}

impl ElementType {
    /// Both decision flavours behave identically in the graph rules.
    pub fn is_decision(&self) -> bool {
        matches!(self, ElementType::Decision | ElementType::Decision2)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ElementType::Start | ElementType::End)
    }
}

impl std::fmt::Display for ElementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ElementType::Start => write!(f, "START"),
            ElementType::Process => write!(f, "PROCESS"),
            ElementType::Decision => write!(f, "DECISION"),
            ElementType::Decision2 => write!(f, "DECISION2"),
            ElementType::End => write!(f, "END"),
        }
    }
}

/// Canvas placement. Presentation only.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Geometry {
    #[serde(default)]
    pub position_x: f64,
    #[serde(default)]
    pub position_y: f64,
    #[serde(default = "default_width")]
    pub width: f64,
    #[serde(default = "default_height")]
    pub height: f64,
}

fn default_width() -> f64 {
    160.0
}

fn default_height() -> f64 {
    80.0
}

impl Default for Geometry {
    fn default() -> Self {
        Self {
            position_x: 0.0,
            position_y: 0.0,
            width: default_width(),
            height: default_height(),
        }
    }
}

impl Geometry {
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            position_x: x,
            position_y: y,
            ..Default::default()
        }
    }

    pub fn shifted(&self, dx: f64, dy: f64) -> Self {
        Self {
            position_x: self.position_x + dx,
            position_y: self.position_y + dy,
            ..*self
        }
    }
}

/// The typed `properties` document of an element.
///
/// The stored key names are kept as they always were so that existing graphs
/// load unchanged; keys this engine does not know are carried in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementProperties {
    /// Back-reference to the element this one inherits from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_element_id: Option<ElementId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_element_name: Option<String>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub fully_inherited: bool,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub has_approval_requisite: bool,

    /// Marks a decision placeholder inserted by the engine
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub needs_configuration: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub print_forms: Vec<PrintForm>,

    /// Legacy single-value mirror of the last touched print form
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub print_form: Option<PrintForm>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A node of a process graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    pub id: ElementId,

    pub schema_id: SchemaId,

    pub element_type: ElementType,

    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(flatten)]
    pub geometry: Geometry,

    #[serde(default)]
    pub properties: ElementProperties,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Element {
    pub fn new(schema_id: SchemaId, element_type: ElementType, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Element {
            id: ElementId::new(),
            schema_id,
            element_type,
            name: name.into(),
            description: None,
            geometry: Geometry::default(),
            properties: ElementProperties::default(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.geometry = Geometry::at(x, y);
        self
    }

    pub fn parent_id(&self) -> Option<ElementId> {
        self.properties.parent_element_id
    }

    pub(crate) fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Fields accepted when creating an element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementDraft {
    pub element_type: ElementType,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(flatten)]
    pub geometry: Geometry,
    #[serde(default)]
    pub properties: ElementProperties,
}

impl ElementDraft {
    pub fn new(element_type: ElementType, name: &str) -> Self {
        Self {
            element_type,
            name: name.to_string(),
            description: None,
            geometry: Geometry::default(),
            properties: ElementProperties::default(),
        }
    }

    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.geometry = Geometry::at(x, y);
        self
    }
}

/// Partial update of an element.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub geometry: Option<Geometry>,
    /// Replaces the unrecognised part of `properties`
    pub extra_properties: Option<Map<String, Value>>,
}
