use chrono::{DateTime, Utc};
use procflow_core::id::SchemaId;
use serde::{Deserialize, Serialize};

/// A named process graph.
///
/// Schemas sharing `(name, is_template, service_id)` form a version family;
/// at most one member of a family is meant to be published at a time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    pub id: SchemaId,

    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    /// Optional grouping key (the service this process belongs to)
    #[serde(default)]
    pub service_id: Option<String>,

    #[serde(default)]
    pub is_template: bool,

    /// Monotonically increasing within a version family
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default)]
    pub version_label: Option<String>,

    #[serde(default)]
    pub is_published: bool,

    /// Soft-delete flag
    #[serde(default = "default_active")]
    pub is_active: bool,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

fn default_version() -> u32 {
    1
}

fn default_active() -> bool {
    true
}

/// The key identifying a version family.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionFamily {
    pub name: String,
    pub is_template: bool,
    pub service_id: Option<String>,
}

impl Schema {
    /// Create an unpublished, active schema at version 1.
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Schema {
            id: SchemaId::new(),
            name: name.into(),
            description: None,
            service_id: None,
            is_template: false,
            version: default_version(),
            version_label: None,
            is_published: false,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn with_service(mut self, service_id: &str) -> Self {
        self.service_id = Some(service_id.to_string());
        self
    }

    pub fn as_template(mut self) -> Self {
        self.is_template = true;
        self
    }

    /// The version family this schema belongs to.
    pub fn family(&self) -> VersionFamily {
        VersionFamily {
            name: self.name.clone(),
            is_template: self.is_template,
            service_id: self.service_id.clone(),
        }
    }

    pub fn in_family(&self, family: &VersionFamily) -> bool {
        self.name == family.name
            && self.is_template == family.is_template
            && self.service_id == family.service_id
    }

    pub(crate) fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Fields accepted when creating a schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaDraft {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub service_id: Option<String>,
    #[serde(default)]
    pub is_template: bool,
    #[serde(default)]
    pub version_label: Option<String>,
}

impl SchemaDraft {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }
}

/// Partial update of a schema. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub service_id: Option<String>,
    pub is_template: Option<bool>,
    pub version_label: Option<String>,
}
