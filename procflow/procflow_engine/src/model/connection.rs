use chrono::{DateTime, Utc};
use procflow_core::id::{ConnectionId, ElementId, SchemaId};
use serde::{Deserialize, Serialize};

/// Connection type used by every edge the engine creates itself.
pub const SEQUENCE: &str = "sequence";

/// A vertex of an edge's drawn polyline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// A directed edge between two elements of the same schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub id: ConnectionId,

    pub schema_id: SchemaId,

    pub source_id: ElementId,

    pub target_id: ElementId,

    #[serde(default = "default_connection_type")]
    pub connection_type: String,

    #[serde(default)]
    pub condition: Option<String>,

    /// Branch label; on decision edges this is the approve/reject literal
    #[serde(default)]
    pub label: Option<String>,

    #[serde(default)]
    pub points: Vec<Point>,

    pub created_at: DateTime<Utc>,
}

fn default_connection_type() -> String {
    SEQUENCE.to_string()
}

impl Connection {
    pub fn sequence(schema_id: SchemaId, source_id: ElementId, target_id: ElementId) -> Self {
        Connection {
            id: ConnectionId::new(),
            schema_id,
            source_id,
            target_id,
            connection_type: default_connection_type(),
            condition: None,
            label: None,
            points: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// The label with surrounding whitespace removed.
    pub fn trimmed_label(&self) -> &str {
        self.label.as_deref().map(str::trim).unwrap_or_default()
    }

    pub fn touches(&self, element_id: &ElementId) -> bool {
        &self.source_id == element_id || &self.target_id == element_id
    }
}

/// Request to create an edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionDraft {
    pub source_id: ElementId,
    pub target_id: ElementId,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub connection_type: Option<String>,
    #[serde(default)]
    pub points: Vec<Point>,
}

impl ConnectionDraft {
    pub fn new(source_id: ElementId, target_id: ElementId) -> Self {
        Self {
            source_id,
            target_id,
            label: None,
            condition: None,
            connection_type: None,
            points: Vec::new(),
        }
    }

    pub fn labeled(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }
}

/// Partial update of an edge. The outer `Option` selects the field, the
/// inner one allows clearing it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConnectionPatch {
    pub label: Option<Option<String>>,
    pub condition: Option<Option<String>>,
    pub connection_type: Option<String>,
    pub points: Option<Vec<Point>>,
}
