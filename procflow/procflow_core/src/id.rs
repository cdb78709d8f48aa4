//! Strongly-typed identifiers for the process-schema engine.
//!
//! Every stored entity is addressed by a UUID wrapped in [`Id<T>`], where the
//! phantom marker `T` keeps schema ids, element ids and connection ids from
//! being mixed up. Ids serialize as plain UUID strings so that stored graphs
//! stay readable and can be used as JSON map keys.
//!
//! # Examples
//!
//! ```
//! use procflow_core::id::{ElementId, SchemaId};
//! use std::str::FromStr;
//!
//! let schema_id = SchemaId::new();
//! let element_id = ElementId::new();
//! assert_ne!(schema_id.to_string(), element_id.to_string());
//!
//! let id_str = "550e8400-e29b-41d4-a716-446655440000";
//! let element_id = ElementId::from_str(id_str).unwrap();
//! assert_eq!(element_id.to_string(), id_str);
//! ```

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;
use uuid::Uuid;

/// A type-safe identifier based on UUID.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Id<T> {
    uuid: Uuid,
    _marker: PhantomData<T>,
}

impl<T> Id<T> {
    /// Create a new random identifier.
    pub fn new() -> Self {
        Self::from_uuid(Uuid::new_v4())
    }

    /// Create an identifier from a specific UUID.
    ///
    /// Used when ids come back from a snapshot or from the command line.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self {
            uuid,
            _marker: PhantomData,
        }
    }

    /// Get the underlying UUID.
    pub fn uuid(&self) -> Uuid {
        self.uuid
    }
}

impl<T> Default for Id<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id({})", self.uuid)
    }
}

impl<T> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.uuid)
    }
}

impl<T> FromStr for Id<T> {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_uuid(Uuid::parse_str(s.trim())?))
    }
}

impl<T> Serialize for Id<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.uuid)
    }
}

impl<'de, T> Deserialize<'de> for Id<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Id::from_str(&raw).map_err(serde::de::Error::custom)
    }
}

macro_rules! define_id {
    ($(#[$doc:meta])* $marker:ident => $alias:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $marker;
        $(#[$doc])*
        pub type $alias = Id<$marker>;
    };
}

define_id!(
    /// Identifier for a process schema (a graph container).
    SchemaMarker => SchemaId
);
define_id!(
    /// Identifier for a graph element (node).
    ElementMarker => ElementId
);
define_id!(
    /// Identifier for a connection (edge).
    ConnectionMarker => ConnectionId
);
define_id!(
    /// Identifier for a transition rule attached to an element.
    TransitionMarker => TransitionId
);
define_id!(
    /// Identifier for a requisite (form field).
    RequisiteMarker => RequisiteId
);
define_id!(
    /// Identifier for an approval stage inside an approval requisite.
    ApprovalStageMarker => ApprovalStageId
);
define_id!(
    /// Identifier for a required-document checklist item.
    ChecklistMarker => ChecklistId
);
define_id!(
    /// Identifier for a role assignment.
    RoleMarker => RoleId
);
define_id!(
    /// Identifier for a notification rule.
    NotificationMarker => NotificationId
);
define_id!(
    /// Identifier for a print-form entry in an element's properties.
    PrintFormMarker => PrintFormId
);
define_id!(
    /// Identifier for a reusable checklist/requisite/transition template.
    TemplateMarker => TemplateId
);
define_id!(
    /// Identifier for an authenticated user.
    UserMarker => UserId
);
