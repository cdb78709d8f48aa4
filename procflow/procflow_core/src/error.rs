//! Error types for the process-schema engine.
//!
//! Every public operation returns [`Result<T>`]. The variants map one-to-one
//! onto the categories callers are expected to branch on: authentication,
//! authorization, missing entities, rejected graph edits, failed publish
//! validation and conflicting writes. Storage and configuration failures are
//! wrapped in their own sub-errors.

use std::fmt;
use thiserror::Error;

/// The kind of entity an operation could not find.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Schema,
    Element,
    Connection,
    Transition,
    Requisite,
    ApprovalStage,
    Checklist,
    Role,
    Notification,
    PrintForm,
    Template,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Schema => "Schema",
            EntityKind::Element => "Element",
            EntityKind::Connection => "Connection",
            EntityKind::Transition => "Transition",
            EntityKind::Requisite => "Requisite",
            EntityKind::ApprovalStage => "Approval stage",
            EntityKind::Checklist => "Checklist",
            EntityKind::Role => "Role",
            EntityKind::Notification => "Notification",
            EntityKind::PrintForm => "Print form",
            EntityKind::Template => "Template",
        };
        f.write_str(name)
    }
}

/// Root error type.
#[derive(Debug, Error)]
pub enum Error {
    /// No caller identity could be resolved for an operation that needs one
    #[error("Authentication required")]
    Unauthenticated,

    /// The caller is neither an administrator nor a service administrator
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// A referenced entity does not exist
    #[error("{kind} not found: {id}")]
    NotFound {
        /// What was looked up
        kind: EntityKind,
        /// The id as given by the caller
        id: String,
    },

    /// A connection would break the PROCESS/DECISION alternation
    #[error("Invalid topology: {0}")]
    InvalidTopology(String),

    /// A decision branch carries a label outside the allowed set
    #[error("Invalid label: {0}")]
    InvalidLabel(String),

    /// Publishing was refused because the graph has validation errors
    #[error("Validation failed: {}", .0.join("; "))]
    ValidationFailed(Vec<String>),

    /// The write collides with existing state
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Snapshot persistence errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// JSON (de)serialization errors outside of snapshot storage
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Shorthand for a [`Error::NotFound`] with any displayable id.
    pub fn not_found(kind: EntityKind, id: impl fmt::Display) -> Self {
        Error::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    /// Whether this error means the addressed entity is missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// Errors raised while reading or writing graph snapshots.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Snapshot not found: {0}")]
    NotFound(String),

    #[error("Snapshot is malformed: {0}")]
    Malformed(String),
}

/// Errors raised while loading engine configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Result type used throughout the engine.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let err = Error::not_found(EntityKind::ApprovalStage, "abc");
        assert_eq!(err.to_string(), "Approval stage not found: abc");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_validation_failed_lists_every_error() {
        let err = Error::ValidationFailed(vec!["first".into(), "second".into()]);
        assert_eq!(err.to_string(), "Validation failed: first; second");
    }

    #[test]
    fn test_storage_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk");
        let err: Error = StorageError::from(io).into();
        assert!(matches!(err, Error::Storage(StorageError::Io(_))));
    }
}
