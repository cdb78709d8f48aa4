//! # Procflow Core
//!
//! `procflow_core` holds the pieces shared by every procflow crate:
//!
//! - **id**: strongly-typed UUID identifiers for schemas, elements,
//!   connections and per-element entities
//! - **error**: the error taxonomy surfaced to callers
//! - **auth**: the identity and role traits consumed from outside, and the
//!   guard applied in front of every mutating operation
//! - **utils**: TOML configuration and `tracing` setup

pub mod auth;
pub mod error;
pub mod id;
pub mod utils;

pub use auth::{AccessGuard, AccessRoles, Caller, IdentityProvider, RoleDirectory};
pub use error::{ConfigError, EntityKind, Error, Result, StorageError};
pub use id::{
    ApprovalStageId, ChecklistId, ConnectionId, ElementId, Id, NotificationId, PrintFormId,
    RequisiteId, RoleId, SchemaId, TemplateId, TransitionId, UserId,
};
pub use utils::{EngineConfig, LayoutConfig};
