//! Entities of a process graph.
//!
//! Every entity serializes with camelCase keys. Documents that have always
//! been free-form (`properties`, `validation`, `meta`) are typed sidecars that
//! keep unknown keys intact.

pub mod checklist;
pub mod connection;
pub mod element;
pub mod inheritance;
pub mod notification;
pub mod print_form;
pub mod requisite;
pub mod role;
pub mod schema;
pub mod template;
pub mod transition;

pub use checklist::{Checklist, ChecklistDraft, ChecklistPatch};
pub use connection::{Connection, ConnectionDraft, ConnectionPatch, Point};
pub use element::{Element, ElementDraft, ElementPatch, ElementProperties, ElementType, Geometry};
pub use inheritance::InheritanceMeta;
pub use notification::{Notification, NotificationDraft, NotificationPatch};
pub use print_form::{PrintForm, PrintFormDraft, PrintFormPatch};
pub use requisite::{
    ApprovalStage, ApprovalStageDraft, ApprovalStagePatch, ExecutionType, Requisite,
    RequisiteDraft, RequisitePatch,
};
pub use role::{Role, RoleDraft, RolePatch};
pub use schema::{Schema, SchemaDraft, SchemaPatch, VersionFamily};
pub use template::{
    ChecklistTemplate, RequisiteTemplate, Template, TemplatePatch, TransitionTemplate,
};
pub use transition::{
    Transition, TransitionCondition, TransitionDraft, TransitionPatch, TransitionType,
};
