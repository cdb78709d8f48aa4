//! Graph structure: edge rules and traversal views.

pub mod topology;
pub mod view;

pub use view::SchemaGraph;

/// Label of the approve branch leaving a decision.
pub const APPROVED_LABEL: &str = "Согласовано";

/// Label of the reject branch leaving a decision.
pub const REJECTED_LABEL: &str = "Отклонено";
