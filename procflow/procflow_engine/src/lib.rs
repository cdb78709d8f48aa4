//! # Procflow Engine
//!
//! `procflow_engine` stores, checks, publishes and propagates process
//! schemas: directed graphs of START, PROCESS, DECISION and END elements
//! with per-element business rules attached.
//!
//! Key concepts:
//!
//! 1. **Graph store**: every entity lives in [`store::GraphTables`]; a
//!    [`store::GraphStore`] makes each write all-or-nothing.
//!
//! 2. **Edge rules**: processes lead to decisions and decisions lead to
//!    processes. Decisions after approval steps only accept the approve and
//!    reject branch labels.
//!
//! 3. **Validation**: a read-only walk of the graph producing errors and
//!    warnings. Publishing requires a graph without errors.
//!
//! 4. **Augmentation**: edits that imply a decision (a new process, an
//!    approval requisite, an approve-or-reject transition) insert one.
//!
//! 5. **Inheritance**: elements are copied or inherited; copies carry
//!    markers so later edits of the source can be cascaded to them.
//!
//! [`service::ProcessService`] puts all of the above behind one access
//! check.

pub mod augment;
pub mod graph;
pub mod inherit;
pub mod lifecycle;
pub mod model;
pub mod ordering;
pub mod service;
pub mod store;
pub mod validation;

pub use graph::{SchemaGraph, APPROVED_LABEL, REJECTED_LABEL};
pub use lifecycle::PublishOutcome;
pub use service::ProcessService;
pub use store::{FileSnapshot, GraphStore, GraphTables, InMemoryGraphStore};
pub use validation::{validate, ValidationReport};
