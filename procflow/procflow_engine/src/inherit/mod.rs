//! Inheritance propagation.
//!
//! An element can be copied, or inherited by a child that keeps a link to
//! its parent. Copied requisites, checklists and print forms carry markers
//! naming their source element; those markers are what later cascades and
//! synchronizations follow. Breaking inheritance strips the markers and the
//! entity becomes independent again.

pub mod cascade;
pub mod copy;
pub mod lineage;
pub mod print_forms;
pub mod templates;

pub use cascade::{
    break_checklist_inheritance, break_requisite_inheritance, delete_checklist_cascade,
    delete_requisite_cascade, update_checklist_cascade, update_requisite_cascade, Cascade,
    Inheritable,
};
pub use copy::{copy_element, inherit_element, list_children, sync_children_from_parent, COPY_SUFFIX};
pub use lineage::{
    ensure_upstream, inherit_checklists_from, inherit_requisites_from, list_previous_processes,
};
pub use print_forms::{
    add_print_form, break_print_form_inheritance, copy_print_form, inherit_print_forms,
    list_print_forms, remove_print_form, update_print_form,
};
pub use templates::{
    apply_checklist_template, apply_requisite_template, apply_transition_template,
    create_checklist_template_from_element,
};
