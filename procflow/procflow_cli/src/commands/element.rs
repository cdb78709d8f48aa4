use anyhow::Result;
use procflow_core::id::ElementId;

use super::{print_json, Session};

pub fn children(session: &Session, element: &ElementId) -> Result<bool> {
    print_json(&session.service.list_children(element)?)?;
    Ok(true)
}

/// Upstream processes, nearest first.
pub fn lineage(session: &Session, element: &ElementId) -> Result<bool> {
    print_json(&session.service.list_previous_processes(element)?)?;
    Ok(true)
}
