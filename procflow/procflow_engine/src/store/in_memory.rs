//! In-memory graph store.

use parking_lot::RwLock;
use procflow_core::error::Result;
use std::sync::Arc;

use super::{GraphStore, GraphTables};

/// Tables behind a reader-writer lock.
///
/// Writers work on a copy of the tables and swap it in on success, so a
/// failing multi-step operation leaves no partial state behind. Writers are
/// serialized by the lock.
#[derive(Clone, Default)]
pub struct InMemoryGraphStore {
    tables: Arc<RwLock<GraphTables>>,
}

impl InMemoryGraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap previously loaded tables, rebuilding their indexes.
    pub fn from_tables(mut tables: GraphTables) -> Self {
        tables.reindex();
        Self {
            tables: Arc::new(RwLock::new(tables)),
        }
    }

    /// A point-in-time copy of all tables.
    pub fn snapshot(&self) -> GraphTables {
        self.tables.read().clone()
    }
}

impl GraphStore for InMemoryGraphStore {
    fn read<R, F>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&GraphTables) -> Result<R>,
    {
        let tables = self.tables.read();
        f(&tables)
    }

    fn write<R, F>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&mut GraphTables) -> Result<R>,
    {
        let mut tables = self.tables.write();
        let mut working = tables.clone();
        let out = f(&mut working)?;
        *tables = working;
        Ok(out)
    }
}
