//! Graph storage.
//!
//! [`GraphTables`] holds every row; a [`GraphStore`] decides how the tables
//! are shared and how a write becomes visible.

mod crud;
mod in_memory;
pub mod snapshot;
pub mod tables;

pub use in_memory::InMemoryGraphStore;
pub use snapshot::FileSnapshot;
pub use tables::{GraphTables, OwnedEntity, TemplateItem};

use procflow_core::error::Result;

/// Trait for graph storage.
///
/// A graph store hands out shared read access and exclusive write access to
/// the tables. A write is all-or-nothing: if the closure fails, none of its
/// changes are kept.
///
/// [`InMemoryGraphStore`] gets that guarantee by cloning the whole table set
/// per write, and each augmentation trigger clones it once more for its
/// savepoint. A write therefore costs time linear in the size of the store,
/// which suits stores holding a few thousand schemas. Larger deployments
/// should implement this trait over a transactional backend instead.
pub trait GraphStore: Send + Sync {
    /// Run a read-only closure against the tables.
    fn read<R, F>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&GraphTables) -> Result<R>;

    /// Run a mutating closure and commit its changes only if it succeeds.
    fn write<R, F>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&mut GraphTables) -> Result<R>;
}
