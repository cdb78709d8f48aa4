//! Command implementations.
//!
//! Every command returns `Ok(true)` on success and `Ok(false)` when it ran
//! but the outcome should fail the process (an invalid schema).

pub mod element;
pub mod schema;

use std::path::PathBuf;

use anyhow::{Context, Result};
use procflow_core::id::UserId;
use procflow_core::utils::EngineConfig;
use procflow_core::AccessGuard;
use procflow_engine::{FileSnapshot, InMemoryGraphStore, ProcessService};
use serde::Serialize;
use tracing::debug;

/// A service over the tables of one snapshot file.
pub struct Session {
    pub service: ProcessService<InMemoryGraphStore>,
    snapshot: FileSnapshot,
}

impl Session {
    /// Load the snapshot. The operator acts as the single administrator.
    pub fn open(config: &EngineConfig, path: PathBuf) -> Result<Self> {
        let snapshot = FileSnapshot::new(path);
        let tables = snapshot
            .load_or_default()
            .with_context(|| format!("Failed to load snapshot {}", snapshot.path().display()))?;
        debug!(path = %snapshot.path().display(), "snapshot opened");

        let service = ProcessService::new(
            InMemoryGraphStore::from_tables(tables),
            AccessGuard::single_admin(UserId::new()),
            config.layout.clone(),
        );
        Ok(Self { service, snapshot })
    }

    /// Write the current tables back to the snapshot file.
    pub fn save(&self) -> Result<()> {
        self.snapshot
            .save(&self.service.store().snapshot())
            .with_context(|| format!("Failed to save snapshot {}", self.snapshot.path().display()))
    }
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value).context("Failed to encode output")?;
    println!("{}", out);
    Ok(())
}
