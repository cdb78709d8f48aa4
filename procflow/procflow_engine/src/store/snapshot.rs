//! JSON snapshots of the graph tables on disk.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use procflow_core::error::{Result, StorageError};
use tracing::{debug, info};

use super::GraphTables;

/// A snapshot file holding all graph tables.
#[derive(Debug, Clone)]
pub struct FileSnapshot {
    path: PathBuf,
}

impl FileSnapshot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Load the tables. Fails if the file does not exist.
    pub fn load(&self) -> Result<GraphTables> {
        if !self.path.exists() {
            return Err(StorageError::NotFound(self.path.display().to_string()).into());
        }

        let raw = fs::read(&self.path).map_err(StorageError::Io)?;
        let mut tables: GraphTables = serde_json::from_slice(&raw)
            .map_err(|e| StorageError::Malformed(format!("{}: {}", self.path.display(), e)))?;
        tables.reindex();

        debug!(
            path = %self.path.display(),
            schemas = tables.schemas.len(),
            elements = tables.elements.len(),
            "snapshot loaded"
        );
        Ok(tables)
    }

    /// Load the tables, starting empty when the file does not exist yet.
    pub fn load_or_default(&self) -> Result<GraphTables> {
        if self.path.exists() {
            self.load()
        } else {
            info!("No snapshot at {}, starting empty", self.path.display());
            Ok(GraphTables::default())
        }
    }

    /// Write the tables, replacing the file atomically.
    pub fn save(&self, tables: &GraphTables) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(StorageError::Io)?;
            }
        }

        let data = serde_json::to_vec_pretty(tables)?;

        // Write atomically using a temporary file
        let temp_path = self.path.with_extension("tmp");
        {
            let mut file = fs::File::create(&temp_path).map_err(StorageError::Io)?;
            file.write_all(&data).map_err(StorageError::Io)?;
            file.sync_all().map_err(StorageError::Io)?;
        }
        fs::rename(&temp_path, &self.path).map_err(StorageError::Io)?;

        debug!(path = %self.path.display(), bytes = data.len(), "snapshot saved");
        Ok(())
    }
}
