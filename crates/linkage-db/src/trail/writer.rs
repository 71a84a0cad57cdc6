//! JSONL trail writer.
//!
//! Appends `TrailOperation` records to `{trail_dir}/{intake_id}.jsonl` with
//! `serde_jsonlines::append_json_lines`, one line per mutation.

use std::path::{Path, PathBuf};

use linkage_core::trail::TrailOperation;

use crate::error::DatabaseError;

pub struct TrailWriter {
    trail_dir: PathBuf,
    enabled: bool,
}

impl TrailWriter {
    /// Create a writer for `trail_dir`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the directory cannot be created.
    pub fn new(trail_dir: PathBuf) -> Result<Self, DatabaseError> {
        std::fs::create_dir_all(&trail_dir).map_err(|e| DatabaseError::Other(e.into()))?;
        Ok(Self {
            trail_dir,
            enabled: true,
        })
    }

    /// A writer that drops every operation.
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            trail_dir: PathBuf::new(),
            enabled: false,
        }
    }

    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn path_for(&self, intake_id: &str) -> PathBuf {
        self.trail_dir.join(format!("{intake_id}.jsonl"))
    }

    /// # Errors
    ///
    /// Returns `DatabaseError` if the file write fails.
    pub fn append(&self, op: &TrailOperation) -> Result<(), DatabaseError> {
        if !self.enabled {
            return Ok(());
        }
        serde_jsonlines::append_json_lines(self.path_for(&op.intake), [op])
            .map_err(|e| DatabaseError::Other(e.into()))?;
        Ok(())
    }

    /// Read back every operation recorded for an intake, oldest first.
    /// A missing file yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the file exists but a line fails to parse.
    pub fn read(&self, intake_id: &str) -> Result<Vec<TrailOperation>, DatabaseError> {
        let path = self.path_for(intake_id);
        if !self.enabled || !path.exists() {
            return Ok(Vec::new());
        }
        let lines = serde_jsonlines::json_lines::<TrailOperation, _>(&path)
            .map_err(|e| DatabaseError::Other(e.into()))?;
        lines
            .collect::<std::io::Result<Vec<_>>>()
            .map_err(|e| DatabaseError::Other(e.into()))
    }

    #[must_use]
    pub fn trail_dir(&self) -> &Path {
        &self.trail_dir
    }
}
