//! Explicit dataset memoization.
//!
//! The analytical dataset is recomputed only when the SHA-256 content
//! stamp of the database file changes (i.e. after an ingestion run) or
//! on explicit invalidation. Filter changes never touch the cache; the
//! dataset is a read-only snapshot for the life of a session.

use std::{fs, path::Path};

use sha2::{Digest, Sha256};

use crate::{
    derive::{AnalyticalRow, derive_dataset},
    error::PipelineError,
    query::run_analytical_query,
    store::Store,
};

#[derive(Debug, Default)]
pub struct DatasetCache {
    stamp: Option<String>,
    rows: Vec<AnalyticalRow>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the memoized dataset, recomputing it from the store when
    /// the database snapshot stamp has changed since the last load.
    pub fn load(&mut self, db_path: &Path, store: &Store) -> Result<&[AnalyticalRow], PipelineError> {
        let stamp = snapshot_stamp(db_path)?;
        if self.stamp.as_deref() != Some(stamp.as_str()) {
            let raw_rows = run_analytical_query(store)?;
            self.rows = derive_dataset(&raw_rows);
            self.stamp = Some(stamp);
        }
        Ok(&self.rows)
    }

    pub fn invalidate(&mut self) {
        self.stamp = None;
        self.rows.clear();
    }

    pub fn is_warm(&self) -> bool {
        self.stamp.is_some()
    }
}

fn snapshot_stamp(path: &Path) -> Result<String, PipelineError> {
    let bytes = fs::read(path).map_err(|source| PipelineError::Snapshot {
        path: path.to_path_buf(),
        source,
    })?;
    let digest = Sha256::digest(&bytes);
    Ok(format!("{digest:x}"))
}
