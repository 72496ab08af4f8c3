//! Typed failure taxonomy for the ingestion and query layers.
//!
//! Ingestion failures are operator-facing and fatal to the run; the
//! pipeline commits one sheet per transaction, so sheets already written
//! before a mid-run failure stay committed. Query failures are surfaced
//! to the dashboard as a blocking error in place of the dataset.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("source workbook not found: {}", .0.display())]
    SourceNotFound(PathBuf),
    #[error("sheet '{0}' is missing from the source workbook")]
    SheetMissing(String),
    #[error("failed to ingest sheet '{sheet}'")]
    Ingestion {
        sheet: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("analytical query requires table '{0}', which is missing from the database")]
    MissingTable(String),
    #[error("analytical query requires column '{column}' in table '{table}', which is missing")]
    MissingColumn { table: String, column: String },
    #[error("failed to read database snapshot '{}' for cache stamping", path.display())]
    Snapshot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("SQLite error: {0}")]
    Store(#[from] rusqlite::Error),
}
