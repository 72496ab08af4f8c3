//! Offline ingestion pipeline: workbook directory -> SQLite tables.
//!
//! Each sheet is loaded, type-inferred, label-normalized, and written
//! as a full table replacement in its own transaction. There is no
//! transaction spanning the whole run: a failure on sheet N leaves
//! sheets 1..N committed. Re-running against identical source data is
//! idempotent because every run replaces rather than appends.

use std::path::Path;

use anyhow::Result;
use encoding_rs::Encoding;
use log::info;

use crate::{
    cli::LoadArgs,
    error::PipelineError,
    io_utils,
    schema::infer_schema,
    store::Store,
    workbook::{SHEET_NAMES, Workbook},
};

pub fn execute(args: &LoadArgs) -> Result<()> {
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    info!(
        "Loading workbook '{}' into '{}'",
        args.source.display(),
        args.db.display()
    );
    ingest_workbook(&args.source, &args.db, encoding)?;
    info!("Ingestion complete; database is ready for analysis");
    Ok(())
}

pub fn ingest_workbook(
    source: &Path,
    db: &Path,
    encoding: &'static Encoding,
) -> Result<(), PipelineError> {
    let workbook = Workbook::open(source, encoding)?;

    // Fail before any writes if a sheet is absent, so a misnamed tab
    // cannot leave a half-replaced database behind.
    for name in SHEET_NAMES {
        let path = workbook.sheet_path(name);
        if !path.is_file() {
            return Err(PipelineError::SheetMissing(name.to_string()));
        }
    }

    let mut store = Store::open(db)?;
    for name in SHEET_NAMES {
        let sheet = workbook.read_sheet(name)?;
        let schema = infer_schema(&sheet.headers, &sheet.rows);
        let inserted = store
            .replace_table(name, &schema, &sheet.rows)
            .map_err(|err| PipelineError::Ingestion {
                sheet: name.to_string(),
                source: err.into(),
            })?;
        info!("Loaded sheet '{name}' into table '{name}' ({inserted} row(s))");
    }
    Ok(())
}
