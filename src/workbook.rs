//! Source workbook access.
//!
//! The source is a "workbook directory": one CSV file per sheet, named
//! `<Sheet>.csv`. The sheet list is fixed; `Inventory` is ingested as an
//! inert pass-through table and never consumed by the analytical query.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use encoding_rs::Encoding;

use crate::{error::PipelineError, io_utils};

pub const SHEET_NAMES: &[&str] = &[
    "Orders",
    "Cancels",
    "Inventory",
    "Store",
    "Product",
    "Calendar",
];

#[derive(Debug, Clone)]
pub struct Sheet {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

pub struct Workbook {
    root: PathBuf,
    encoding: &'static Encoding,
}

impl Workbook {
    pub fn open(root: &Path, encoding: &'static Encoding) -> Result<Self, PipelineError> {
        if !root.is_dir() {
            return Err(PipelineError::SourceNotFound(root.to_path_buf()));
        }
        Ok(Self {
            root: root.to_path_buf(),
            encoding,
        })
    }

    pub fn sheet_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}.csv"))
    }

    pub fn read_sheet(&self, name: &str) -> Result<Sheet, PipelineError> {
        let path = self.sheet_path(name);
        if !path.is_file() {
            return Err(PipelineError::SheetMissing(name.to_string()));
        }
        self.read_sheet_csv(&path)
            .map_err(|source| PipelineError::Ingestion {
                sheet: name.to_string(),
                source,
            })
    }

    fn read_sheet_csv(&self, path: &Path) -> Result<Sheet> {
        let mut reader = io_utils::open_csv_reader(path)?;
        let headers = io_utils::reader_headers(&mut reader, self.encoding)?;

        let mut rows = Vec::new();
        for (row_idx, record) in reader.byte_records().enumerate() {
            let record = record.with_context(|| format!("Reading row {}", row_idx + 2))?;
            let decoded = io_utils::decode_record(&record, self.encoding)?;
            rows.push(decoded);
        }

        Ok(Sheet { headers, rows })
    }
}
