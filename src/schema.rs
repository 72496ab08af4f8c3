//! Sheet schema model and type inference.
//!
//! Each ingested sheet gets a [`Schema`]: normalized column labels plus
//! a [`ColumnType`] inferred by sampling cell contents. The inferred
//! type drives the SQLite column declaration and how cells are bound
//! during the bulk insert.

use crate::data::{normalize_label, parse_naive_date};

const DEFAULT_SAMPLE_ROWS: usize = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Float,
    Date,
    Text,
}

impl ColumnType {
    pub fn sql_decl(&self) -> &'static str {
        match self {
            ColumnType::Integer => "INTEGER",
            ColumnType::Float => "REAL",
            ColumnType::Date | ColumnType::Text => "TEXT",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ColumnMeta {
    pub name: String,
    pub datatype: ColumnType,
}

#[derive(Debug, Clone)]
pub struct Schema {
    pub columns: Vec<ColumnMeta>,
}

#[derive(Debug, Clone)]
struct TypeCandidate {
    non_empty: usize,
    integer_matches: usize,
    float_matches: usize,
    date_matches: usize,
}

impl TypeCandidate {
    fn new() -> Self {
        Self {
            non_empty: 0,
            integer_matches: 0,
            float_matches: 0,
            date_matches: 0,
        }
    }

    fn update(&mut self, value: &str) {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return;
        }
        self.non_empty += 1;
        if trimmed.parse::<i64>().is_ok() {
            self.integer_matches += 1;
            self.float_matches += 1;
            return;
        }
        if trimmed.parse::<f64>().is_ok() {
            self.float_matches += 1;
            return;
        }
        if parse_naive_date(trimmed).is_ok() {
            self.date_matches += 1;
        }
    }

    fn decide(&self) -> ColumnType {
        if self.non_empty == 0 {
            ColumnType::Text
        } else if self.integer_matches == self.non_empty {
            ColumnType::Integer
        } else if self.float_matches == self.non_empty {
            ColumnType::Float
        } else if self.date_matches == self.non_empty {
            ColumnType::Date
        } else {
            ColumnType::Text
        }
    }
}

/// Infers a schema from raw headers and rows, normalizing every label
/// and sampling up to 2 000 rows per column for type detection.
pub fn infer_schema(headers: &[String], rows: &[Vec<String>]) -> Schema {
    let mut candidates = vec![TypeCandidate::new(); headers.len()];
    for row in rows.iter().take(DEFAULT_SAMPLE_ROWS) {
        for (idx, candidate) in candidates.iter_mut().enumerate() {
            if let Some(cell) = row.get(idx) {
                candidate.update(cell);
            }
        }
    }

    let columns = headers
        .iter()
        .enumerate()
        .map(|(idx, header)| ColumnMeta {
            name: normalize_label(header),
            datatype: candidates[idx].decide(),
        })
        .collect();
    Schema { columns }
}
