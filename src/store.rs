//! SQLite store access.
//!
//! The store holds one table per ingested sheet. The ingestion pipeline
//! is the only writer; the dashboard opens the same file read-only.
//! Each table replacement runs in its own transaction, so a failure
//! mid-run leaves previously written sheets committed.
//!
//! Cell binding normalizes whitespace: every cell is trimmed before
//! storage and a cell that is empty after trimming is stored as NULL.
//! This applies uniformly to all sheets, including pass-through tables
//! the analytical query never reads.

use std::path::Path;

use rusqlite::{Connection, OpenFlags, params_from_iter, types::Value as SqlValue};

use crate::{
    data::{parse_f64, parse_i64, parse_naive_date},
    error::PipelineError,
    schema::{ColumnType, Schema},
};

pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self, PipelineError> {
        let conn = Connection::open(path)?;
        Ok(Self { conn })
    }

    pub fn open_read_only(path: &Path) -> Result<Self, PipelineError> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Ok(Self { conn })
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self, PipelineError> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Drops and recreates `name`, then bulk-inserts `rows`, all inside
    /// one transaction. Schema and data are both reset; re-running with
    /// identical input reproduces identical table contents.
    pub fn replace_table(
        &mut self,
        name: &str,
        schema: &Schema,
        rows: &[Vec<String>],
    ) -> Result<usize, PipelineError> {
        let tx = self.conn.transaction()?;

        tx.execute_batch(&format!("DROP TABLE IF EXISTS {}", quote_ident(name)))?;
        let column_decls = schema
            .columns
            .iter()
            .map(|c| format!("{} {}", quote_ident(&c.name), c.datatype.sql_decl()))
            .collect::<Vec<_>>()
            .join(", ");
        tx.execute_batch(&format!(
            "CREATE TABLE {} ({column_decls})",
            quote_ident(name)
        ))?;

        let placeholders = (1..=schema.columns.len())
            .map(|i| format!("?{i}"))
            .collect::<Vec<_>>()
            .join(", ");
        let insert_sql = format!("INSERT INTO {} VALUES ({placeholders})", quote_ident(name));
        let mut inserted = 0usize;
        {
            let mut statement = tx.prepare(&insert_sql)?;
            for row in rows {
                let bound = schema
                    .columns
                    .iter()
                    .enumerate()
                    .map(|(idx, column)| {
                        let raw = row.get(idx).map(|s| s.as_str()).unwrap_or("");
                        bind_cell(raw, column.datatype)
                    })
                    .collect::<Vec<_>>();
                statement.execute(params_from_iter(bound))?;
                inserted += 1;
            }
        }

        tx.commit()?;
        Ok(inserted)
    }

    pub fn table_exists(&self, name: &str) -> Result<bool, PipelineError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [name],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Column names and declared types via `PRAGMA table_info`.
    pub fn table_columns(&self, name: &str) -> Result<Vec<(String, String)>, PipelineError> {
        let sql = format!("PRAGMA table_info({})", quote_ident(name));
        let mut statement = self.conn.prepare(&sql)?;
        let columns = statement
            .query_map([], |row| {
                Ok((row.get::<_, String>(1)?, row.get::<_, String>(2)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(columns)
    }
}

/// Binds a raw cell according to the column's inferred type. Cells that
/// fall outside the inference sample and fail the typed parse are kept
/// as text rather than lost; the derivation layer owns the drop policy.
fn bind_cell(raw: &str, datatype: ColumnType) -> SqlValue {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return SqlValue::Null;
    }
    match datatype {
        ColumnType::Integer => match parse_i64(trimmed) {
            Ok(value) => SqlValue::Integer(value),
            Err(_) => SqlValue::Text(trimmed.to_string()),
        },
        ColumnType::Float => match parse_f64(trimmed) {
            Ok(value) => SqlValue::Real(value),
            Err(_) => SqlValue::Text(trimmed.to_string()),
        },
        ColumnType::Date => match parse_naive_date(trimmed) {
            Ok(date) => SqlValue::Text(date.format("%Y-%m-%d").to_string()),
            Err(_) => SqlValue::Text(trimmed.to_string()),
        },
        ColumnType::Text => SqlValue::Text(trimmed.to_string()),
    }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::infer_schema;

    fn sample_schema_and_rows() -> (Schema, Vec<Vec<String>>) {
        let headers = vec!["Store Num".to_string(), "Region".to_string()];
        let rows = vec![
            vec!["1".to_string(), "West".to_string()],
            vec!["2".to_string(), "East".to_string()],
        ];
        let schema = infer_schema(&headers, &rows);
        (schema, rows)
    }

    #[test]
    fn replace_table_resets_schema_and_data() {
        let mut store = Store::open_in_memory().expect("open store");
        let (schema, rows) = sample_schema_and_rows();
        assert_eq!(
            store.replace_table("Store", &schema, &rows).expect("write"),
            2
        );

        // Second replacement with fewer rows fully supersedes the first.
        store
            .replace_table("Store", &schema, &rows[..1])
            .expect("rewrite");
        let count: i64 = store
            .connection()
            .query_row("SELECT COUNT(*) FROM Store", [], |row| row.get(0))
            .expect("count");
        assert_eq!(count, 1);
    }

    #[test]
    fn table_columns_reports_normalized_names() {
        let mut store = Store::open_in_memory().expect("open store");
        let (schema, rows) = sample_schema_and_rows();
        store.replace_table("Store", &schema, &rows).expect("write");

        let columns = store.table_columns("Store").expect("columns");
        assert_eq!(columns[0].0, "Store_Num");
        assert_eq!(columns[0].1, "INTEGER");
        assert_eq!(columns[1].0, "Region");
        assert_eq!(columns[1].1, "TEXT");
    }

    #[test]
    fn cells_are_trimmed_and_empty_cells_stored_as_null() {
        let mut store = Store::open_in_memory().expect("open store");
        let headers = vec!["Region".to_string(), "Notes".to_string()];
        let rows = vec![vec!["  West  ".to_string(), "   ".to_string()]];
        let schema = infer_schema(&headers, &rows);
        store.replace_table("Store", &schema, &rows).expect("write");

        let (region, notes): (String, Option<String>) = store
            .connection()
            .query_row("SELECT Region, Notes FROM Store", [], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })
            .expect("read back");
        assert_eq!(region, "West");
        assert_eq!(notes, None);
    }

    #[test]
    fn table_exists_distinguishes_missing_tables() {
        let mut store = Store::open_in_memory().expect("open store");
        let (schema, rows) = sample_schema_and_rows();
        store.replace_table("Store", &schema, &rows).expect("write");
        assert!(store.table_exists("Store").expect("exists"));
        assert!(!store.table_exists("Orders").expect("exists"));
    }
}
