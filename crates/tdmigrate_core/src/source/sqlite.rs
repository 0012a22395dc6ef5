//! SQLite-backed record source over an exported legacy extract.
//!
//! # Responsibility
//! - Open the extract read-only and stream one table into raw rows.
//! - Emit `source_fetch` logging events with duration and status.
//!
//! # Invariants
//! - Connections are opened read-only; the extract is never mutated.
//! - Each fetch opens its own connection so concurrent fetches share no
//!   connection state.

use super::{RawRow, RawValue, RecordSource, SourceError, SourceResult};
use log::{error, info};
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Reads tables from a SQLite file produced by exporting the legacy database.
#[derive(Debug, Clone)]
pub struct SqliteRecordSource {
    path: PathBuf,
}

impl SqliteRecordSource {
    /// Creates a source and verifies the file can be opened.
    ///
    /// # Errors
    /// - Returns `SourceError::Open` when the file is missing or unreadable.
    pub fn open(path: impl AsRef<Path>) -> SourceResult<Self> {
        let source = Self {
            path: path.as_ref().to_path_buf(),
        };
        source.connect()?;
        Ok(source)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> SourceResult<Connection> {
        let conn = Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|err| SourceError::Open {
            path: self.path.display().to_string(),
            source: err,
        })?;
        conn.busy_timeout(Duration::from_secs(5))
            .map_err(|err| SourceError::Open {
                path: self.path.display().to_string(),
                source: err,
            })?;
        Ok(conn)
    }

    fn read_table(&self, conn: &Connection, table: &str) -> Result<Vec<RawRow>, rusqlite::Error> {
        let mut stmt = conn.prepare(&format!("SELECT * FROM {};", quote_identifier(table)))?;
        let columns: Vec<String> = stmt
            .column_names()
            .into_iter()
            .map(str::to_string)
            .collect();

        let mut rows = stmt.query([])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let mut raw = RawRow::new();
            for (index, column) in columns.iter().enumerate() {
                raw.insert(column.as_str(), value_from_sqlite(row.get_ref(index)?));
            }
            out.push(raw);
        }
        Ok(out)
    }
}

impl RecordSource for SqliteRecordSource {
    fn fetch(&self, table: &str) -> SourceResult<Vec<RawRow>> {
        let started_at = Instant::now();
        info!("event=source_fetch module=source status=start table={table}");

        let conn = self.connect()?;
        match self.read_table(&conn, table) {
            Ok(rows) => {
                info!(
                    "event=source_fetch module=source status=ok table={} rows={} duration_ms={}",
                    table,
                    rows.len(),
                    started_at.elapsed().as_millis()
                );
                Ok(rows)
            }
            Err(err) => {
                error!(
                    "event=source_fetch module=source status=error table={} duration_ms={} error_code=query_failed error={}",
                    table,
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(SourceError::Query {
                    table: table.to_string(),
                    source: err,
                })
            }
        }
    }
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn value_from_sqlite(value: ValueRef<'_>) -> RawValue {
    match value {
        ValueRef::Null => RawValue::Null,
        ValueRef::Integer(value) => RawValue::Integer(value),
        ValueRef::Real(value) => RawValue::Real(value),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            RawValue::Text(String::from_utf8_lossy(bytes).into_owned())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{quote_identifier, SqliteRecordSource};
    use crate::source::{RawValue, RecordSource, SourceError};
    use rusqlite::Connection;

    #[test]
    fn quote_identifier_escapes_embedded_quotes() {
        assert_eq!(quote_identifier("Table Names"), "\"Table Names\"");
        assert_eq!(quote_identifier("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn fetch_reads_mixed_cell_types() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("extract.sqlite3");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TABLE \"Team Jobs\" (ID INTEGER, Job TEXT, Weight REAL);
             INSERT INTO \"Team Jobs\" VALUES (3, 'Rector', 1.5);
             INSERT INTO \"Team Jobs\" VALUES (4, NULL, NULL);",
        )
        .unwrap();
        drop(conn);

        let source = SqliteRecordSource::open(&path).unwrap();
        let rows = source.fetch("Team Jobs").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("ID"), Some(&RawValue::Integer(3)));
        assert_eq!(rows[0].text("Job").as_deref(), Some("Rector"));
        assert_eq!(rows[0].get("Weight"), Some(&RawValue::Real(1.5)));
        assert_eq!(rows[1].get("Job"), Some(&RawValue::Null));
    }

    #[test]
    fn fetch_unknown_table_is_query_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.sqlite3");
        Connection::open(&path)
            .unwrap()
            .execute_batch("CREATE TABLE placeholder (id INTEGER);")
            .unwrap();

        let source = SqliteRecordSource::open(&path).unwrap();
        let err = source.fetch("Addresses").unwrap_err();
        assert!(matches!(err, SourceError::Query { ref table, .. } if table == "Addresses"));
    }

    #[test]
    fn open_missing_file_is_open_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = SqliteRecordSource::open(dir.path().join("missing.sqlite3")).unwrap_err();
        assert!(matches!(err, SourceError::Open { .. }));
    }
}
