//! Raw row access for the legacy extract.
//!
//! # Responsibility
//! - Define the `RecordSource` contract used by the migration pipeline.
//! - Normalize loosely typed legacy cells into a small value model.
//! - Fetch several tables concurrently and join them before processing.
//!
//! # Invariants
//! - Any fetch failure aborts the whole batch; no partial table set is
//!   returned.
//! - Sources are read-only; fetching the same table twice yields the same
//!   rows.

use log::{error, info};
use std::collections::{BTreeMap, HashMap};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

mod memory;
mod sqlite;

pub use memory::MemoryRecordSource;
pub use sqlite::SqliteRecordSource;

pub type SourceResult<T> = Result<T, SourceError>;

/// Fatal failure while reading the legacy extract.
#[derive(Debug)]
pub enum SourceError {
    /// The extract file could not be opened.
    Open {
        path: String,
        source: rusqlite::Error,
    },
    /// The query for one table failed.
    Query {
        table: String,
        source: rusqlite::Error,
    },
    /// The source does not serve the requested table.
    MissingTable(String),
    /// A fetch worker panicked before returning rows.
    WorkerPanicked(String),
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open { path, source } => {
                write!(f, "failed to open legacy extract `{path}`: {source}")
            }
            Self::Query { table, source } => {
                write!(f, "failed to read table `{table}`: {source}")
            }
            Self::MissingTable(table) => write!(f, "table not found in source: `{table}`"),
            Self::WorkerPanicked(table) => write!(f, "fetch worker panicked for table `{table}`"),
        }
    }
}

impl Error for SourceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Open { source, .. } => Some(source),
            Self::Query { source, .. } => Some(source),
            Self::MissingTable(_) | Self::WorkerPanicked(_) => None,
        }
    }
}

/// One legacy cell.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl RawValue {
    /// Renders the value as trimmed text; blank and null become `None`.
    ///
    /// Integral reals render without a fraction so `42.0` and `42` produce the
    /// same key.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::Null => None,
            Self::Integer(value) => Some(value.to_string()),
            Self::Real(value) => match integral_real(*value) {
                Some(integer) => Some(integer.to_string()),
                None => Some(value.to_string()),
            },
            Self::Text(value) => {
                let trimmed = value.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            }
        }
    }

    /// Reads an integer from integer, integral real or numeric text cells.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Null => None,
            Self::Integer(value) => Some(*value),
            Self::Real(value) => integral_real(*value),
            Self::Text(value) => value.trim().parse().ok(),
        }
    }

    /// Reads a legacy yes/no cell. Access stores true as `-1`.
    pub fn as_flag(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Integer(value) => *value != 0,
            Self::Real(value) => *value != 0.0,
            Self::Text(value) => matches!(
                value.trim().to_ascii_lowercase().as_str(),
                "true" | "yes" | "y" | "1" | "-1"
            ),
        }
    }
}

/// Integer value of a real with no fraction that fits in `i64`.
fn integral_real(value: f64) -> Option<i64> {
    // i64::MAX is not representable; 2^63 is the first out-of-range float.
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    (value.is_finite() && value.fract() == 0.0 && value >= -LIMIT && value < LIMIT)
        .then_some(value as i64)
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for RawValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        Self::Real(value)
    }
}

impl From<bool> for RawValue {
    fn from(value: bool) -> Self {
        Self::Integer(if value { -1 } else { 0 })
    }
}

impl<T: Into<RawValue>> From<Option<T>> for RawValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// One legacy row keyed by column label.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    cells: BTreeMap<String, RawValue>,
}

impl RawRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a row from `(column, value)` pairs.
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<RawValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self {
            cells: pairs
                .into_iter()
                .map(|(column, value)| (column.into(), value.into()))
                .collect(),
        }
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<RawValue>) {
        self.cells.insert(column.into(), value.into());
    }

    pub fn get(&self, column: &str) -> Option<&RawValue> {
        self.cells.get(column)
    }

    /// Trimmed non-empty text of a column.
    pub fn text(&self, column: &str) -> Option<String> {
        self.get(column).and_then(RawValue::as_text)
    }

    /// First non-empty text among several accepted spellings of a column.
    pub fn text_any<S: AsRef<str>>(&self, columns: &[S]) -> Option<String> {
        columns.iter().find_map(|column| self.text(column.as_ref()))
    }

    /// Like `text`, but a numeric zero counts as missing.
    ///
    /// Legacy number columns default to 0 when unset, so 0 is never a real
    /// weekend number or household id.
    pub fn key_text(&self, column: &str) -> Option<String> {
        self.text(column).filter(|value| !is_zero_key(value))
    }

    /// First `key_text` among several accepted spellings of a column.
    pub fn key_text_any<S: AsRef<str>>(&self, columns: &[S]) -> Option<String> {
        columns.iter().find_map(|column| self.key_text(column.as_ref()))
    }

    pub fn int(&self, column: &str) -> Option<i64> {
        self.get(column).and_then(RawValue::as_int)
    }

    pub fn flag(&self, column: &str) -> bool {
        self.get(column).is_some_and(RawValue::as_flag)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

fn is_zero_key(value: &str) -> bool {
    value.parse::<f64>().is_ok_and(|number| number == 0.0)
}

/// Read-only access to raw legacy tables.
pub trait RecordSource {
    /// Returns every row of `table` in source order.
    fn fetch(&self, table: &str) -> SourceResult<Vec<RawRow>>;
}

/// Fetched tables keyed by name.
#[derive(Debug, Default)]
pub struct SourceTables {
    tables: HashMap<String, Vec<RawRow>>,
}

impl SourceTables {
    /// Rows of a fetched table; tables that were not requested are empty.
    pub fn rows(&self, table: &str) -> &[RawRow] {
        self.tables.get(table).map_or(&[], Vec::as_slice)
    }

    pub fn contains(&self, table: &str) -> bool {
        self.tables.contains_key(table)
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }
}

/// Fetches every table concurrently and waits for all of them.
///
/// # Errors
/// - Returns the first failure in `tables` order when any fetch fails.
/// - Returns `WorkerPanicked` when a fetch thread panics.
pub fn fetch_tables<S>(source: &S, tables: &[&str]) -> SourceResult<SourceTables>
where
    S: RecordSource + Sync + ?Sized,
{
    let started_at = Instant::now();
    info!(
        "event=source_fetch_all module=source status=start tables={}",
        tables.len()
    );

    let results: Vec<(String, SourceResult<Vec<RawRow>>)> = std::thread::scope(|scope| {
        let handles: Vec<_> = tables
            .iter()
            .map(|table| {
                let table = *table;
                (table, scope.spawn(move || source.fetch(table)))
            })
            .collect();

        handles
            .into_iter()
            .map(|(table, handle)| {
                let result = handle
                    .join()
                    .unwrap_or_else(|_| Err(SourceError::WorkerPanicked(table.to_string())));
                (table.to_string(), result)
            })
            .collect()
    });

    let mut fetched = SourceTables::default();
    for (table, result) in results {
        match result {
            Ok(rows) => {
                fetched.tables.insert(table, rows);
            }
            Err(err) => {
                error!(
                    "event=source_fetch_all module=source status=error duration_ms={} table={} error={}",
                    started_at.elapsed().as_millis(),
                    table,
                    err
                );
                return Err(err);
            }
        }
    }

    info!(
        "event=source_fetch_all module=source status=ok tables={} duration_ms={}",
        fetched.table_count(),
        started_at.elapsed().as_millis()
    );
    Ok(fetched)
}
