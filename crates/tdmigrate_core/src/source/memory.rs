//! In-memory record source for tests and pre-loaded extracts.

use super::{RawRow, RecordSource, SourceError, SourceResult};
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct MemoryRecordSource {
    tables: HashMap<String, Vec<RawRow>>,
}

impl MemoryRecordSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) one table.
    pub fn insert_table(&mut self, table: impl Into<String>, rows: Vec<RawRow>) {
        self.tables.insert(table.into(), rows);
    }

    /// Builder-style variant of `insert_table`.
    pub fn with_table(mut self, table: impl Into<String>, rows: Vec<RawRow>) -> Self {
        self.insert_table(table, rows);
        self
    }
}

impl RecordSource for MemoryRecordSource {
    fn fetch(&self, table: &str) -> SourceResult<Vec<RawRow>> {
        self.tables
            .get(table)
            .cloned()
            .ok_or_else(|| SourceError::MissingTable(table.to_string()))
    }
}
