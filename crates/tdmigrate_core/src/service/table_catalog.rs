//! Seating table catalog normalization.

use crate::identity::IdentityAllocator;
use crate::model::table::SeatingTable;
use crate::source::RawRow;

const COL_TABLE_NAME: &str = "Table Name";
const COL_TABLE_GENDER: &str = "MensLadies";

/// Maps raw table-name rows into `SeatingTable` entities, preserving order.
pub fn build_table_catalog(rows: &[RawRow], ids: &mut dyn IdentityAllocator) -> Vec<SeatingTable> {
    rows.iter()
        .map(|row| SeatingTable {
            id: ids.allocate(),
            name: row.text(COL_TABLE_NAME),
            gender: row.text(COL_TABLE_GENDER),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::build_table_catalog;
    use crate::identity::SequentialIdAllocator;
    use crate::source::{RawRow, RawValue};

    #[test]
    fn one_table_per_row() {
        let rows = vec![
            RawRow::from_pairs([
                ("Table Name", RawValue::from("Peter")),
                ("MensLadies", RawValue::from("Mens")),
            ]),
            RawRow::from_pairs([("Table Name", RawValue::from("Ruth"))]),
        ];
        let tables = build_table_catalog(&rows, &mut SequentialIdAllocator::new());

        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].name.as_deref(), Some("Peter"));
        assert_eq!(tables[0].gender.as_deref(), Some("Mens"));
        assert_eq!(tables[1].gender, None);
        assert_ne!(tables[0].id, tables[1].id);
    }
}
