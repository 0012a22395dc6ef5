//! Seating table catalog entry.

use crate::identity::EntityId;
use serde::{Deserialize, Serialize};

/// Named table group from the legacy table catalog.
///
/// `gender` keeps the catalog's own label (`Mens`, `Ladies`, ...) because the
/// legacy values do not map cleanly onto `Gender`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatingTable {
    #[serde(rename = "_id")]
    pub id: EntityId,
    pub name: Option<String>,
    pub gender: Option<String>,
}
