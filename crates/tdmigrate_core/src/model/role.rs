//! Weekend role model.

use crate::identity::EntityId;
use serde::{Deserialize, Serialize};

/// Title of the synthetic role bound to first-time participants.
pub const CANDIDATE_ROLE_TITLE: &str = "Candidate";

/// Title fragments that mark a head/leadership role.
pub const HEAD_ROLE_MARKERS: &[&str] = &["Head", "Rover", "Rector"];

/// Title fragments that mark a professor (talk-giving) role.
pub const PROFESSOR_ROLE_MARKERS: &[&str] = &["Prof"];

/// A job served on a weekend team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    #[serde(rename = "_id")]
    pub id: EntityId,
    pub title: String,
    pub is_head: bool,
    pub is_professor: bool,
}

impl Role {
    /// Creates a role with flags derived from the title.
    pub fn from_title(id: EntityId, title: impl Into<String>) -> Self {
        let title = title.into();
        Self {
            id,
            is_head: contains_any(&title, HEAD_ROLE_MARKERS),
            is_professor: contains_any(&title, PROFESSOR_ROLE_MARKERS),
            title,
        }
    }

    /// Creates the synthetic candidate role. Flags are always false.
    pub fn candidate(id: EntityId) -> Self {
        Self {
            id,
            title: CANDIDATE_ROLE_TITLE.to_string(),
            is_head: false,
            is_professor: false,
        }
    }
}

fn contains_any(title: &str, markers: &[&str]) -> bool {
    markers.iter().any(|marker| title.contains(marker))
}
