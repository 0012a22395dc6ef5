//! Weekend and attendance model.
//!
//! # Responsibility
//! - Define one retreat instance per (gender, weekend number).
//! - Represent attendance before and after reference resolution.
//!
//! # Invariants
//! - `(gender, weekend_number)` is unique across a run.
//! - After resolution every attendance link is `Resolved`.

use crate::identity::EntityId;
use crate::model::person::{Gender, MigrationKey, PersonSummary};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Lookup key for the weekend container.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WeekendKey {
    pub gender: Gender,
    pub number: String,
}

impl WeekendKey {
    pub fn new(gender: Gender, number: impl Into<String>) -> Self {
        Self {
            gender,
            number: number.into(),
        }
    }
}

impl Display for WeekendKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} #{}", self.gender.label(), self.number)
    }
}

/// Attendance whose person and role are still legacy keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingLink {
    pub migration_person_id: MigrationKey,
    pub migration_role_id: Option<String>,
}

/// Attendance bound to canonical entities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedLink {
    pub person: PersonSummary,
    pub role_id: EntityId,
    pub role_title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttendanceLink {
    Resolved(ResolvedLink),
    Pending(PendingLink),
}

/// A person's participation record within a weekend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attendance {
    #[serde(flatten)]
    pub link: AttendanceLink,
    pub is_confirmed: bool,
    pub did_attend: bool,
}

impl Attendance {
    /// Creates a confirmed, attended stub from legacy keys.
    pub fn pending(person_key: impl Into<MigrationKey>, role_key: Option<String>) -> Self {
        Self {
            link: AttendanceLink::Pending(PendingLink {
                migration_person_id: person_key.into(),
                migration_role_id: role_key,
            }),
            is_confirmed: true,
            did_attend: true,
        }
    }

    /// Creates a confirmed, attended record bound to canonical entities.
    pub fn resolved(person: PersonSummary, role_id: EntityId, role_title: impl Into<String>) -> Self {
        Self {
            link: AttendanceLink::Resolved(ResolvedLink {
                person,
                role_id,
                role_title: role_title.into(),
            }),
            is_confirmed: true,
            did_attend: true,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self.link, AttendanceLink::Resolved(_))
    }

    pub fn resolved_link(&self) -> Option<&ResolvedLink> {
        match &self.link {
            AttendanceLink::Resolved(link) => Some(link),
            AttendanceLink::Pending(_) => None,
        }
    }

    pub fn pending_link(&self) -> Option<&PendingLink> {
        match &self.link {
            AttendanceLink::Pending(link) => Some(link),
            AttendanceLink::Resolved(_) => None,
        }
    }
}

/// One retreat instance for a gender and sequence number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Weekend {
    #[serde(rename = "_id")]
    pub id: EntityId,
    pub community: String,
    #[serde(with = "gender_label")]
    pub gender: Gender,
    pub weekend_number: String,
    pub attendees: Vec<Attendance>,
}

impl Weekend {
    pub fn new(
        id: EntityId,
        community: impl Into<String>,
        gender: Gender,
        weekend_number: impl Into<String>,
    ) -> Self {
        Self {
            id,
            community: community.into(),
            gender,
            weekend_number: weekend_number.into(),
            attendees: Vec::new(),
        }
    }

    pub fn key(&self) -> WeekendKey {
        WeekendKey::new(self.gender, self.weekend_number.clone())
    }
}

/// Weekend genders are written with the capitalized label (`Male`/`Female`).
pub(crate) mod gender_label {
    use crate::model::person::Gender;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(gender: &Gender, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(gender.label())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Gender, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Gender::parse(&raw).ok_or_else(|| D::Error::custom(format!("unknown gender `{raw}`")))
    }
}
