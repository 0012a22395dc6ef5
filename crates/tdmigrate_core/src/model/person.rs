//! Person domain model.
//!
//! # Responsibility
//! - Define the canonical person record shared by rosters and sponsorships.
//! - Carry transient migration state (keys, sponsor search) until resolution.
//!
//! # Invariants
//! - `id` is stable and never reused for another person.
//! - At most one phone number has `is_preferred == true`.
//! - `migration_keys` and `sponsor_search` are never serialized.

use crate::identity::EntityId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

/// Raw legacy identifier, e.g. `17Male` for household 17's male member.
pub type MigrationKey = String;

/// Gender discriminator used by household rows and weekends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    /// Both genders in household-row processing order.
    pub const ALL: [Gender; 2] = [Gender::Male, Gender::Female];

    /// Capitalized label used by legacy column prefixes and weekend records.
    pub fn label(self) -> &'static str {
        match self {
            Self::Male => "Male",
            Self::Female => "Female",
        }
    }

    /// Lowercase form stored on person records.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Self::Male => Self::Female,
            Self::Female => Self::Male,
        }
    }

    /// Parses either the capitalized or the lowercase form.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "male" => Some(Self::Male),
            "female" => Some(Self::Female),
            _ => None,
        }
    }
}

impl Display for Gender {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Community membership state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersonStatus {
    /// Signed up for, or attended, a first weekend.
    Candidate,
    Active,
    Inactive,
    Deceased,
    /// Serialized as `not affiliated` to match the target store vocabulary.
    #[serde(rename = "not affiliated", alias = "not_affiliated")]
    NotAffiliated,
}

impl PersonStatus {
    /// Maps a legacy numeric status code.
    ///
    /// Codes outside the known table (including `None`) are not affiliated.
    pub fn from_legacy_code(code: Option<i64>) -> Self {
        match code {
            Some(1..=7) | Some(13) => Self::Candidate,
            Some(8..=10) => Self::Active,
            Some(12) => Self::Inactive,
            Some(15) => Self::Deceased,
            _ => Self::NotAffiliated,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Candidate => "candidate",
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Deceased => "deceased",
            Self::NotAffiliated => "not affiliated",
        }
    }
}

/// Household postal address. Country and label are fixed for legacy data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostalAddress {
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub country: String,
    pub label: String,
}

impl PostalAddress {
    pub const DEFAULT_COUNTRY: &'static str = "USA";
    pub const DEFAULT_LABEL: &'static str = "Home";

    pub fn new(
        street: Option<String>,
        city: Option<String>,
        state: Option<String>,
        zip: Option<String>,
    ) -> Self {
        Self {
            street,
            city,
            state,
            zip,
            country: Self::DEFAULT_COUNTRY.to_string(),
            label: Self::DEFAULT_LABEL.to_string(),
        }
    }

    /// Returns whether the city is present and non-blank.
    pub fn has_city(&self) -> bool {
        self.city.as_deref().is_some_and(|city| !city.trim().is_empty())
    }
}

/// Phone entry with digits only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhoneNumber {
    pub digits: String,
    pub is_preferred: bool,
    pub can_txt: bool,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailAddress {
    pub address: String,
    pub is_preferred: bool,
}

/// Denormalized reference to another person (spouse, sponsor, attendee).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonSummary {
    #[serde(rename = "_id")]
    pub id: EntityId,
    pub first_name: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub preferred_name: Option<String>,
    pub last_name: String,
}

/// One role served on one weekend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperienceEntry {
    pub role_title: String,
    pub weekend_number: String,
    #[serde(with = "crate::model::weekend::gender_label")]
    pub weekend_gender: Gender,
}

/// Canonical person record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    #[serde(rename = "_id")]
    pub id: EntityId,
    pub first_name: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub preferred_name: Option<String>,
    pub last_name: String,
    pub gender: Gender,
    pub is_pastor: bool,
    pub address: PostalAddress,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub birth_date: Option<String>,
    pub status: PersonStatus,
    pub shirt_size: String,
    pub phone_numbers: Vec<PhoneNumber>,
    pub emails: Vec<EmailAddress>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub church: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub spouse: Option<PersonSummary>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub sponsor: Option<PersonSummary>,
    /// Weekend number this person attended as a first-time candidate.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub candidate_on: Option<String>,
    #[serde(default)]
    pub experience: Vec<ExperienceEntry>,
    /// Every legacy key that resolves to this record. Cleared before output.
    #[serde(skip)]
    pub migration_keys: BTreeSet<MigrationKey>,
    /// Ordered sponsor keys to try during resolution. Cleared before output.
    #[serde(skip)]
    pub sponsor_search: Vec<MigrationKey>,
}

impl Person {
    /// Creates a person with empty optional fields and the given identity.
    pub fn new(
        id: EntityId,
        gender: Gender,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        status: PersonStatus,
    ) -> Self {
        Self {
            id,
            first_name: first_name.into(),
            preferred_name: None,
            last_name: last_name.into(),
            gender,
            is_pastor: false,
            address: PostalAddress::new(None, None, None, None),
            birth_date: None,
            status,
            shirt_size: String::new(),
            phone_numbers: Vec::new(),
            emails: Vec::new(),
            church: None,
            spouse: None,
            sponsor: None,
            candidate_on: None,
            experience: Vec::new(),
            migration_keys: BTreeSet::new(),
            sponsor_search: Vec::new(),
        }
    }

    /// Returns the display reference other records embed.
    pub fn summary(&self) -> PersonSummary {
        PersonSummary {
            id: self.id,
            first_name: self.first_name.clone(),
            preferred_name: self.preferred_name.clone(),
            last_name: self.last_name.clone(),
        }
    }

    /// Dedup grouping key: exact first and last name.
    pub fn name_key(&self) -> (String, String) {
        (self.first_name.clone(), self.last_name.clone())
    }

    pub fn preferred_phone(&self) -> Option<&PhoneNumber> {
        self.phone_numbers.iter().find(|phone| phone.is_preferred)
    }

    /// Drops migration-only state before the record leaves the core.
    pub fn clear_transient(&mut self) {
        self.migration_keys.clear();
        self.sponsor_search.clear();
    }
}
