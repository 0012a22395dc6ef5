//! Household row normalization.
//!
//! # Responsibility
//! - Split one legacy household row into up to two Person records.
//! - Apply status classification, shirt-size and phone normalization.
//! - Record the migration key and sponsor search list for later phases.
//!
//! # Invariants
//! - A gender's Person exists only when that gender's first name is present.
//! - Exactly one phone is preferred when any phone is present.
//! - Spouses emitted from the same row reference each other.

use crate::identity::IdentityAllocator;
use crate::model::person::{
    EmailAddress, Gender, MigrationKey, Person, PersonStatus, PhoneNumber, PostalAddress,
};
use crate::source::RawRow;
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

static NON_DIGIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\D").expect("valid digit regex"));

const COL_HOUSEHOLD_ID: &str = "AddressID";
const COL_LAST_NAME: &str = "LastName";
const COL_PASTOR: &str = "Pastor";
const COL_STREET: &str = "Address";
const COL_CITY: &str = "City";
const COL_STATE: &str = "StateOrProvince";
const COL_ZIP: &str = "PostalCode";
const COL_CHURCH: &str = "Church";
const COL_HOME_PHONE: &str = "Home Phone";
const COL_SPONSOR: &str = "Sponsor ID#";
const COL_FEMALE_SPONSOR: &str = "Sponsor Female ID#";

/// Builds the migration key for one gender of one household.
pub fn migration_key(household_id: &str, gender: Gender) -> MigrationKey {
    format!("{household_id}{}", gender.label())
}

/// Normalizes a legacy shirt size, falling back to the gender default.
pub fn normalize_shirt_size(raw: Option<&str>, gender: Gender) -> String {
    match raw.map(str::trim).filter(|value| !value.is_empty()) {
        None => default_shirt_size(gender).to_string(),
        Some("Large") => "L".to_string(),
        Some("Medium") => "M".to_string(),
        Some("Small") => "S".to_string(),
        Some(other) => other.to_string(),
    }
}

fn default_shirt_size(gender: Gender) -> &'static str {
    match gender {
        Gender::Male => "XL",
        Gender::Female => "M",
    }
}

/// Strips everything but digits from a phone cell.
pub fn phone_digits(raw: &str) -> String {
    NON_DIGIT_RE.replace_all(raw, "").into_owned()
}

/// Ordered sponsor keys for one person.
///
/// Women try their explicit female-sponsor key first; the shared sponsor key
/// is then tried as own gender before the opposite gender.
pub fn sponsor_search_list(row: &RawRow, gender: Gender) -> Vec<MigrationKey> {
    let mut search = Vec::new();
    if gender == Gender::Female {
        if let Some(female_sponsor) = row.key_text(COL_FEMALE_SPONSOR) {
            search.push(migration_key(&female_sponsor, Gender::Female));
        }
    }
    if let Some(sponsor) = row.key_text(COL_SPONSOR) {
        search.push(migration_key(&sponsor, gender));
        search.push(migration_key(&sponsor, gender.opposite()));
    }
    search
}

/// Maps household rows from one source table into Person records.
#[derive(Debug, Clone, Copy, Default)]
pub struct PersonNormalizer {
    status_override: Option<PersonStatus>,
}

impl PersonNormalizer {
    /// Normalizer for active rows; status comes from each row's status code.
    pub fn new() -> Self {
        Self {
            status_override: None,
        }
    }

    /// Normalizer for archived rows; every person gets `status`.
    pub fn with_status_override(status: PersonStatus) -> Self {
        Self {
            status_override: Some(status),
        }
    }

    /// Normalizes every row, preserving row order (male before female).
    pub fn normalize_rows(&self, rows: &[RawRow], ids: &mut dyn IdentityAllocator) -> Vec<Person> {
        rows.iter()
            .flat_map(|row| self.normalize_row(row, ids))
            .collect()
    }

    /// Splits one household row into its male and female members.
    pub fn normalize_row(&self, row: &RawRow, ids: &mut dyn IdentityAllocator) -> Vec<Person> {
        let male = self.parse_person(row, Gender::Male, ids);
        let mut female = self.parse_person(row, Gender::Female, ids);

        let mut people = Vec::with_capacity(2);
        if let Some(mut male) = male {
            if let Some(female) = female.as_mut() {
                male.spouse = Some(female.summary());
                female.spouse = Some(male.summary());
            }
            people.push(male);
        }
        people.extend(female);
        people
    }

    fn parse_person(
        &self,
        row: &RawRow,
        gender: Gender,
        ids: &mut dyn IdentityAllocator,
    ) -> Option<Person> {
        let prefix = gender.label();
        let first_name = row.text(&format!("{prefix} First Name"))?;
        let last_name = row.text(COL_LAST_NAME).unwrap_or_default();

        let status = self.status_override.unwrap_or_else(|| {
            PersonStatus::from_legacy_code(row.int(&format!("Status {prefix}")))
        });

        let mut person = Person::new(ids.allocate(), gender, first_name, last_name, status);
        person.is_pastor = row.flag(COL_PASTOR);
        person.address = PostalAddress::new(
            row.text(COL_STREET),
            row.text(COL_CITY),
            row.text(COL_STATE),
            row.text(COL_ZIP),
        );
        person.preferred_name = row.text(&format!("{prefix} Pref Name"));
        person.birth_date = row.text(&format!("{prefix} DOB"));
        person.church = row.text(COL_CHURCH);
        person.candidate_on =
            row.key_text_any(&[format!("{prefix}Weekend#"), format!("{prefix}Weekend #")]);
        person.shirt_size =
            normalize_shirt_size(row.text(&format!("{prefix}ShirtSize")).as_deref(), gender);
        person.phone_numbers = collect_phones(row, gender);
        person.emails = row
            .text(&format!("Email {prefix}"))
            .map(|address| EmailAddress {
                address,
                is_preferred: true,
            })
            .into_iter()
            .collect();
        person.sponsor_search = sponsor_search_list(row, gender);

        match row.text(COL_HOUSEHOLD_ID) {
            Some(household_id) => {
                person.migration_keys.insert(migration_key(&household_id, gender));
            }
            None => debug!(
                "event=person_normalize module=service status=no_key gender={} person_id={}",
                gender, person.id
            ),
        }

        Some(person)
    }
}

struct PhoneField {
    column: String,
    label: &'static str,
    can_txt: bool,
}

fn collect_phones(row: &RawRow, gender: Gender) -> Vec<PhoneNumber> {
    let prefix = gender.label();
    let fields = [
        PhoneField {
            column: format!("{prefix} Cell Phone"),
            label: "cell",
            can_txt: true,
        },
        PhoneField {
            column: format!("{prefix} Work Phone"),
            label: "work",
            can_txt: false,
        },
        PhoneField {
            column: COL_HOME_PHONE.to_string(),
            label: "home",
            can_txt: false,
        },
    ];

    let mut phones: Vec<PhoneNumber> = Vec::new();
    for field in fields {
        let Some(raw) = row.text(&field.column) else {
            continue;
        };
        let digits = phone_digits(&raw);
        if digits.is_empty() {
            continue;
        }
        phones.push(PhoneNumber {
            digits,
            is_preferred: phones.is_empty(),
            can_txt: field.can_txt,
            label: field.label.to_string(),
        });
    }
    phones
}
