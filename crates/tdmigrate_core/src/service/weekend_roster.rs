//! Weekend rosters and candidate enrollment.
//!
//! # Responsibility
//! - Own the keyed weekend container and its single lazy-create operation.
//! - Turn per-gender experience rows into pending attendance stubs.
//! - Enroll first-time candidates on their candidate weekend.
//!
//! # Invariants
//! - At most one Weekend exists per (gender, weekend number).
//! - Staff stubs are pending; candidate enrollments are resolved on insert.
//! - Weekend order is creation order within a gender.

use crate::identity::IdentityAllocator;
use crate::model::person::{Gender, Person};
use crate::model::role::Role;
use crate::model::weekend::{Attendance, PendingLink, Weekend, WeekendKey};
use crate::service::person_normalizer::migration_key;
use crate::source::RawRow;
use log::{debug, info};
use std::collections::HashMap;

const COL_HOUSEHOLD_ID: &str = "AddressID";
const COL_ROLE_ID: &str = "JobID";
const COL_WEEKEND_NUMBER: &str = "BTD#";

/// Keyed container of every weekend seen during a run.
#[derive(Debug, Clone)]
pub struct WeekendBook {
    community: String,
    weekends: Vec<Weekend>,
    by_key: HashMap<WeekendKey, usize>,
}

impl WeekendBook {
    pub fn new(community: impl Into<String>) -> Self {
        Self {
            community: community.into(),
            weekends: Vec::new(),
            by_key: HashMap::new(),
        }
    }

    /// Returns the weekend for `(gender, number)`, creating it on first use.
    ///
    /// Idempotent: repeated calls with the same key return the same weekend
    /// and allocate no further ids.
    pub fn get_or_create(
        &mut self,
        gender: Gender,
        number: &str,
        ids: &mut dyn IdentityAllocator,
    ) -> &mut Weekend {
        let key = WeekendKey::new(gender, number);
        let position = match self.by_key.get(&key).copied() {
            Some(position) => position,
            None => {
                let position = self.weekends.len();
                self.weekends.push(Weekend::new(
                    ids.allocate(),
                    self.community.as_str(),
                    gender,
                    number,
                ));
                debug!("event=weekend_create module=weekend_roster status=ok weekend={key}");
                self.by_key.insert(key, position);
                position
            }
        };
        &mut self.weekends[position]
    }

    pub fn get(&self, gender: Gender, number: &str) -> Option<&Weekend> {
        self.by_key
            .get(&WeekendKey::new(gender, number))
            .map(|position| &self.weekends[*position])
    }

    pub fn len(&self) -> usize {
        self.weekends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weekends.is_empty()
    }

    pub fn weekends(&self) -> &[Weekend] {
        &self.weekends
    }

    pub(crate) fn weekends_mut(&mut self) -> &mut [Weekend] {
        &mut self.weekends
    }

    /// Weekends of one gender in creation order.
    pub fn weekends_for(&self, gender: Gender) -> impl Iterator<Item = &Weekend> + '_ {
        self.weekends
            .iter()
            .filter(move |weekend| weekend.gender == gender)
    }

    /// Unresolved stubs of one gender with the weekend that holds them.
    pub fn pending_stubs(&self, gender: Gender) -> impl Iterator<Item = (&Weekend, &PendingLink)> + '_ {
        self.weekends_for(gender).flat_map(|weekend| {
            weekend
                .attendees
                .iter()
                .filter_map(move |attendance| attendance.pending_link().map(|link| (weekend, link)))
        })
    }

    /// Final weekend list: male weekends first, then female, each in creation
    /// order.
    pub fn into_weekends(self) -> Vec<Weekend> {
        let mut weekends = self.weekends;
        weekends.sort_by_key(|weekend| weekend.gender);
        weekends
    }
}

/// Counts from building one gender's staff roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RosterSummary {
    pub gender: Gender,
    pub rows: usize,
    pub stubs: usize,
    /// Rows without a weekend number (blank or 0).
    pub dropped: usize,
    pub weekends_created: usize,
}

/// Appends one pending stub per experience row onto its weekend.
pub fn build_roster(
    book: &mut WeekendBook,
    gender: Gender,
    rows: &[RawRow],
    ids: &mut dyn IdentityAllocator,
) -> RosterSummary {
    let weekends_before = book.len();
    let mut summary = RosterSummary {
        gender,
        rows: rows.len(),
        stubs: 0,
        dropped: 0,
        weekends_created: 0,
    };

    for row in rows {
        let Some(number) = row.key_text(COL_WEEKEND_NUMBER) else {
            summary.dropped += 1;
            continue;
        };
        let person_key = row
            .text(COL_HOUSEHOLD_ID)
            .map(|household_id| migration_key(&household_id, gender))
            .unwrap_or_default();

        book.get_or_create(gender, &number, ids)
            .attendees
            .push(Attendance::pending(person_key, row.text(COL_ROLE_ID)));
        summary.stubs += 1;
    }

    summary.weekends_created = book.len() - weekends_before;
    info!(
        "event=roster_build module=weekend_roster status=ok gender={} rows={} stubs={} dropped={} weekends_created={}",
        gender, summary.rows, summary.stubs, summary.dropped, summary.weekends_created
    );
    summary
}

/// Adds a resolved Candidate attendance for every person with a candidate
/// weekend number. Returns the number of enrollments.
pub fn enroll_candidates(
    book: &mut WeekendBook,
    people: &[Person],
    candidate_role: &Role,
    ids: &mut dyn IdentityAllocator,
) -> usize {
    let mut enrolled = 0;
    for person in people {
        let Some(number) = person
            .candidate_on
            .as_deref()
            .map(str::trim)
            .filter(|number| !number.is_empty())
        else {
            continue;
        };

        book.get_or_create(person.gender, number, ids)
            .attendees
            .push(Attendance::resolved(
                person.summary(),
                candidate_role.id,
                candidate_role.title.as_str(),
            ));
        enrolled += 1;
    }

    info!("event=candidate_enroll module=weekend_roster status=ok enrolled={enrolled}");
    enrolled
}

#[cfg(test)]
mod tests {
    use super::WeekendBook;
    use crate::identity::SequentialIdAllocator;
    use crate::model::person::Gender;

    #[test]
    fn get_or_create_is_idempotent_per_gender_and_number() {
        let mut ids = SequentialIdAllocator::new();
        let mut book = WeekendBook::new("Test Community");

        let first = book.get_or_create(Gender::Male, "42", &mut ids).id;
        let again = book.get_or_create(Gender::Male, "42", &mut ids).id;
        let female = book.get_or_create(Gender::Female, "42", &mut ids).id;

        assert_eq!(first, again);
        assert_ne!(first, female);
        assert_eq!(book.len(), 2);
        assert_eq!(ids.issued(), 2);
        assert_eq!(book.get(Gender::Male, "42").unwrap().community, "Test Community");
    }

    #[test]
    fn into_weekends_orders_male_before_female() {
        let mut ids = SequentialIdAllocator::new();
        let mut book = WeekendBook::new("Test Community");
        book.get_or_create(Gender::Female, "3", &mut ids);
        book.get_or_create(Gender::Male, "9", &mut ids);
        book.get_or_create(Gender::Female, "1", &mut ids);
        book.get_or_create(Gender::Male, "2", &mut ids);

        let order: Vec<_> = book
            .into_weekends()
            .into_iter()
            .map(|weekend| (weekend.gender, weekend.weekend_number))
            .collect();
        assert_eq!(
            order,
            vec![
                (Gender::Male, "9".to_string()),
                (Gender::Male, "2".to_string()),
                (Gender::Female, "3".to_string()),
                (Gender::Female, "1".to_string()),
            ]
        );
    }
}
