//! Person deduplication and the migration-key index.
//!
//! # Responsibility
//! - Collapse records that share an exact (first name, last name).
//! - Merge fields by the fixed priority rule.
//! - Build the immutable migration-key -> canonical person index.
//! - Re-point spouse references at canonical records.
//!
//! # Invariants
//! - Every migration key of every input record resolves to exactly one
//!   canonical record.
//! - The canonical record keeps the id of the first record seen.
//! - Spouse links are symmetric and never reference a discarded record.

use crate::identity::EntityId;
use crate::model::person::{MigrationKey, Person, PersonStatus};
use log::{info, warn};
use std::collections::HashMap;

/// Read-only migration-key -> canonical person lookup.
///
/// Positions refer to the deduplicated person list the index was built with.
#[derive(Debug, Clone, Default)]
pub struct PersonIndex {
    by_key: HashMap<MigrationKey, usize>,
}

impl PersonIndex {
    /// Builds the index from a finished person list.
    ///
    /// A key claimed by two canonical records stays with the first one.
    pub fn build(people: &[Person]) -> Self {
        let mut by_key: HashMap<MigrationKey, usize> = HashMap::new();
        for (position, person) in people.iter().enumerate() {
            for key in &person.migration_keys {
                if let Some(existing) = by_key.get(key) {
                    warn!(
                        "event=person_index module=dedup status=key_conflict key={} kept_id={} ignored_id={}",
                        key, people[*existing].id, person.id
                    );
                    continue;
                }
                by_key.insert(key.clone(), position);
            }
        }
        Self { by_key }
    }

    /// Position of the canonical person for `key`.
    pub fn position(&self, key: &str) -> Option<usize> {
        self.by_key.get(key).copied()
    }

    /// Canonical person for `key`.
    pub fn resolve<'p>(&self, people: &'p [Person], key: &str) -> Option<&'p Person> {
        self.position(key).and_then(|position| people.get(position))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.by_key.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}

/// Result of one deduplication pass.
#[derive(Debug, Clone)]
pub struct DedupOutcome {
    pub people: Vec<Person>,
    pub index: PersonIndex,
    /// Number of records folded into another record.
    pub merged: usize,
    /// Spouse links removed because they were no longer reciprocated.
    pub spouse_links_dropped: usize,
}

/// Deduplicates `people` (active rows first, archived rows after).
pub fn deduplicate(people: Vec<Person>) -> DedupOutcome {
    let input_len = people.len();
    let mut canonical: Vec<Person> = Vec::with_capacity(input_len);
    let mut by_name: HashMap<(String, String), usize> = HashMap::new();
    let mut position_of_id: HashMap<EntityId, usize> = HashMap::new();
    let mut merged = 0;

    for person in people {
        let name_key = person.name_key();
        match by_name.get(&name_key).copied() {
            Some(position) => {
                position_of_id.insert(person.id, position);
                let kept = std::mem::replace(
                    &mut canonical[position],
                    Person::new(EntityId::nil(), person.gender, "", "", PersonStatus::NotAffiliated),
                );
                canonical[position] = merge_person(kept, person);
                merged += 1;
            }
            None => {
                let position = canonical.len();
                by_name.insert(name_key, position);
                position_of_id.insert(person.id, position);
                canonical.push(person);
            }
        }
    }

    let spouse_links_dropped = reconcile_spouses(&mut canonical, &position_of_id);
    let index = PersonIndex::build(&canonical);

    info!(
        "event=dedup module=dedup status=ok input={} canonical={} merged={} keys={} spouse_links_dropped={}",
        input_len,
        canonical.len(),
        merged,
        index.len(),
        spouse_links_dropped
    );

    DedupOutcome {
        people: canonical,
        index,
        merged,
        spouse_links_dropped,
    }
}

/// Folds `duplicate` into `kept`.
///
/// When `kept` is active with a known city its fields win and the duplicate
/// only fills gaps; otherwise the duplicate's fields win. The result keeps
/// `kept.id` and the union of both migration key sets.
pub fn merge_person(kept: Person, duplicate: Person) -> Person {
    let kept_id = kept.id;
    let mut keys = kept.migration_keys.clone();
    keys.extend(duplicate.migration_keys.iter().cloned());

    let kept_wins = kept.status == PersonStatus::Active && kept.address.has_city();
    let (primary, fallback) = if kept_wins {
        (kept, duplicate)
    } else {
        (duplicate, kept)
    };

    let mut merged = fill_missing(primary, fallback);
    merged.id = kept_id;
    merged.migration_keys = keys;
    merged
}

fn fill_missing(mut primary: Person, fallback: Person) -> Person {
    fill_option(&mut primary.preferred_name, fallback.preferred_name);
    fill_string(&mut primary.last_name, fallback.last_name);
    primary.is_pastor |= fallback.is_pastor;
    fill_option(&mut primary.address.street, fallback.address.street);
    fill_option(&mut primary.address.city, fallback.address.city);
    fill_option(&mut primary.address.state, fallback.address.state);
    fill_option(&mut primary.address.zip, fallback.address.zip);
    fill_option(&mut primary.birth_date, fallback.birth_date);
    fill_string(&mut primary.shirt_size, fallback.shirt_size);
    fill_vec(&mut primary.phone_numbers, fallback.phone_numbers);
    fill_vec(&mut primary.emails, fallback.emails);
    fill_option(&mut primary.church, fallback.church);
    fill_option(&mut primary.spouse, fallback.spouse);
    fill_option(&mut primary.sponsor, fallback.sponsor);
    fill_option(&mut primary.candidate_on, fallback.candidate_on);
    fill_vec(&mut primary.experience, fallback.experience);
    fill_vec(&mut primary.sponsor_search, fallback.sponsor_search);
    primary
}

fn fill_option<T>(slot: &mut Option<T>, fallback: Option<T>) {
    if slot.is_none() {
        *slot = fallback;
    }
}

fn fill_string(slot: &mut String, fallback: String) {
    if slot.trim().is_empty() {
        *slot = fallback;
    }
}

fn fill_vec<T>(slot: &mut Vec<T>, fallback: Vec<T>) {
    if slot.is_empty() {
        *slot = fallback;
    }
}

/// Re-points spouse references at canonical records and drops links that
/// are self-referencing or not reciprocated. Returns the number dropped.
fn reconcile_spouses(people: &mut [Person], position_of_id: &HashMap<EntityId, usize>) -> usize {
    let targets: Vec<Option<usize>> = people
        .iter()
        .enumerate()
        .map(|(position, person)| {
            let spouse = person.spouse.as_ref()?;
            let target = position_of_id.get(&spouse.id).copied()?;
            (target != position).then_some(target)
        })
        .collect();

    let mut dropped = 0;
    let summaries: Vec<_> = people.iter().map(Person::summary).collect();
    for (position, target) in targets.iter().enumerate() {
        let had_spouse = people[position].spouse.is_some();
        let reciprocated = target.is_some_and(|other| targets[other] == Some(position));

        if reciprocated {
            people[position].spouse = target.map(|other| summaries[other].clone());
        } else if had_spouse {
            warn!(
                "event=spouse_reconcile module=dedup status=dropped person_id={}",
                people[position].id
            );
            people[position].spouse = None;
            dropped += 1;
        }
    }
    dropped
}

#[cfg(test)]
mod tests {
    use super::{deduplicate, merge_person};
    use crate::model::person::{Gender, Person, PersonStatus, PhoneNumber};
    use uuid::Uuid;

    fn person(id: u128, first: &str, last: &str, key: &str) -> Person {
        let mut person = Person::new(
            Uuid::from_u128(id),
            Gender::Male,
            first,
            last,
            PersonStatus::Candidate,
        );
        person.migration_keys.insert(key.to_string());
        person
    }

    fn phone(digits: &str) -> PhoneNumber {
        PhoneNumber {
            digits: digits.to_string(),
            is_preferred: true,
            can_txt: true,
            label: "cell".to_string(),
        }
    }

    #[test]
    fn active_kept_record_with_city_wins_and_fills_gaps() {
        let mut kept = person(1, "Ann", "Lee", "1Female");
        kept.status = PersonStatus::Active;
        kept.address.city = Some("Springfield".to_string());

        let mut incoming = person(2, "Ann", "Lee", "7Male");
        incoming.status = PersonStatus::Candidate;
        incoming.phone_numbers = vec![phone("5551111")];

        let merged = merge_person(kept, incoming);
        assert_eq!(merged.id, Uuid::from_u128(1));
        assert_eq!(merged.status, PersonStatus::Active);
        assert_eq!(merged.address.city.as_deref(), Some("Springfield"));
        assert_eq!(merged.phone_numbers, vec![phone("5551111")]);
        assert!(merged.migration_keys.contains("1Female"));
        assert!(merged.migration_keys.contains("7Male"));
    }

    #[test]
    fn duplicate_wins_when_kept_is_not_active() {
        let mut kept = person(1, "Ann", "Lee", "1Female");
        kept.status = PersonStatus::Inactive;
        kept.address.city = Some("Springfield".to_string());
        kept.shirt_size = "M".to_string();

        let mut incoming = person(2, "Ann", "Lee", "7Male");
        incoming.status = PersonStatus::Candidate;
        incoming.address.city = Some("Hoover".to_string());
        incoming.shirt_size = "L".to_string();

        let merged = merge_person(kept, incoming);
        assert_eq!(merged.id, Uuid::from_u128(1));
        assert_eq!(merged.status, PersonStatus::Candidate);
        assert_eq!(merged.address.city.as_deref(), Some("Hoover"));
        assert_eq!(merged.shirt_size, "L");
    }

    #[test]
    fn spouse_of_merged_duplicate_is_repointed_to_canonical() {
        let mut husband = person(1, "Bob", "Lee", "1Male");
        let mut wife = person(2, "Ann", "Lee", "1Female");
        husband.spouse = Some(wife.summary());
        wife.spouse = Some(husband.summary());

        // Archived duplicate of Bob married to an archived duplicate of Ann.
        let mut old_husband = person(3, "Bob", "Lee", "9Male");
        let mut old_wife = person(4, "Ann", "Lee", "9Female");
        old_husband.spouse = Some(old_wife.summary());
        old_wife.spouse = Some(old_husband.summary());

        let outcome = deduplicate(vec![husband, wife, old_husband, old_wife]);
        assert_eq!(outcome.people.len(), 2);
        assert_eq!(outcome.merged, 2);
        assert_eq!(outcome.spouse_links_dropped, 0);

        let bob = &outcome.people[0];
        let ann = &outcome.people[1];
        assert_eq!(bob.spouse.as_ref().map(|s| s.id), Some(ann.id));
        assert_eq!(ann.spouse.as_ref().map(|s| s.id), Some(bob.id));
        assert_eq!(outcome.index.position("9Male"), Some(0));
        assert_eq!(outcome.index.position("9Female"), Some(1));
    }

    #[test]
    fn unreciprocated_spouse_link_is_dropped() {
        let mut bob = person(1, "Bob", "Lee", "1Male");
        let mut ann = person(2, "Ann", "Lee", "1Female");
        bob.spouse = Some(ann.summary());
        ann.spouse = Some(bob.summary());
        bob.status = PersonStatus::Active;
        bob.address.city = Some("Springfield".to_string());

        // Bob's duplicate claims another spouse; Bob's own link wins the merge.
        let mut dup_bob = person(3, "Bob", "Lee", "5Male");
        let mut eve = person(4, "Eve", "Lee", "5Female");
        dup_bob.spouse = Some(eve.summary());
        eve.spouse = Some(dup_bob.summary());

        let outcome = deduplicate(vec![bob, ann, dup_bob, eve]);
        assert_eq!(outcome.people.len(), 3);
        assert_eq!(outcome.spouse_links_dropped, 1);

        let eve = outcome.people.iter().find(|p| p.first_name == "Eve").unwrap();
        assert!(eve.spouse.is_none());
        let bob = &outcome.people[0];
        assert_eq!(bob.spouse.as_ref().map(|s| s.first_name.as_str()), Some("Ann"));
    }

    #[test]
    fn index_key_conflict_keeps_first_record() {
        let people = vec![
            person(1, "Ann", "Lee", "5Female"),
            person(2, "Sue", "Ray", "5Female"),
        ];
        let index = super::PersonIndex::build(&people);

        assert_eq!(index.len(), 1);
        assert_eq!(index.position("5Female"), Some(0));
        assert_eq!(index.resolve(&people, "5Female").unwrap().first_name, "Ann");
    }
}
