use tdmigrate_core::service::role_catalog::RoleCatalog;
use tdmigrate_core::service::weekend_roster::{build_roster, enroll_candidates, WeekendBook};
use tdmigrate_core::{
    EntityId, Gender, IdentityAllocator, Person, PersonStatus, RawRow, RawValue,
    SequentialIdAllocator,
};

fn staff_row(weekend: &str, household: i64, job: i64) -> RawRow {
    RawRow::from_pairs([
        ("BTD#", RawValue::from(weekend)),
        ("AddressID", RawValue::Integer(household)),
        ("JobID", RawValue::Integer(job)),
    ])
}

#[test]
fn staff_rows_become_pending_stubs_on_shared_weekends() {
    let mut ids = SequentialIdAllocator::new();
    let mut book = WeekendBook::new("Test Community");
    let rows = vec![
        staff_row("12", 1, 4),
        staff_row("12", 2, 5),
        staff_row("13", 1, 6),
        RawRow::from_pairs([("AddressID", RawValue::Integer(3))]),
    ];

    let summary = build_roster(&mut book, Gender::Female, &rows, &mut ids);
    assert_eq!(summary.stubs, 3);
    assert_eq!(summary.dropped, 1);
    assert_eq!(summary.weekends_created, 2);

    let stubs: Vec<_> = book
        .pending_stubs(Gender::Female)
        .map(|(weekend, link)| {
            (
                weekend.weekend_number.as_str(),
                link.migration_person_id.as_str(),
                link.migration_role_id.as_deref(),
            )
        })
        .collect();
    assert_eq!(
        stubs,
        vec![
            ("12", "1Female", Some("4")),
            ("12", "2Female", Some("5")),
            ("13", "1Female", Some("6")),
        ]
    );
    assert_eq!(book.pending_stubs(Gender::Male).count(), 0);
}

#[test]
fn candidate_joins_existing_staff_weekend_or_creates_one() {
    let mut ids = SequentialIdAllocator::new();
    let roles = RoleCatalog::build(&[], &mut ids);
    let mut book = WeekendBook::new("Test Community");
    build_roster(&mut book, Gender::Male, &[staff_row("41", 1, 1)], &mut ids);

    let mut joe = Person::new(ids.allocate(), Gender::Male, "Joe", "Day", PersonStatus::Candidate);
    joe.candidate_on = Some("41".to_string());
    let mut sam = Person::new(ids.allocate(), Gender::Male, "Sam", "Ray", PersonStatus::Candidate);
    sam.candidate_on = Some("42".to_string());
    let settled = Person::new(EntityId::from_u128(999), Gender::Male, "Al", "Fox", PersonStatus::Active);

    let enrolled = enroll_candidates(&mut book, &[joe, sam, settled], roles.candidate_role(), &mut ids);
    assert_eq!(enrolled, 2);
    assert_eq!(book.len(), 2);

    let forty_one = book.get(Gender::Male, "41").unwrap();
    assert_eq!(forty_one.attendees.len(), 2);
    let forty_two = book.get(Gender::Male, "42").unwrap();
    let link = forty_two.attendees[0].resolved_link().unwrap();
    assert_eq!(link.person.first_name, "Sam");
    assert_eq!(link.role_id, roles.candidate_role_id());
    assert_eq!(link.role_title, "Candidate");
}

#[test]
fn zero_weekend_number_is_dropped() {
    let mut ids = SequentialIdAllocator::new();
    let mut book = WeekendBook::new("Test Community");
    let rows = vec![
        RawRow::from_pairs([
            ("BTD#", RawValue::Integer(0)),
            ("AddressID", RawValue::Integer(1)),
            ("JobID", RawValue::Integer(1)),
        ]),
        staff_row("0", 2, 1),
    ];

    let summary = build_roster(&mut book, Gender::Male, &rows, &mut ids);
    assert_eq!(summary.stubs, 0);
    assert_eq!(summary.dropped, 2);
    assert!(book.is_empty());
    assert_eq!(ids.issued(), 0);
}
