use rusqlite::Connection;
use std::path::Path;
use tdmigrate_core::{
    Gender, MigrationConfig, MigrationError, MigrationService, SequentialIdAllocator,
    SourceError, SqliteRecordSource,
};

const SCHEMA: &str = r#"
CREATE TABLE "Addresses" (
    "AddressID" INTEGER, "LastName" TEXT, "Male First Name" TEXT, "Female First Name" TEXT,
    "Status Male" INTEGER, "Status Female" INTEGER, "City" TEXT, "Male Cell Phone" TEXT,
    "MaleShirtSize" TEXT, "FemaleShirtSize" TEXT, "FemaleWeekend #" REAL, "Sponsor ID#" INTEGER
);
CREATE TABLE "Addresses Archive" (
    "AddressID" INTEGER, "LastName" TEXT, "Male First Name" TEXT, "Female First Name" TEXT,
    "Status Male" INTEGER, "Status Female" INTEGER, "City" TEXT, "Male Cell Phone" TEXT
);
CREATE TABLE "Table Names" ("Table Name" TEXT, "MensLadies" TEXT);
CREATE TABLE "Team Jobs" ("ID" INTEGER, "Job" TEXT);
CREATE TABLE "ExperienceMale" ("AddressID" INTEGER, "JobID" INTEGER, "BTD#" INTEGER);
CREATE TABLE "ExperienceFemale" ("AddressID" INTEGER, "JobID" INTEGER, "BTD#" INTEGER);

INSERT INTO "Addresses" VALUES
    (1, 'Smith', 'John', 'Mary', 9, 8, 'Springfield', NULL, 'Medium', NULL, NULL, NULL),
    (2, 'Jones', NULL, 'Ann', NULL, 2, NULL, NULL, NULL, 'Small', 30.0, 1);
INSERT INTO "Addresses Archive" VALUES
    (7, 'Smith', 'John', NULL, 12, NULL, NULL, '555-1111');
INSERT INTO "Table Names" VALUES ('Peter', 'Mens'), ('Ruth', 'Ladies');
INSERT INTO "Team Jobs" VALUES (1, 'Head Cha'), (2, 'Table Leader');
INSERT INTO "ExperienceMale" VALUES (7, 1, 29), (1, 2, 29);
INSERT INTO "ExperienceFemale" VALUES (1, 1, 30);
"#;

fn write_extract(path: &Path) {
    let conn = Connection::open(path).unwrap();
    conn.execute_batch(SCHEMA).unwrap();
}

#[test]
fn sqlite_extract_migrates_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("legacy.sqlite");
    write_extract(&path);

    let source = SqliteRecordSource::open(&path).unwrap();
    let service = MigrationService::new(MigrationConfig::default()).unwrap();
    let outcome = service
        .run(&source, &mut SequentialIdAllocator::new())
        .unwrap();
    let graph = &outcome.graph;

    assert_eq!(graph.people.len(), 3);
    assert_eq!(graph.tables.len(), 2);
    assert_eq!(graph.roles.len(), 3);
    assert!(graph.roles[0].is_head);

    let john = &graph.people[0];
    assert_eq!(john.first_name, "John");
    assert_eq!(john.address.city.as_deref(), Some("Springfield"));
    assert_eq!(john.phone_numbers[0].digits, "5551111");
    assert_eq!(john.shirt_size, "M");
    assert_eq!(john.experience.len(), 2);

    let ann = &graph.people[2];
    assert_eq!(ann.first_name, "Ann");
    assert_eq!(ann.sponsor.as_ref().unwrap().first_name, "Mary");
    assert_eq!(ann.shirt_size, "S");

    let female_30 = graph
        .weekends
        .iter()
        .find(|w| w.gender == Gender::Female && w.weekend_number == "30")
        .unwrap();
    let titles: Vec<_> = female_30
        .attendees
        .iter()
        .map(|a| a.resolved_link().unwrap().role_title.as_str())
        .collect();
    assert_eq!(titles, vec!["Head Cha", "Candidate"]);
    assert!(outcome.report.unresolved.is_empty());
}

#[test]
fn missing_legacy_table_fails_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("partial.sqlite");
    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(r#"CREATE TABLE "Addresses" ("AddressID" INTEGER);"#)
        .unwrap();
    drop(conn);

    let source = SqliteRecordSource::open(&path).unwrap();
    let service = MigrationService::new(MigrationConfig::default()).unwrap();
    let err = service
        .run(&source, &mut SequentialIdAllocator::new())
        .unwrap_err();
    assert!(matches!(err, MigrationError::Source(SourceError::Query { .. })));
}
